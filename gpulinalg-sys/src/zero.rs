/// This trait signifies that `[0; size_of::<T>]` is transmutable
/// to a valid `T` safely, and that `T` fits some concept of 'zero'.
///
/// # Safety
/// The set of zero bytes the size of Self should be a valid value
pub unsafe trait Zero: Copy {}

// f64 for the numeric payloads, i32 for list offsets
unsafe impl Zero for f64 {}
unsafe impl Zero for i32 {}
