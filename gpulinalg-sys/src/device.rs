pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;

/// A memory space that buffers can be allocated in.
pub trait Device {
    type Ptr<T>: DevicePtr<T>;
}

pub trait DevicePtr<T>: Copy {
    fn as_raw(self) -> *mut T;
    fn from_raw(ptr: *mut T) -> Self;
}

/// An error reported by a device or a library running on it
pub trait DeviceError: std::error::Error + Send + Sync + 'static {
    /// Whether the failure was caused by running out of memory
    fn is_out_of_memory(&self) -> bool;
}

/// The pointer type handed out by an allocator
pub type AllocPtr<T, A> = <<A as DeviceAllocator>::Device as Device>::Ptr<T>;

/// Allocates memory on a [`Device`] and moves data between it and the host.
///
/// Allocators for asynchronous devices are bound to a single execution stream.
/// All copies and frees issued through the allocator are ordered on that stream.
pub trait DeviceAllocator: Clone {
    #![allow(clippy::missing_safety_doc)]

    type Device: Device;
    type Error: DeviceError;

    /// Allocates space for `len` values of `T`. The contents are uninitialised.
    fn allocate<T>(&self, len: usize) -> Result<AllocPtr<T, Self>, Self::Error>;

    /// Allocates space for `len` values of `T`, with every byte set to zero.
    fn allocate_zeroed<T>(&self, len: usize) -> Result<AllocPtr<T, Self>, Self::Error>;

    /// `ptr` must have been returned by this allocator for the same `len`.
    unsafe fn deallocate<T>(&self, ptr: AllocPtr<T, Self>, len: usize);

    /// `to` must be valid for `from.len()` writes.
    unsafe fn copy_from_host<T: Copy>(
        &self,
        from: &[T],
        to: AllocPtr<T, Self>,
    ) -> Result<(), Self::Error>;

    /// `from` must be valid for `to.len()` reads.
    ///
    /// Returns once the data has landed in `to`.
    unsafe fn copy_to_host<T: Copy>(
        &self,
        from: AllocPtr<T, Self>,
        to: &mut [T],
    ) -> Result<(), Self::Error>;
}
