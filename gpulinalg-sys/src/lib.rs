/// Devices, device pointers and allocators
pub mod device;

/// Owned buffers allocated on a device
pub mod vec;

mod zero;

pub use vec::{DefaultVec, Vec};
pub use zero::Zero;
