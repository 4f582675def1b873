use std::alloc::{GlobalAlloc, Layout, System};

use thiserror::Error;

use super::{Device, DeviceAllocator, DeviceError, DevicePtr};

/// The host. Buffers live in regular process memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cpu;

impl Device for Cpu {
    type Ptr<T> = *mut T;
}

impl<T> DevicePtr<T> for *mut T {
    fn as_raw(self) -> *mut T {
        self
    }

    fn from_raw(ptr: *mut T) -> Self {
        ptr
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("out of memory allocating {size} bytes")]
    OutOfMemory { size: usize },
    #[error("allocation of {len} elements overflows the address space")]
    CapacityOverflow { len: usize },
}

impl DeviceError for HostError {
    fn is_out_of_memory(&self) -> bool {
        // both mean the request can't be served
        true
    }
}

fn allocate_impl<T>(len: usize, zeroed: bool) -> Result<*mut T, HostError> {
    let layout = Layout::array::<T>(len).map_err(|_| HostError::CapacityOverflow { len })?;
    if layout.size() == 0 {
        return Ok(std::ptr::NonNull::<T>::dangling().as_ptr());
    }

    // Safety:
    // layout has a non-zero size
    let ptr = unsafe {
        if zeroed {
            System.alloc_zeroed(layout)
        } else {
            System.alloc(layout)
        }
    };

    if ptr.is_null() {
        Err(HostError::OutOfMemory {
            size: layout.size(),
        })
    } else {
        Ok(ptr.cast())
    }
}

impl DeviceAllocator for System {
    type Device = Cpu;
    type Error = HostError;

    fn allocate<T>(&self, len: usize) -> Result<*mut T, HostError> {
        allocate_impl(len, false)
    }

    fn allocate_zeroed<T>(&self, len: usize) -> Result<*mut T, HostError> {
        allocate_impl(len, true)
    }

    unsafe fn deallocate<T>(&self, ptr: *mut T, len: usize) {
        // a layout that failed here could never have been allocated
        if let Ok(layout) = Layout::array::<T>(len) {
            if layout.size() != 0 {
                self.dealloc(ptr.cast(), layout);
            }
        }
    }

    unsafe fn copy_from_host<T: Copy>(&self, from: &[T], to: *mut T) -> Result<(), HostError> {
        std::ptr::copy_nonoverlapping(from.as_ptr(), to, from.len());
        Ok(())
    }

    unsafe fn copy_to_host<T: Copy>(&self, from: *mut T, to: &mut [T]) -> Result<(), HostError> {
        std::ptr::copy_nonoverlapping(from, to.as_mut_ptr(), to.len());
        Ok(())
    }
}
