use std::alloc::Layout;

use cust::error::{CudaError, CudaResult};
use cust_raw::CUdeviceptr;

pub use cust::memory::DevicePointer;

use super::{Device, DeviceAllocator, DeviceError, DevicePtr};

mod context;
pub mod nvtx;
mod stream;

pub use context::{BoundContext, Context};
pub use stream::{SharedStream, Stream};

#[derive(Debug)]
/// Device for CUDA enabled GPUs
///
/// # Note
/// Memory is allocated through a [`SharedStream`], which binds its [`Context`]
/// to the calling thread for the duration of every driver call.
pub struct Cuda;

impl Device for Cuda {
    type Ptr<T> = DevicePointer<T>;
}

impl<T> DevicePtr<T> for DevicePointer<T> {
    fn as_raw(mut self) -> *mut T {
        self.as_raw_mut()
    }

    fn from_raw(ptr: *mut T) -> Self {
        // creating pointers shouldn't be unsafe
        // it's reading/writing to them that's unsafe
        #![allow(clippy::not_unsafe_ptr_arg_deref)]
        unsafe { Self::wrap(ptr) }
    }
}

impl DeviceError for CudaError {
    fn is_out_of_memory(&self) -> bool {
        matches!(self, CudaError::OutOfMemory)
    }
}

impl SharedStream {
    fn allocate_impl<T>(&self, len: usize, zeroed: bool) -> CudaResult<DevicePointer<T>> {
        let size = Layout::array::<T>(len)
            .map_err(|_| CudaError::OutOfMemory)?
            .size();
        if size == 0 {
            return Ok(DevicePtr::from_raw(std::ptr::NonNull::dangling().as_ptr()));
        }

        let _bound = self.context().bind()?;
        let mut ptr: CUdeviceptr = 0;
        unsafe {
            cust_raw::cuMemAllocAsync(&mut ptr, size, self.inner()).to_cuda_result()?;
            if zeroed {
                if let Err(err) =
                    cust_raw::cuMemsetD8Async(ptr, 0, size, self.inner()).to_cuda_result()
                {
                    cust_raw::cuMemFreeAsync(ptr, self.inner());
                    return Err(err);
                }
            }
        }

        tracing::trace!(size, ptr, "allocated device memory");
        Ok(DevicePtr::from_raw(ptr as *mut T))
    }
}

impl DeviceAllocator for SharedStream {
    type Device = Cuda;
    type Error = CudaError;

    fn allocate<T>(&self, len: usize) -> CudaResult<DevicePointer<T>> {
        self.allocate_impl(len, false)
    }

    fn allocate_zeroed<T>(&self, len: usize) -> CudaResult<DevicePointer<T>> {
        self.allocate_impl(len, true)
    }

    unsafe fn deallocate<T>(&self, ptr: DevicePointer<T>, len: usize) {
        if std::mem::size_of::<T>() * len == 0 {
            return;
        }

        let result = self
            .context()
            .bind()
            .and_then(|_bound| cust_raw::cuMemFreeAsync(d_ptr(ptr), self.inner()).to_cuda_result());
        if let Err(err) = result {
            tracing::warn!(%err, "failed to free device memory");
        }
    }

    unsafe fn copy_from_host<T: Copy>(&self, from: &[T], to: DevicePointer<T>) -> CudaResult<()> {
        let size = std::mem::size_of_val(from);
        if size == 0 {
            return Ok(());
        }

        let _bound = self.context().bind()?;
        cust_raw::cuMemcpyHtoDAsync_v2(d_ptr(to), from.as_ptr().cast(), size, self.inner())
            .to_cuda_result()
    }

    unsafe fn copy_to_host<T: Copy>(&self, from: DevicePointer<T>, to: &mut [T]) -> CudaResult<()> {
        let size = std::mem::size_of_val(to);
        if size == 0 {
            return Ok(());
        }

        let _bound = self.context().bind()?;
        cust_raw::cuMemcpyDtoHAsync_v2(to.as_mut_ptr().cast(), d_ptr(from), size, self.inner())
            .to_cuda_result()?;
        // the host buffer is only readable once the stream has drained
        cust_raw::cuStreamSynchronize(self.inner()).to_cuda_result()
    }
}

fn d_ptr<T>(ptr: DevicePointer<T>) -> CUdeviceptr {
    DevicePtr::as_raw(ptr) as CUdeviceptr
}

pub trait ToCudaResult {
    fn to_cuda_result(self) -> CudaResult<()>;
}
impl ToCudaResult for cust_raw::cudaError_enum {
    fn to_cuda_result(self) -> CudaResult<()> {
        use cust_raw::cudaError_enum;
        match self {
            cudaError_enum::CUDA_SUCCESS => Ok(()),
            cudaError_enum::CUDA_ERROR_INVALID_VALUE => Err(CudaError::InvalidValue),
            cudaError_enum::CUDA_ERROR_OUT_OF_MEMORY => Err(CudaError::OutOfMemory),
            cudaError_enum::CUDA_ERROR_NOT_INITIALIZED => Err(CudaError::NotInitialized),
            cudaError_enum::CUDA_ERROR_DEINITIALIZED => Err(CudaError::Deinitialized),
            cudaError_enum::CUDA_ERROR_NO_DEVICE => Err(CudaError::NoDevice),
            cudaError_enum::CUDA_ERROR_INVALID_DEVICE => Err(CudaError::InvalidDevice),
            cudaError_enum::CUDA_ERROR_INVALID_CONTEXT => Err(CudaError::InvalidContext),
            cudaError_enum::CUDA_ERROR_CONTEXT_IS_DESTROYED => Err(CudaError::ContextIsDestroyed),
            cudaError_enum::CUDA_ERROR_INVALID_HANDLE => Err(CudaError::InvalidHandle),
            cudaError_enum::CUDA_ERROR_NOT_READY => Err(CudaError::NotReady),
            cudaError_enum::CUDA_ERROR_ILLEGAL_ADDRESS => Err(CudaError::IllegalAddress),
            cudaError_enum::CUDA_ERROR_LAUNCH_OUT_OF_RESOURCES => {
                Err(CudaError::LaunchOutOfResources)
            }
            cudaError_enum::CUDA_ERROR_LAUNCH_FAILED => Err(CudaError::LaunchFailed),
            cudaError_enum::CUDA_ERROR_NOT_PERMITTED => Err(CudaError::NotPermitted),
            cudaError_enum::CUDA_ERROR_NOT_SUPPORTED => Err(CudaError::NotSupported),
            _ => Err(CudaError::UnknownError),
        }
    }
}
