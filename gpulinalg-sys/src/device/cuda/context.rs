use std::marker::PhantomData;

use cust::error::CudaResult;
use cust_raw::CUcontext;

use super::ToCudaResult;

/// A CUDA context bound to one device ordinal.
///
/// The context is not left current on any thread. Use [`Context::bind`] around
/// driver calls instead, so that work for different devices issued from the
/// same thread never leaks through a shared "current device".
pub struct Context {
    inner: CUcontext,
}

// driver handles may be used from any thread once bound
unsafe impl Send for Context {}
unsafe impl Sync for Context {}

impl Context {
    /// Initialises the CUDA driver API and creates a context for the given device.
    pub fn new(ordinal: u32) -> CudaResult<Self> {
        use cust::context::ContextFlags;

        cust::init(cust::CudaFlags::empty())?;
        let device = cust::device::Device::get_device(ordinal)?;

        let flags = ContextFlags::MAP_HOST | ContextFlags::SCHED_AUTO;

        unsafe {
            let mut ctx: CUcontext = std::ptr::null_mut();
            cust_raw::cuCtxCreate_v2(&mut ctx as *mut CUcontext, flags.bits(), device.as_raw())
                .to_cuda_result()?;

            // creation leaves the new context current, undo that
            let mut popped: CUcontext = std::ptr::null_mut();
            cust_raw::cuCtxPopCurrent_v2(&mut popped).to_cuda_result()?;

            tracing::debug!(ordinal, "created cuda context");
            Ok(Self { inner: ctx })
        }
    }

    /// Makes this context current on the calling thread until the guard is dropped.
    pub fn bind(&self) -> CudaResult<BoundContext<'_>> {
        unsafe { cust_raw::cuCtxPushCurrent_v2(self.inner).to_cuda_result()? };
        Ok(BoundContext {
            _marker: PhantomData,
        })
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }

        unsafe {
            let inner = std::mem::replace(&mut self.inner, std::ptr::null_mut());
            cust_raw::cuCtxDestroy_v2(inner);
        }
    }
}

/// Guard returned by [`Context::bind`]. Pops the context when dropped.
pub struct BoundContext<'a> {
    // the binding is per thread
    _marker: PhantomData<(&'a Context, *const ())>,
}

impl Drop for BoundContext<'_> {
    fn drop(&mut self) {
        unsafe {
            let mut popped: CUcontext = std::ptr::null_mut();
            cust_raw::cuCtxPopCurrent_v2(&mut popped);
        }
    }
}
