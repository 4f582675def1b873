use std::sync::Arc;

use cust::error::CudaResult;
use cust_raw::CUstream;

use super::{Context, ToCudaResult};

/// An execution stream on a [`Context`]
pub struct Stream {
    inner: CUstream,
    ctx: Arc<Context>,
}

unsafe impl Send for Stream {}
unsafe impl Sync for Stream {}

impl Stream {
    pub fn new(ctx: Arc<Context>) -> CudaResult<Self> {
        let mut stream = std::ptr::null_mut();

        {
            let _bound = ctx.bind()?;
            unsafe { cust_raw::cuStreamCreateWithPriority(&mut stream, 0, 0).to_cuda_result()? }
        }

        Ok(Self { inner: stream, ctx })
    }

    pub fn share(self) -> SharedStream {
        SharedStream {
            inner: Arc::new(self),
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if self.inner.is_null() {
            return;
        }

        let inner = std::mem::replace(&mut self.inner, std::ptr::null_mut());
        match self.ctx.bind() {
            Ok(_bound) => unsafe {
                cust_raw::cuStreamDestroy_v2(inner);
            },
            Err(err) => tracing::warn!(%err, "leaking cuda stream"),
        }
    }
}

/// A reference counted [`Stream`]. This is the allocator for [`super::Cuda`] memory,
/// every buffer keeps its stream (and so its context) alive.
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<Stream>,
}

impl SharedStream {
    pub fn inner(&self) -> CUstream {
        self.inner.inner
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.inner.ctx
    }
}
