use std::sync::Arc;

use gpulinalg_sys::device::cuda::{Context, SharedStream, Stream};

use crate::{
    blas::{cublas::CublasContext, BLASContext},
    error::{Result, Stage},
    solver::cusolver::CusolverContext,
};

/// Everything needed to run work on one CUDA device.
///
/// All copies and library calls made through an executor are issued on its stream.
/// The context is only current on a thread while [`CudaExecutor::run`] is executing.
pub struct CudaExecutor {
    // handles are destroyed before the stream they were bound to
    cusolver: CusolverContext,
    cublas: CublasContext,
    stream: SharedStream,
}

impl CudaExecutor {
    pub fn new(ordinal: u32) -> Result<Self> {
        let ctx = Arc::new(
            Context::new(ordinal)
                .with_stage(|| format!("creating cuda context for device {ordinal}"))?,
        );
        let stream = Stream::new(ctx.clone())
            .stage("creating cuda stream")?
            .share();

        let _bound = ctx.bind().stage("binding cuda context")?;

        let cublas = CublasContext::new(ctx.clone()).stage("cublasCreate_v2")?;
        cublas.set_stream(&stream).stage("cublasSetStream_v2")?;

        let cusolver = CusolverContext::new(ctx.clone()).stage("cusolverDnCreate")?;
        cusolver.set_stream(&stream).stage("cusolverDnSetStream")?;

        tracing::debug!(ordinal, "created cuda executor");
        Ok(Self {
            cusolver,
            cublas,
            stream,
        })
    }

    pub fn stream(&self) -> &SharedStream {
        &self.stream
    }

    pub fn cublas(&self) -> &CublasContext {
        &self.cublas
    }

    pub fn cusolver(&self) -> &CusolverContext {
        &self.cusolver
    }

    /// Runs `f` with this executor's context bound to the calling thread
    pub fn run<R>(&self, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let _bound = self
            .stream
            .context()
            .bind()
            .stage("binding cuda context")?;
        f(self)
    }
}

impl<'a> BLASContext for &'a CudaExecutor {
    type Alloc = SharedStream;

    fn allocator(self) -> SharedStream {
        self.stream.clone()
    }
}
