use std::{ptr::NonNull, sync::Arc};

use gpulinalg_sys::device::{
    cuda::{Context, SharedStream},
    DeviceError,
};
use rcublas_sys::{
    cublasContext, cublasCreate_v2, cublasDestroy_v2, cublasHandle_t, cublasSetStream_v2,
    cublasStatus_t,
};
use thiserror::Error;

mod gemm;
mod spr;

/// An owned cuBLAS handle.
///
/// The handle belongs to the device of the context that was bound when it was created,
/// and keeps that context alive.
pub struct CublasContext {
    inner: NonNull<cublasContext>,
    ctx: Arc<Context>,
}

unsafe impl Send for CublasContext {}

impl CublasContext {
    /// Creates a new cublas handle. `ctx` must be bound to the calling thread.
    pub fn new(ctx: Arc<Context>) -> CublasResult<Self> {
        unsafe {
            let mut handle = std::ptr::null_mut();
            cublasCreate_v2(&mut handle).to_cublas_result()?;

            Ok(Self {
                inner: NonNull::new(handle).ok_or(CublasError::NotInitialized)?,
                ctx,
            })
        }
    }

    /// Sets the stream every subsequent routine is issued on.
    pub fn set_stream(&self, stream: &SharedStream) -> CublasResult<()> {
        unsafe { cublasSetStream_v2(self.handle(), stream.inner().cast()).to_cublas_result() }
    }

    pub(crate) fn handle(&self) -> cublasHandle_t {
        self.inner.as_ptr()
    }
}

impl Drop for CublasContext {
    fn drop(&mut self) {
        let result = match self.ctx.bind() {
            Ok(_bound) => unsafe { cublasDestroy_v2(self.inner.as_ptr()).to_cublas_result() },
            Err(err) => {
                tracing::warn!(%err, "leaking cublas handle");
                return;
            }
        };
        if let Err(err) = result {
            tracing::warn!(%err, "cublasDestroy_v2 failed");
        }
    }
}

#[derive(Debug, Clone, Copy, Error)]
pub enum CublasError {
    #[error("CUBLAS_STATUS_NOT_INITIALIZED")]
    NotInitialized,
    #[error("CUBLAS_STATUS_ALLOC_FAILED")]
    AllocFailed,
    #[error("CUBLAS_STATUS_INVALID_VALUE")]
    InvalidValue,
    #[error("CUBLAS_STATUS_ARCH_MISMATCH")]
    ArchMismatch,
    #[error("CUBLAS_STATUS_MAPPING_ERROR")]
    MappingError,
    #[error("CUBLAS_STATUS_EXECUTION_FAILED")]
    ExecutionFailed,
    #[error("CUBLAS_STATUS_INTERNAL_ERROR")]
    InternalError,
    #[error("CUBLAS_STATUS_NOT_SUPPORTED")]
    NotSupported,
    #[error("CUBLAS_STATUS_LICENSE_ERROR")]
    LicenseError,
    #[error("unexpected cublas status")]
    UnexpectedError,
}

impl DeviceError for CublasError {
    fn is_out_of_memory(&self) -> bool {
        matches!(self, CublasError::AllocFailed)
    }
}

pub type CublasResult<T, E = CublasError> = Result<T, E>;

pub(crate) trait ToCublasResult {
    fn to_cublas_result(self) -> CublasResult<()>;
}
impl ToCublasResult for cublasStatus_t {
    fn to_cublas_result(self) -> CublasResult<()> {
        #[allow(clippy::enum_glob_use)]
        use cublasStatus_t::*;
        match self {
            CUBLAS_STATUS_SUCCESS => Ok(()),
            CUBLAS_STATUS_NOT_INITIALIZED => Err(CublasError::NotInitialized),
            CUBLAS_STATUS_ALLOC_FAILED => Err(CublasError::AllocFailed),
            CUBLAS_STATUS_INVALID_VALUE => Err(CublasError::InvalidValue),
            CUBLAS_STATUS_ARCH_MISMATCH => Err(CublasError::ArchMismatch),
            CUBLAS_STATUS_MAPPING_ERROR => Err(CublasError::MappingError),
            CUBLAS_STATUS_EXECUTION_FAILED => Err(CublasError::ExecutionFailed),
            CUBLAS_STATUS_INTERNAL_ERROR => Err(CublasError::InternalError),
            CUBLAS_STATUS_NOT_SUPPORTED => Err(CublasError::NotSupported),
            CUBLAS_STATUS_LICENSE_ERROR => Err(CublasError::LicenseError),
            _ => Err(CublasError::UnexpectedError),
        }
    }
}
