//! Dense eigen solvers through cuSOLVER.

use std::{
    ffi::{c_int, c_void},
    ptr::NonNull,
    sync::Arc,
};

use gpulinalg_sys::{
    device::{
        cuda::{Context, DevicePointer, SharedStream},
        DeviceError, DevicePtr,
    },
    Vec,
};
use rcublas_sys::cublasFillMode_t;
use thiserror::Error;

use crate::{
    blas::{BLASContext, FillMode},
    cuda::CudaExecutor,
    error::{Result, Stage},
};

use super::{check_info, EigMode, SYEVD};

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct cusolverDnContext {
    _private: [u8; 0],
}

#[allow(non_camel_case_types)]
pub type cusolverDnHandle_t = *mut cusolverDnContext;

#[allow(non_camel_case_types)]
type cusolverStatus_t = c_int;

#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Clone, Copy)]
enum cusolverEigMode_t {
    CUSOLVER_EIG_MODE_NOVECTOR = 0,
    CUSOLVER_EIG_MODE_VECTOR = 1,
}

impl From<EigMode> for cusolverEigMode_t {
    fn from(jobz: EigMode) -> Self {
        match jobz {
            EigMode::NoVectors => cusolverEigMode_t::CUSOLVER_EIG_MODE_NOVECTOR,
            EigMode::Vectors => cusolverEigMode_t::CUSOLVER_EIG_MODE_VECTOR,
        }
    }
}

#[link(name = "cusolver")]
extern "C" {
    fn cusolverDnCreate(handle: *mut cusolverDnHandle_t) -> cusolverStatus_t;
    fn cusolverDnDestroy(handle: cusolverDnHandle_t) -> cusolverStatus_t;
    fn cusolverDnSetStream(handle: cusolverDnHandle_t, stream: *mut c_void) -> cusolverStatus_t;

    fn cusolverDnDsyevd_bufferSize(
        handle: cusolverDnHandle_t,
        jobz: cusolverEigMode_t,
        uplo: cublasFillMode_t,
        n: c_int,
        a: *const f64,
        lda: c_int,
        w: *const f64,
        lwork: *mut c_int,
    ) -> cusolverStatus_t;

    fn cusolverDnDsyevd(
        handle: cusolverDnHandle_t,
        jobz: cusolverEigMode_t,
        uplo: cublasFillMode_t,
        n: c_int,
        a: *mut f64,
        lda: c_int,
        w: *mut f64,
        work: *mut f64,
        lwork: c_int,
        info: *mut c_int,
    ) -> cusolverStatus_t;
}

/// An owned cuSOLVER dense handle, tied to the context it was created in
pub struct CusolverContext {
    inner: NonNull<cusolverDnContext>,
    ctx: Arc<Context>,
}

unsafe impl Send for CusolverContext {}

impl CusolverContext {
    /// Creates a new cusolver handle. `ctx` must be bound to the calling thread.
    pub fn new(ctx: Arc<Context>) -> CusolverResult<Self> {
        unsafe {
            let mut handle = std::ptr::null_mut();
            cusolverDnCreate(&mut handle).to_cusolver_result()?;

            Ok(Self {
                inner: NonNull::new(handle).ok_or(CusolverError::NotInitialized)?,
                ctx,
            })
        }
    }

    pub fn set_stream(&self, stream: &SharedStream) -> CusolverResult<()> {
        unsafe { cusolverDnSetStream(self.handle(), stream.inner().cast()).to_cusolver_result() }
    }

    pub(crate) fn handle(&self) -> cusolverDnHandle_t {
        self.inner.as_ptr()
    }
}

impl Drop for CusolverContext {
    fn drop(&mut self) {
        let result = match self.ctx.bind() {
            Ok(_bound) => unsafe { cusolverDnDestroy(self.inner.as_ptr()).to_cusolver_result() },
            Err(err) => {
                tracing::warn!(%err, "leaking cusolver handle");
                return;
            }
        };
        if let Err(err) = result {
            tracing::warn!(%err, "cusolverDnDestroy failed");
        }
    }
}

#[derive(Debug, Clone, Copy, Error)]
pub enum CusolverError {
    #[error("CUSOLVER_STATUS_NOT_INITIALIZED")]
    NotInitialized,
    #[error("CUSOLVER_STATUS_ALLOC_FAILED")]
    AllocFailed,
    #[error("CUSOLVER_STATUS_INVALID_VALUE")]
    InvalidValue,
    #[error("CUSOLVER_STATUS_ARCH_MISMATCH")]
    ArchMismatch,
    #[error("CUSOLVER_STATUS_MAPPING_ERROR")]
    MappingError,
    #[error("CUSOLVER_STATUS_EXECUTION_FAILED")]
    ExecutionFailed,
    #[error("CUSOLVER_STATUS_INTERNAL_ERROR")]
    InternalError,
    #[error("CUSOLVER_STATUS_MATRIX_TYPE_NOT_SUPPORTED")]
    MatrixTypeNotSupported,
    #[error("CUSOLVER_STATUS_NOT_SUPPORTED")]
    NotSupported,
    #[error("unexpected cusolver status {0}")]
    Unexpected(i32),
}

impl DeviceError for CusolverError {
    fn is_out_of_memory(&self) -> bool {
        matches!(self, CusolverError::AllocFailed)
    }
}

pub type CusolverResult<T, E = CusolverError> = std::result::Result<T, E>;

trait ToCusolverResult {
    fn to_cusolver_result(self) -> CusolverResult<()>;
}
impl ToCusolverResult for cusolverStatus_t {
    fn to_cusolver_result(self) -> CusolverResult<()> {
        match self {
            0 => Ok(()),
            1 => Err(CusolverError::NotInitialized),
            2 => Err(CusolverError::AllocFailed),
            3 => Err(CusolverError::InvalidValue),
            4 => Err(CusolverError::ArchMismatch),
            5 => Err(CusolverError::MappingError),
            6 => Err(CusolverError::ExecutionFailed),
            7 => Err(CusolverError::InternalError),
            8 => Err(CusolverError::MatrixTypeNotSupported),
            9 => Err(CusolverError::NotSupported),
            status => Err(CusolverError::Unexpected(status)),
        }
    }
}

macro_rules! impl_syevd {
    ($float:ident => $buffer_size:ident, $syevd:ident) => {
        impl<'a> SYEVD<&'a CudaExecutor> for $float {
            unsafe fn syevd(
                ctx: &'a CudaExecutor,
                jobz: EigMode,
                uplo: FillMode,
                n: i32,
                a: DevicePointer<$float>,
                lda: i32,
                w: DevicePointer<$float>,
            ) -> Result<()> {
                let handle = ctx.cusolver().handle();
                let a = DevicePtr::as_raw(a);
                let w = DevicePtr::as_raw(w);

                let mut lwork: c_int = 0;
                $buffer_size(handle, jobz.into(), uplo.into(), n, a, lda, w, &mut lwork)
                    .to_cusolver_result()
                    .stage(stringify!($buffer_size))?;

                let work = Vec::<$float, _>::uninit_in(lwork.max(0) as usize, ctx.allocator())
                    .stage(concat!(
                        "allocating device memory for ",
                        stringify!($syevd),
                        " workspace"
                    ))?;
                let info = Vec::<i32, _>::zeroed_in(1, ctx.allocator())
                    .stage("allocating device memory for info")?;

                $syevd(
                    handle,
                    jobz.into(),
                    uplo.into(),
                    n,
                    a,
                    lda,
                    w,
                    DevicePtr::as_raw(work.as_ptr()),
                    lwork,
                    DevicePtr::as_raw(info.as_ptr()),
                )
                .to_cusolver_result()
                .stage(stringify!($syevd))?;

                let mut host_info = [0];
                info.copy_to_host(&mut host_info)
                    .stage("copying info to host")?;
                check_info(stringify!($syevd), host_info[0])
            }
        }
    };
}

impl_syevd!(f64 => cusolverDnDsyevd_bufferSize, cusolverDnDsyevd);
