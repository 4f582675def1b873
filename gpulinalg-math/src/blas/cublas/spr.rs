use gpulinalg_sys::device::{cuda::DevicePointer, DevicePtr};
use rcublas_sys::{cublasDspr_v2, cublasFillMode_t};

use crate::{
    blas::{FillMode, SPR},
    cuda::CudaExecutor,
    error::{Result, Stage},
};

use super::ToCublasResult;

impl From<FillMode> for cublasFillMode_t {
    fn from(uplo: FillMode) -> Self {
        match uplo {
            FillMode::Lower => cublasFillMode_t::CUBLAS_FILL_MODE_LOWER,
            FillMode::Upper => cublasFillMode_t::CUBLAS_FILL_MODE_UPPER,
        }
    }
}

macro_rules! impl_spr {
    ($float:ident => $spr:ident) => {
        impl<'a> SPR<&'a CudaExecutor> for $float {
            unsafe fn spr(
                ctx: &'a CudaExecutor,
                uplo: FillMode,
                n: i32,
                alpha: $float,
                x: DevicePointer<$float>,
                incx: i32,
                ap: DevicePointer<$float>,
            ) -> Result<()> {
                $spr(
                    ctx.cublas().handle(),
                    uplo.into(),
                    n,
                    &alpha,
                    DevicePtr::as_raw(x),
                    incx,
                    DevicePtr::as_raw(ap),
                )
                .to_cublas_result()
                .stage(stringify!($spr))
            }
        }
    };
}

impl_spr!(f64 => cublasDspr_v2);
