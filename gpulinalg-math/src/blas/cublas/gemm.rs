use gpulinalg_sys::device::{cuda::DevicePointer, DevicePtr};
use rcublas_sys::{cublasDgemm_v2, cublasOperation_t};

use crate::{
    blas::{MatrixOp, GEMM},
    cuda::CudaExecutor,
    error::{Result, Stage},
};

use super::ToCublasResult;

impl From<MatrixOp> for cublasOperation_t {
    fn from(op: MatrixOp) -> Self {
        // conjugation is a no-op on real data
        if op.is_transposed() {
            cublasOperation_t::CUBLAS_OP_T
        } else {
            cublasOperation_t::CUBLAS_OP_N
        }
    }
}

macro_rules! impl_gemm {
    ($float:ident => $gemm:ident) => {
        impl<'a> GEMM<&'a CudaExecutor> for $float {
            unsafe fn gemm(
                ctx: &'a CudaExecutor,
                transa: MatrixOp,
                transb: MatrixOp,
                m: i32,
                n: i32,
                k: i32,
                alpha: $float,
                a: DevicePointer<$float>,
                lda: i32,
                b: DevicePointer<$float>,
                ldb: i32,
                beta: $float,
                c: DevicePointer<$float>,
                ldc: i32,
            ) -> Result<()> {
                $gemm(
                    ctx.cublas().handle(),
                    transa.into(),
                    transb.into(),
                    m,
                    n,
                    k,
                    &alpha,
                    DevicePtr::as_raw(a),
                    lda,
                    DevicePtr::as_raw(b),
                    ldb,
                    &beta,
                    DevicePtr::as_raw(c),
                    ldc,
                )
                .to_cublas_result()
                .stage(stringify!($gemm))
            }
        }
    };
}

impl_gemm!(f64 => cublasDgemm_v2);
