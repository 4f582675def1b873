use matrixmultiply::dgemm;

use crate::{
    blas::{MatrixOp, GEMM},
    error::Result,
};

use super::CpuContext;

/// Row and column strides of a stored column major operand, as read by `op`
fn strides(op: MatrixOp, ld: i32) -> [isize; 2] {
    let mut s = [1, ld as isize];
    if op.is_transposed() {
        s.rotate_left(1);
    }
    s
}

macro_rules! impl_gemm {
    ($float:ident => $gemm:path) => {
        impl GEMM<CpuContext> for $float {
            unsafe fn gemm(
                _ctx: CpuContext,
                transa: MatrixOp,
                transb: MatrixOp,
                m: i32,
                n: i32,
                k: i32,
                alpha: $float,
                a: *mut $float,
                lda: i32,
                b: *mut $float,
                ldb: i32,
                beta: $float,
                c: *mut $float,
                ldc: i32,
            ) -> Result<()> {
                let sa = strides(transa, lda);
                let sb = strides(transb, ldb);
                let sc = strides(MatrixOp::NoTrans, ldc);

                $gemm(
                    m as usize, k as usize, n as usize, alpha, a, sa[0], sa[1], b, sb[0], sb[1],
                    beta, c, sc[0], sc[1],
                );
                Ok(())
            }
        }
    };
}

impl_gemm!(f64 => dgemm);

#[cfg(test)]
mod tests {
    use crate::blas::{cpu::CpuContext, MatrixOp, GEMM};

    fn gemm(transa: MatrixOp, transb: MatrixOp, a: &mut [f64], b: &mut [f64]) -> [f64; 4] {
        let mut c = [0.0; 4];
        unsafe {
            f64::gemm(
                CpuContext,
                transa,
                transb,
                2,
                2,
                2,
                1.0,
                a.as_mut_ptr(),
                2,
                b.as_mut_ptr(),
                2,
                0.0,
                c.as_mut_ptr(),
                2,
            )
            .unwrap();
        }
        c
    }

    #[test]
    fn matmul() {
        //     0 1
        // A = 2 3
        //     4 5

        // B = 0 1
        //     2 3

        // column major (read each column first)
        let mut a = [0., 2., 4., 1., 3., 5.];
        let mut b = [0., 2., 1., 3.];
        let mut c = [0.0; 6];

        //           2  3
        // C = AB =  6 11
        //          10 19
        unsafe {
            f64::gemm(
                CpuContext,
                MatrixOp::NoTrans,
                MatrixOp::NoTrans,
                3,
                2,
                2,
                1.0,
                a.as_mut_ptr(),
                3,
                b.as_mut_ptr(),
                2,
                0.0,
                c.as_mut_ptr(),
                3,
            )
            .unwrap();
        }
        assert_eq!(c, [2., 6., 10., 3., 11., 19.]);
    }

    #[test]
    fn matmul_t() {
        // A = 1 3
        //     2 4

        // B = 5 7
        //     6 8

        let mut a = [1., 2., 3., 4.];
        let mut b = [5., 6., 7., 8.];

        // A^B^ = 19 22
        //        43 50
        let c = gemm(MatrixOp::Trans, MatrixOp::Trans, &mut a, &mut b);
        assert_eq!(c, [19.0, 43.0, 22.0, 50.0]);

        // AB^ = 26 30
        //       38 44
        let c = gemm(MatrixOp::NoTrans, MatrixOp::Trans, &mut a, &mut b);
        assert_eq!(c, [26.0, 38.0, 30.0, 44.0]);

        // A^B = 17 23
        //       39 53
        let c = gemm(MatrixOp::Trans, MatrixOp::NoTrans, &mut a, &mut b);
        assert_eq!(c, [17.0, 39.0, 23.0, 53.0]);
    }

    #[test]
    fn conjugation_is_identity_on_reals() {
        let mut a = [1., 2., 3., 4.];
        let mut b = [5., 6., 7., 8.];

        assert_eq!(
            gemm(MatrixOp::ConjTrans, MatrixOp::Conj, &mut a, &mut b),
            gemm(MatrixOp::Trans, MatrixOp::NoTrans, &mut a, &mut b),
        );
    }
}
