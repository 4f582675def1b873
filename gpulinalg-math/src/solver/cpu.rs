use std::cmp::Ordering;

use nalgebra::{DMatrix, RealField, SymmetricEigen};

use crate::{
    blas::{cpu::CpuContext, FillMode},
    error::{Error, Result},
};

use super::{EigMode, SYEVD};

const MAX_ITERATIONS: usize = 10_000;

impl<T: RealField + Copy> SYEVD<CpuContext> for T {
    unsafe fn syevd(
        _ctx: CpuContext,
        jobz: EigMode,
        uplo: FillMode,
        n: i32,
        a: *mut T,
        lda: i32,
        w: *mut T,
    ) -> Result<()> {
        let n = n.max(0) as usize;
        let lda = lda as usize;
        if n == 0 {
            return Ok(());
        }

        let at = |i: usize, j: usize| *a.add(i + j * lda);
        let full = DMatrix::from_fn(n, n, |i, j| {
            let stored = match uplo {
                FillMode::Upper => i <= j,
                FillMode::Lower => i >= j,
            };
            if stored {
                at(i, j)
            } else {
                at(j, i)
            }
        });

        let eig = SymmetricEigen::try_new(full, nalgebra::convert(f64::EPSILON), MAX_ITERATIONS)
            .ok_or_else(|| {
                Error::Runtime(format!(
                    "syevd failed: eigenvalues of the {n} x {n} matrix did not converge"
                ))
            })?;

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&x, &y| {
            eig.eigenvalues[x]
                .partial_cmp(&eig.eigenvalues[y])
                .unwrap_or(Ordering::Equal)
        });

        for (j, &src) in order.iter().enumerate() {
            *w.add(j) = eig.eigenvalues[src];
            if jobz == EigMode::Vectors {
                for i in 0..n {
                    *a.add(i + j * lda) = eig.eigenvectors[(i, src)];
                }
            }
        }
        Ok(())
    }
}
