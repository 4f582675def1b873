use num_traits::Float;

use crate::{
    blas::{FillMode, SPR},
    error::Result,
};

use super::CpuContext;

impl<T: Float> SPR<CpuContext> for T {
    unsafe fn spr(
        _ctx: CpuContext,
        uplo: FillMode,
        n: i32,
        alpha: T,
        x: *mut T,
        incx: i32,
        ap: *mut T,
    ) -> Result<()> {
        let n = n.max(0) as usize;
        let x = |i: usize| *x.add(i * incx as usize);

        for j in 0..n {
            let xj = alpha * x(j);
            match uplo {
                FillMode::Upper => {
                    let col = ap.add(j * (j + 1) / 2);
                    for i in 0..=j {
                        let v = col.add(i);
                        *v = *v + x(i) * xj;
                    }
                }
                FillMode::Lower => {
                    let col = ap.add(j * (2 * n - j - 1) / 2);
                    for i in j..n {
                        let v = col.add(i);
                        *v = *v + x(i) * xj;
                    }
                }
            }
        }
        Ok(())
    }
}
