use crate::{
    blas::{BLASContext, ContextPtr, FillMode},
    error::{Error, Result},
};

pub mod cpu;

#[cfg(feature = "cuda")]
pub mod cusolver;

/// Whether an eigen solver computes eigenvectors as well as eigenvalues
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EigMode {
    NoVectors = 0,
    Vectors = 1,
}

/// Symmetric eigendecomposition
pub trait SYEVD<C: BLASContext>: Sized + Copy {
    /// Computes the eigenvalues of the symmetric `n x n` matrix `a` into `w`, in ascending order.
    /// Only the `uplo` triangle of `a` is read.
    ///
    /// With [`EigMode::Vectors`], `a` is overwritten with the orthonormal eigenvectors,
    /// column `j` belonging to `w[j]`.
    ///
    /// # Safety
    /// `a` must hold `lda * n` values and `w` must hold `n`.
    unsafe fn syevd(
        ctx: C,
        jobz: EigMode,
        uplo: FillMode,
        n: i32,
        a: ContextPtr<Self, C>,
        lda: i32,
        w: ContextPtr<Self, C>,
    ) -> Result<()>;
}

/// Converts a LAPACK style `info` result into an error
pub(crate) fn check_info(routine: &str, info: i32) -> Result<()> {
    match info {
        0 => Ok(()),
        i if i < 0 => Err(Error::Runtime(format!(
            "{routine} failed: parameter {} had an illegal value",
            -i
        ))),
        i => Err(Error::Runtime(format!(
            "{routine} failed: {i} off-diagonal elements did not converge"
        ))),
    }
}
