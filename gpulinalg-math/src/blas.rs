use gpulinalg_sys::device::{AllocPtr, DeviceAllocator};

use crate::error::{Error, Result};

pub mod cpu;

#[cfg(feature = "cuda")]
pub mod cublas;

/// How an operand is read by a BLAS routine.
///
/// The discriminants are the values callers pass across the C boundary.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixOp {
    NoTrans = 0,
    Trans = 1,
    ConjTrans = 2,
    Conj = 3,
}

impl MatrixOp {
    /// Whether the stored matrix is read transposed.
    /// Conjugation is the identity on real data.
    pub const fn is_transposed(self) -> bool {
        matches!(self, MatrixOp::Trans | MatrixOp::ConjTrans)
    }
}

impl TryFrom<i32> for MatrixOp {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(MatrixOp::NoTrans),
            1 => Ok(MatrixOp::Trans),
            2 => Ok(MatrixOp::ConjTrans),
            3 => Ok(MatrixOp::Conj),
            _ => Err(Error::InvalidConfiguration(format!(
                "unsupported matrix operation {value}, \
                 expected one of 0 (N), 1 (T), 2 (C), 3 (conjugate)"
            ))),
        }
    }
}

/// Which triangle of a symmetric matrix is stored
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillMode {
    Lower = 0,
    Upper = 1,
}

/// A context needed for running BLAS operations.
/// Every buffer a routine touches is allocated through [`BLASContext::allocator`].
pub trait BLASContext: Copy {
    type Alloc: DeviceAllocator;

    fn allocator(self) -> Self::Alloc;
}

/// Pointer to memory usable by a [`BLASContext`]
pub type ContextPtr<T, C> = AllocPtr<T, <C as BLASContext>::Alloc>;

/// A type that can be matrix multiplied
pub trait GEMM<C: BLASContext>: Sized + Copy {
    #[allow(clippy::too_many_arguments)]
    /// Column major `c = alpha * op(a) * op(b) + beta * c`
    ///
    /// # Safety
    /// This is often a call across an FFI barrier, so the links or devices need to be
    /// running and may perform UB unchecked by rust.
    /// The buffers must hold the footprints implied by the dimensions and leading dimensions.
    unsafe fn gemm(
        ctx: C,
        transa: MatrixOp,
        transb: MatrixOp,
        m: i32,
        n: i32,
        k: i32,
        alpha: Self,
        a: ContextPtr<Self, C>,
        lda: i32,
        b: ContextPtr<Self, C>,
        ldb: i32,
        beta: Self,
        c: ContextPtr<Self, C>,
        ldc: i32,
    ) -> Result<()>;
}

/// Symmetric packed rank-1 update
pub trait SPR<C: BLASContext>: Sized + Copy {
    /// `ap = ap + alpha * x * x^T` where `ap` holds the `uplo` triangle of an
    /// `n x n` matrix packed column by column.
    ///
    /// # Safety
    /// `x` must hold `1 + (n - 1) * incx` values and `ap` must hold `n * (n + 1) / 2`.
    unsafe fn spr(
        ctx: C,
        uplo: FillMode,
        n: i32,
        alpha: Self,
        x: ContextPtr<Self, C>,
        incx: i32,
        ap: ContextPtr<Self, C>,
    ) -> Result<()>;
}
