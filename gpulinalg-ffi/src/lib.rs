//! C ABI for gpulinalg.
//!
//! Every fallible function returns a [`Status`] as an `i32`. On failure the message is
//! available from [`gpulinalg_last_error`] until the next failing call on the same thread.
//! Host buffers are borrowed for the duration of a call and output buffers are only
//! written when the call succeeds.

use std::ffi::{c_char, CStr};

use gpulinalg_math::{blas::MatrixOp, linalg, trace, Error, Result};

mod backend;
mod column;
mod error;

use backend::with_executor;
pub use column::{
    gpulinalg_list_column_free, gpulinalg_list_column_from_host, gpulinalg_list_column_sizes,
    gpulinalg_list_column_to_host, ListColumnHandle,
};
use column::write_handle;
use error::guard;
pub use error::{gpulinalg_last_error, Status};

/// Device used by entry points that do not take one
const DEFAULT_DEVICE: i32 = 0;

/// # Safety
/// `ptr` must be valid for `len` reads
unsafe fn slice<'a, T>(name: &str, ptr: *const T, len: usize) -> Result<&'a [T]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(Error::IllegalArgument(format!("{name} is null")));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

/// # Safety
/// `ptr` must be valid for `len` writes
unsafe fn slice_mut<'a, T>(name: &str, ptr: *mut T, len: usize) -> Result<&'a mut [T]> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(Error::IllegalArgument(format!("{name} is null")));
    }
    Ok(std::slice::from_raw_parts_mut(ptr, len))
}

fn dim(name: &str, value: i32) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::IllegalArgument(format!("{name} must not be negative, got {value}")))
}

/// `a = a + x * x^T` on the packed upper triangle of an `n x n` symmetric matrix.
///
/// # Safety
/// `x` and `a` must be valid for `x_len` reads and `a_len` reads and writes.
#[no_mangle]
pub unsafe extern "C" fn gpulinalg_dspr(
    n: i32,
    x: *const f64,
    x_len: usize,
    a: *mut f64,
    a_len: usize,
) -> i32 {
    guard("dspr", || {
        let n = dim("n", n)?;
        let x = slice("x", x, x_len)?;
        let a = slice_mut("a", a, a_len)?;
        with_executor(DEFAULT_DEVICE, |ctx| linalg::spr(ctx, n, x, a))
    })
}

/// Column major `c = alpha * op(a) * op(b) + beta * c` on `device`.
///
/// `transa` and `transb` are 0 (no transpose), 1 (transpose), 2 (conjugate transpose)
/// or 3 (conjugate).
///
/// # Safety
/// Every buffer must be valid for its stated length. `c` is written.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn gpulinalg_dgemm(
    transa: i32,
    transb: i32,
    m: i32,
    n: i32,
    k: i32,
    alpha: f64,
    a: *const f64,
    a_len: usize,
    lda: i32,
    b: *const f64,
    b_len: usize,
    ldb: i32,
    beta: f64,
    c: *mut f64,
    c_len: usize,
    ldc: i32,
    device: i32,
) -> i32 {
    guard("dgemm", || {
        let transa = MatrixOp::try_from(transa)?;
        let transb = MatrixOp::try_from(transb)?;
        let (m, n, k) = (dim("m", m)?, dim("n", n)?, dim("k", k)?);
        let (lda, ldb, ldc) = (dim("lda", lda)?, dim("ldb", ldb)?, dim("ldc", ldc)?);
        let a = slice("a", a, a_len)?;
        let b = slice("b", b, b_len)?;
        let c = slice_mut("c", c, c_len)?;

        with_executor(device, |ctx| {
            linalg::gemm(
                ctx, transa, transb, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc,
            )
        })
    })
}

/// Same as [`gpulinalg_dgemm`], with `b` taken from the values of a list column on
/// `device`. The `m x n` result is written to `*out` as a new column of `n` lists of
/// `m` values, which the caller releases with [`gpulinalg_list_column_free`].
///
/// # Safety
/// `a` must be valid for `a_len` reads, `b` must be a live handle and `out` must be
/// valid for a write.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn gpulinalg_dgemm_list_column(
    transa: i32,
    transb: i32,
    m: i32,
    n: i32,
    k: i32,
    alpha: f64,
    a: *const f64,
    a_len: usize,
    lda: i32,
    b: *const ListColumnHandle,
    ldb: i32,
    beta: f64,
    ldc: i32,
    device: i32,
    out: *mut *mut ListColumnHandle,
) -> i32 {
    guard("dgemm_list_column", || {
        let transa = MatrixOp::try_from(transa)?;
        let transb = MatrixOp::try_from(transb)?;
        let (m, n, k) = (dim("m", m)?, dim("n", n)?, dim("k", k)?);
        let (lda, ldb, ldc) = (dim("lda", lda)?, dim("ldb", ldb)?, dim("ldc", ldc)?);
        let a = slice("a", a, a_len)?;
        let b = ListColumnHandle::from_ptr(b)?.on_device(device)?;

        write_handle(out, || {
            with_executor(device, |ctx| {
                linalg::gemm_list_column(
                    ctx, transa, transb, m, n, k, alpha, a, lda, b, ldb, beta, ldc,
                )
            })
            .map(|column| ListColumnHandle::new(device, column))
        })
    })
}

/// `c = a^T * b`, with `a` stored as `cols_a x rows_a` and `b` as `cols_a x cols_b`,
/// both column major.
///
/// # Safety
/// Every buffer must be valid for its stated length. `c` is written.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn gpulinalg_dgemm_at_b(
    rows_a: i32,
    cols_b: i32,
    cols_a: i32,
    a: *const f64,
    a_len: usize,
    b: *const f64,
    b_len: usize,
    c: *mut f64,
    c_len: usize,
    device: i32,
) -> i32 {
    guard("dgemm_at_b", || {
        let (rows_a, cols_b, cols_a) = (
            dim("rows_a", rows_a)?,
            dim("cols_b", cols_b)?,
            dim("cols_a", cols_a)?,
        );
        let a = slice("a", a, a_len)?;
        let b = slice("b", b, b_len)?;
        let c = slice_mut("c", c, c_len)?;

        with_executor(device, |ctx| {
            linalg::gemm_at_b(ctx, rows_a, cols_b, cols_a, a, b, c)
        })
    })
}

/// Factorises the symmetric `m x m` matrix `a` into descending `s` and column major `u`
/// such that `a = u * diag(s)^2 * u^T`.
///
/// # Safety
/// Every buffer must be valid for its stated length. `u` and `s` are written.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn gpulinalg_eigh_svd(
    m: i32,
    a: *const f64,
    a_len: usize,
    u: *mut f64,
    u_len: usize,
    s: *mut f64,
    s_len: usize,
    device: i32,
) -> i32 {
    guard("eigh_svd", || {
        let m = dim("m", m)?;
        let a = slice("a", a, a_len)?;
        let u = slice_mut("u", u, u_len)?;
        let s = slice_mut("s", s, s_len)?;

        with_executor(device, |ctx| linalg::eigh_svd(ctx, m, a, u, s))
    })
}

/// Opens a named profiling range on the calling thread. A null name opens an unnamed range.
///
/// # Safety
/// `name` must be null or a valid NUL terminated string.
#[no_mangle]
pub unsafe extern "C" fn gpulinalg_range_push(name: *const c_char, color: u32) {
    let name = if name.is_null() {
        c""
    } else {
        CStr::from_ptr(name)
    };
    trace::range_push(name, color);
}

/// Closes the innermost range opened on the calling thread
#[no_mangle]
pub extern "C" fn gpulinalg_range_pop() {
    trace::range_pop();
}
