//! The bridge operations. Each one stages host buffers into memory owned by the
//! context's allocator, runs a single BLAS or solver routine, and copies the
//! results back. Host outputs are only written once every step has succeeded.

use gpulinalg_sys::Vec;

use crate::{
    blas::{BLASContext, FillMode, MatrixOp, GEMM, SPR},
    column::ListColumn,
    error::{Error, ErrorKind, Result, Stage},
    solver::{EigMode, SYEVD},
};

pub mod post;

#[cfg(test)]
mod tests;

/// Converts a dimension to the 32-bit integer the routines take
fn dim(name: &str, value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::illegal(format!("{name} ({value}) exceeds i32::MAX")))
}

/// Number of values a `rows x cols` column major matrix with leading dimension `ld` spans
fn footprint(name: &str, rows: usize, cols: usize, ld: usize) -> Result<usize> {
    if ld < rows.max(1) {
        return Err(Error::illegal(format!(
            "leading dimension of {name} ({ld}) must be at least max(1, {rows})"
        )));
    }
    if rows == 0 || cols == 0 {
        return Ok(0);
    }
    ld.checked_mul(cols - 1)
        .and_then(|n| n.checked_add(rows))
        .ok_or_else(|| Error::illegal(format!("{name} spans more than usize::MAX values")))
}

fn check_len(name: &str, len: usize, required: usize) -> Result<()> {
    if len < required {
        Err(Error::illegal(format!(
            "{name} holds {len} values but {required} are required"
        )))
    } else {
        Ok(())
    }
}

/// Stored shape of an operand that is read as `rows x cols` through `op`
fn stored(op: MatrixOp, rows: usize, cols: usize) -> (usize, usize) {
    if op.is_transposed() {
        (cols, rows)
    } else {
        (rows, cols)
    }
}

/// Rank-1 update `a = a + x * x^T` of the packed upper triangle of an `n x n` symmetric matrix.
///
/// Element `(i, j)` with `i <= j` lives at `a[i + j * (j + 1) / 2]`.
pub fn spr<C: BLASContext>(ctx: C, n: usize, x: &[f64], a: &mut [f64]) -> Result<()>
where
    f64: SPR<C>,
{
    tracing::debug!(n, "spr");

    let n_i32 = dim("n", n)?;
    let packed = n
        .checked_mul(n + 1)
        .map(|v| v / 2)
        .ok_or_else(|| Error::illegal(format!("packed size of n ({n}) overflows")))?;
    check_len("x", x.len(), n)?;
    check_len("a", a.len(), packed)?;

    let alloc = ctx.allocator();
    let x_d = Vec::copy_from_host_in(&x[..n], alloc.clone()).stage("copying x to device")?;
    let a_d = Vec::copy_from_host_in(&a[..packed], alloc).stage("copying a to device")?;

    unsafe {
        f64::spr(
            ctx,
            FillMode::Upper,
            n_i32,
            1.0,
            x_d.as_ptr(),
            1,
            a_d.as_ptr(),
        )?;
    }

    a_d.copy_to_host(&mut a[..packed])
        .stage("copying a to host")
}

/// Validated shapes of a gemm call
struct GemmShape {
    a_len: usize,
    b_len: usize,
    c_len: usize,
    dims: [i32; 6],
}

#[allow(clippy::too_many_arguments)]
fn gemm_shape(
    transa: MatrixOp,
    transb: MatrixOp,
    m: usize,
    n: usize,
    k: usize,
    lda: usize,
    ldb: usize,
    ldc: usize,
) -> Result<GemmShape> {
    let (ar, ac) = stored(transa, m, k);
    let (br, bc) = stored(transb, k, n);
    Ok(GemmShape {
        a_len: footprint("a", ar, ac, lda)?,
        b_len: footprint("b", br, bc, ldb)?,
        c_len: footprint("c", m, n, ldc)?,
        dims: [
            dim("m", m)?,
            dim("n", n)?,
            dim("k", k)?,
            dim("lda", lda)?,
            dim("ldb", ldb)?,
            dim("ldc", ldc)?,
        ],
    })
}

/// Column major `c = alpha * op(a) * op(b) + beta * c`.
///
/// `op(a)` is `m x k`, `op(b)` is `k x n` and `c` is `m x n`.
/// On real data [`MatrixOp::ConjTrans`] reads like [`MatrixOp::Trans`] and
/// [`MatrixOp::Conj`] like [`MatrixOp::NoTrans`].
#[allow(clippy::too_many_arguments)]
pub fn gemm<C: BLASContext>(
    ctx: C,
    transa: MatrixOp,
    transb: MatrixOp,
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    b: &[f64],
    ldb: usize,
    beta: f64,
    c: &mut [f64],
    ldc: usize,
) -> Result<()>
where
    f64: GEMM<C>,
{
    tracing::debug!(?transa, ?transb, m, n, k, "gemm");

    let shape = gemm_shape(transa, transb, m, n, k, lda, ldb, ldc)?;
    check_len("a", a.len(), shape.a_len)?;
    check_len("b", b.len(), shape.b_len)?;
    check_len("c", c.len(), shape.c_len)?;
    let [m, n, k, lda, ldb, ldc] = shape.dims;

    let alloc = ctx.allocator();
    let a_d = Vec::copy_from_host_in(&a[..shape.a_len], alloc.clone())
        .stage("copying a to device")?;
    let b_d = Vec::copy_from_host_in(&b[..shape.b_len], alloc.clone())
        .stage("copying b to device")?;
    let c_d = Vec::copy_from_host_in(&c[..shape.c_len], alloc).stage("copying c to device")?;

    unsafe {
        f64::gemm(
            ctx,
            transa,
            transb,
            m,
            n,
            k,
            alpha,
            a_d.as_ptr(),
            lda,
            b_d.as_ptr(),
            ldb,
            beta,
            c_d.as_ptr(),
            ldc,
        )?;
    }

    c_d.copy_to_host(&mut c[..shape.c_len])
        .stage("copying c to host")
}

/// Out of memory failures of list column results are reported as native allocation failures
fn native_allocation(err: Error) -> Error {
    match err.kind() {
        ErrorKind::OutOfMemory => {
            Error::OutOfMemory(format!("Unable to allocate native memory: {err}"))
        }
        _ => err,
    }
}

/// Same as [`gemm`], but `b` is already resident in a [`ListColumn`] and the
/// `m x n` result is returned as a new column of `n` lists of `m` values.
///
/// The result starts zeroed, so `beta` scales nothing. `ldc` must equal `m`.
#[allow(clippy::too_many_arguments)]
pub fn gemm_list_column<C: BLASContext>(
    ctx: C,
    transa: MatrixOp,
    transb: MatrixOp,
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    b: &ListColumn<C::Alloc>,
    ldb: usize,
    beta: f64,
    ldc: usize,
) -> Result<ListColumn<C::Alloc>>
where
    f64: GEMM<C>,
{
    tracing::debug!(?transa, ?transb, m, n, k, "gemm_list_column");

    if ldc != m {
        return Err(Error::illegal(format!(
            "ldc ({ldc}) must equal m ({m}) for a list column result"
        )));
    }
    // a column of empty lists still needs a valid leading dimension
    let shape = gemm_shape(transa, transb, m, n, k, lda, ldb, ldc.max(1))?;
    check_len("a", a.len(), shape.a_len)?;
    check_len("b", b.child().len(), shape.b_len)?;
    let [m_i32, n_i32, k_i32, lda, ldb, ldc] = shape.dims;

    let alloc = ctx.allocator();
    let len = m.checked_mul(n).ok_or_else(|| {
        native_allocation(Error::OutOfMemory(format!(
            "a {m} x {n} result does not fit in memory"
        )))
    })?;
    let c_d = Vec::<f64, _>::zeroed_in(len, alloc.clone())
        .stage("allocating device memory for result")
        .map_err(native_allocation)?;

    if len > 0 {
        let a_d = Vec::copy_from_host_in(&a[..shape.a_len], alloc)
            .stage("copying a to device")
            .map_err(native_allocation)?;
        unsafe {
            f64::gemm(
                ctx,
                transa,
                transb,
                m_i32,
                n_i32,
                k_i32,
                alpha,
                a_d.as_ptr(),
                lda,
                b.child().as_ptr(),
                ldb,
                beta,
                c_d.as_ptr(),
                ldc,
            )?;
        }
    }

    ListColumn::uniform(c_d, m, n)
}

/// `c = op(a) * b` with `op = T`, for an `a` stored as `cols_a x rows_a`
/// (so `op(a)` is `rows_a x cols_a`) and `b` stored as `cols_a x cols_b`.
pub fn gemm_at_b<C: BLASContext>(
    ctx: C,
    rows_a: usize,
    cols_b: usize,
    cols_a: usize,
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
) -> Result<()>
where
    f64: GEMM<C>,
{
    gemm(
        ctx,
        MatrixOp::Trans,
        MatrixOp::NoTrans,
        rows_a,
        cols_b,
        cols_a,
        1.0,
        a,
        cols_a,
        b,
        cols_a,
        0.0,
        c,
        rows_a,
    )
}

/// Factorises the symmetric `m x m` matrix `a` as `a = u * diag(s)^2 * u^T`.
///
/// `s` is descending and holds the square roots of the eigenvalues, clamped to zero.
/// Column `j` of `u` (`u[j * m..(j + 1) * m]`) is the matching eigenvector, with its
/// largest magnitude entry made non-negative. Only the lower triangle of `a` is read.
pub fn eigh_svd<C: BLASContext>(
    ctx: C,
    m: usize,
    a: &[f64],
    u: &mut [f64],
    s: &mut [f64],
) -> Result<()>
where
    f64: SYEVD<C>,
{
    tracing::debug!(m, "eigh_svd");

    if m == 0 {
        return Ok(());
    }
    let m_i32 = dim("m", m)?;
    let len = m
        .checked_mul(m)
        .ok_or_else(|| Error::illegal(format!("a {m} x {m} matrix overflows")))?;
    check_len("a", a.len(), len)?;
    check_len("u", u.len(), len)?;
    check_len("s", s.len(), m)?;

    let alloc = ctx.allocator();
    let a_d = Vec::copy_from_host_in(&a[..len], alloc.clone()).stage("copying a to device")?;
    let w_d = Vec::<f64, _>::zeroed_in(m, alloc)
        .stage("allocating device memory for eigenvalues")?;

    unsafe {
        f64::syevd(
            ctx,
            EigMode::Vectors,
            FillMode::Lower,
            m_i32,
            a_d.as_ptr(),
            m_i32,
            w_d.as_ptr(),
        )?;
    }

    let mut vectors = a_d.to_host().stage("copying eigenvectors to host")?;
    let mut values = w_d.to_host().stage("copying eigenvalues to host")?;

    post::reverse_columns(&mut vectors, m);
    values.reverse();
    post::sqrt_non_negative(&mut values);
    post::sign_flip(&mut vectors, m);

    u[..len].copy_from_slice(&vectors);
    s[..m].copy_from_slice(&values);
    Ok(())
}
