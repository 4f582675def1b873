use std::alloc::System;

use approx::assert_relative_eq;
use proptest::prelude::*;

use crate::{
    blas::{cpu::CpuContext, MatrixOp},
    column::ListColumn,
    error::ErrorKind,
};

use super::{eigh_svd, gemm, gemm_at_b, gemm_list_column, spr};

const OPS: [MatrixOp; 4] = [
    MatrixOp::NoTrans,
    MatrixOp::Trans,
    MatrixOp::ConjTrans,
    MatrixOp::Conj,
];

/// Reads element `(i, j)` of `op(x)` for a column major `x`
fn read(x: &[f64], ld: usize, op: MatrixOp, i: usize, j: usize) -> f64 {
    if op.is_transposed() {
        x[j + i * ld]
    } else {
        x[i + j * ld]
    }
}

#[allow(clippy::too_many_arguments)]
fn reference(
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
) {
    for j in 0..n {
        for i in 0..m {
            let dot: f64 = (0..k)
                .map(|l| read(a, lda, transa, i, l) * read(b, ldb, transb, l, j))
                .sum();
            c[i + j * ldc] = alpha * dot + beta * c[i + j * ldc];
        }
    }
}

fn values(len: usize, seed: f64) -> Vec<f64> {
    (0..len).map(|i| ((i as f64 + seed) * 0.37).sin()).collect()
}

#[test]
fn gemm_matches_reference() {
    let (m, n, k) = (3, 4, 5);
    for transa in OPS {
        for transb in OPS {
            let lda = if transa.is_transposed() { k + 1 } else { m + 2 };
            let ldb = if transb.is_transposed() { n } else { k + 3 };
            let ldc = m + 1;

            let a = values(lda * m.max(k), 1.0);
            let b = values(ldb * n.max(k), 2.0);
            let mut c = values(ldc * n, 3.0);
            let mut expected = c.clone();

            gemm(
                CpuContext, transa, transb, m, n, k, 0.5, &a, lda, &b, ldb, -2.0, &mut c, ldc,
            )
            .unwrap();
            reference(
                transa,
                transb,
                m,
                n,
                k,
                0.5,
                &a,
                lda,
                &b,
                ldb,
                -2.0,
                &mut expected,
                ldc,
            );

            for (got, want) in c.iter().zip(&expected) {
                assert_relative_eq!(got, want, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn gemm_invalid_op() {
    let err = MatrixOp::try_from(4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert_eq!(MatrixOp::try_from(2).unwrap(), MatrixOp::ConjTrans);
}

#[test]
fn gemm_short_buffers() {
    let a = [1.; 4];
    let b = [1.; 3];
    let mut c = [7.; 4];
    let err = gemm(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        2,
        2,
        2,
        1.0,
        &a,
        2,
        &b,
        2,
        0.0,
        &mut c,
        2,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalArgument);
    assert_eq!(err.to_string(), "b holds 3 values but 4 are required");
    assert_eq!(c, [7.; 4]);
}

#[test]
fn gemm_small_leading_dimension() {
    let err = gemm(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        2,
        2,
        2,
        1.0,
        &[0.; 4],
        1,
        &[0.; 4],
        2,
        0.0,
        &mut [0.; 4],
        2,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalArgument);
}

#[test]
fn at_b() {
    // A = 1 2 3
    //     4 5 6
    // stored transposed, ld = cols_a
    let a = [1., 2., 3., 4., 5., 6.];

    // B = 1 0
    //     0 1
    //     1 1
    let b = [1., 0., 1., 0., 1., 1.];
    let mut c = [0.; 4];

    gemm_at_b(CpuContext, 2, 2, 3, &a, &b, &mut c).unwrap();

    // AB = 4  5
    //     10 11
    assert_eq!(c, [4., 10., 5., 11.]);
}

#[test]
fn list_column_result() {
    // A = 1 3
    //     2 4
    let a = [1., 2., 3., 4.];
    // B = 5 7
    //     6 8
    let b = ListColumn::from_host(&[0, 4], &[5., 6., 7., 8.], System).unwrap();

    let out = gemm_list_column(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        2,
        2,
        2,
        1.0,
        &a,
        2,
        &b,
        2,
        0.0,
        2,
    )
    .unwrap();

    let (offsets, child) = out.to_host().unwrap();
    assert_eq!(offsets, [0, 2, 4]);
    assert_eq!(child, [23., 34., 31., 46.]);
}

#[test]
fn list_column_short_b() {
    let b = ListColumn::from_host(&[0, 3], &[5., 6., 7.], System).unwrap();
    let err = gemm_list_column(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        2,
        2,
        2,
        1.0,
        &[1.; 4],
        2,
        &b,
        2,
        0.0,
        2,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalArgument);
}

#[test]
fn list_column_ldc() {
    let b = ListColumn::from_host(&[0, 4], &[5., 6., 7., 8.], System).unwrap();
    let err = gemm_list_column(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        2,
        2,
        2,
        1.0,
        &[1.; 4],
        2,
        &b,
        2,
        0.0,
        3,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalArgument);
}

#[test]
fn list_column_out_of_memory() {
    let m = i32::MAX as usize;
    let n = i32::MAX as usize;
    let b = ListColumn::from_host(&[0], &[], System).unwrap();

    let err = gemm_list_column(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::Trans,
        m,
        n,
        0,
        1.0,
        &[],
        m,
        &b,
        n,
        0.0,
        m,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfMemory);
    assert!(
        err.to_string()
            .starts_with("Unable to allocate native memory: allocating device memory for result"),
        "{err}"
    );
}

#[test]
fn list_column_empty() {
    let b = ListColumn::from_host(&[0], &[], System).unwrap();
    let out = gemm_list_column(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        0,
        3,
        0,
        1.0,
        &[],
        1,
        &b,
        1,
        0.0,
        0,
    )
    .unwrap();
    assert_eq!(out.num_lists(), 3);
    assert_eq!(out.to_host().unwrap(), (vec![0, 0, 0, 0], vec![]));
}

#[test]
fn eigh_svd_spd() {
    // A = B^T B + I is symmetric positive definite
    let m = 4;
    let b = values(m * m, 5.0);
    let mut a = vec![0.; m * m];
    for i in 0..m {
        for j in 0..m {
            a[i + j * m] = (0..m).map(|l| b[l + i * m] * b[l + j * m]).sum::<f64>()
                + if i == j { 1.0 } else { 0.0 };
        }
    }

    let mut u = vec![0.; m * m];
    let mut s = vec![0.; m];
    eigh_svd(CpuContext, m, &a, &mut u, &mut s).unwrap();

    for w in s.windows(2) {
        assert!(w[0] > w[1], "{s:?}");
    }
    for col in u.chunks(m) {
        let max = col.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let first = col.iter().find(|v| v.abs() == max).unwrap();
        assert!(*first >= 0.0);
    }

    for i in 0..m {
        for j in 0..m {
            let dot: f64 = (0..m).map(|l| u[l + i * m] * u[l + j * m]).sum();
            assert_relative_eq!(dot, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-10);

            let rebuilt: f64 = (0..m).map(|l| u[i + l * m] * s[l] * s[l] * u[j + l * m]).sum();
            assert_relative_eq!(rebuilt, a[i + j * m], epsilon = 1e-9);
        }
    }
}

#[test]
fn eigh_svd_clamps_negative() {
    // eigenvalues -1 and 3
    let a = [1., 2., 2., 1.];
    let mut u = [0.; 4];
    let mut s = [0.; 2];
    eigh_svd(CpuContext, 2, &a, &mut u, &mut s).unwrap();

    assert_relative_eq!(s[0], 3f64.sqrt(), epsilon = 1e-12);
    assert_eq!(s[1], 0.0);
}

#[test]
fn eigh_svd_empty() {
    eigh_svd(CpuContext, 0, &[], &mut [], &mut []).unwrap();
}

#[test]
fn eigh_svd_short_output() {
    let mut u = [9.; 3];
    let mut s = [9.; 2];
    let err = eigh_svd(CpuContext, 2, &[1., 0., 0., 1.], &mut u, &mut s).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalArgument);
    assert_eq!(u, [9.; 3]);
}

proptest! {
    #[test]
    fn spr_adds_outer_product(x in prop::collection::vec(-5.0f64..5.0, 0..8)) {
        let n = x.len();
        let packed = n * (n + 1) / 2;
        let before = values(packed, 7.0);
        let mut a = before.clone();

        spr(CpuContext, n, &x, &mut a).unwrap();

        for j in 0..n {
            for i in 0..=j {
                let p = i + j * (j + 1) / 2;
                prop_assert!((a[p] - (before[p] + x[i] * x[j])).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn spr_short_a() {
    let mut a = [0.; 5];
    let err = spr(CpuContext, 3, &[1., 2., 3.], &mut a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalArgument);
}
