use gpulinalg_math::{blas::cpu::CpuContext, blas::MatrixOp, linalg};

fn main() {
    //     0 1
    // A = 2 3
    //     4 5

    // B = 0 1
    //     2 3

    // column major (read each column first)
    let a = [0., 2., 4., 1., 3., 5.];
    let b = [0., 2., 1., 3.];
    let mut c = [0.; 6];

    //           2  3
    // C = AB =  6 11
    //          10 19
    linalg::gemm(
        CpuContext,
        MatrixOp::NoTrans,
        MatrixOp::NoTrans,
        3,
        2,
        2,
        1.,
        &a,
        3,
        &b,
        2,
        0.,
        &mut c,
        3,
    )
    .unwrap();
    assert_eq!(c, [2., 6., 10., 3., 11., 19.]);

    // 2 1
    // 1 2
    let mut u = [0.; 4];
    let mut s = [0.; 2];
    linalg::eigh_svd(CpuContext, 2, &[2., 1., 1., 2.], &mut u, &mut s).unwrap();
    println!("s = {s:?}, u = {u:?}");
}
