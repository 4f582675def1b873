use gpulinalg_math::{blas::MatrixOp, column::ListColumn, linalg, CudaExecutor};

fn main() -> gpulinalg_math::Result<()> {
    // init cuda context, stream and library handles for device 0
    let executor = CudaExecutor::new(0)?;

    executor.run(|ex| {
        //     0 1
        // A = 2 3
        //     4 5

        // B = 0 1
        //     2 3

        // column major (read each column first)
        let a = [0., 2., 4., 1., 3., 5.];
        let b = ListColumn::from_host(&[0, 2, 4], &[0., 2., 1., 3.], ex.stream().clone())?;

        //           2  3
        // C = AB =  6 11
        //          10 19
        let c = linalg::gemm_list_column(
            ex,
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
            3,
        )?;

        let (offsets, values) = c.to_host()?;
        assert_eq!(offsets, [0, 3, 6]);
        assert_eq!(values, [2., 6., 10., 3., 11., 19.]);
        Ok(())
    })
}
