use std::alloc::System;

use super::BLASContext;

mod matmul;
mod spr;

/// Runs BLAS routines on the host
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuContext;

impl BLASContext for CpuContext {
    type Alloc = System;

    fn allocator(self) -> System {
        System
    }
}
