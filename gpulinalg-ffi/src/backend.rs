//! Resolves a device ordinal to the context work for it runs on.

use gpulinalg_math::{Error, Result};

/// Negative ordinals never name a device, on any backend
fn ordinal(device: i32) -> Result<u32> {
    u32::try_from(device).map_err(|_| {
        Error::IllegalArgument(format!("device ordinal must not be negative, got {device}"))
    })
}

#[cfg(not(feature = "cuda"))]
mod imp {
    use gpulinalg_math::{blas::cpu::CpuContext, Error, Result};

    pub type Alloc = std::alloc::System;

    /// Runs `f` on the host. Only ordinal 0 exists.
    pub fn with_executor<R>(
        device: i32,
        f: impl FnOnce(CpuContext) -> Result<R>,
    ) -> Result<R> {
        if super::ordinal(device)? != 0 {
            return Err(Error::Runtime(format!("no host device with ordinal {device}")));
        }
        f(CpuContext)
    }
}

#[cfg(feature = "cuda")]
mod imp {
    use std::{collections::HashMap, sync::Arc};

    use gpulinalg_math::{sys::device::cuda::SharedStream, CudaExecutor, Result};
    use once_cell::sync::Lazy;
    use parking_lot::Mutex;

    pub type Alloc = SharedStream;

    static EXECUTORS: Lazy<Mutex<HashMap<u32, Arc<Mutex<CudaExecutor>>>>> =
        Lazy::new(Default::default);

    fn executor(ordinal: u32) -> Result<Arc<Mutex<CudaExecutor>>> {
        let mut executors = EXECUTORS.lock();
        if let Some(executor) = executors.get(&ordinal) {
            return Ok(executor.clone());
        }
        let executor = Arc::new(Mutex::new(CudaExecutor::new(ordinal)?));
        executors.insert(ordinal, executor.clone());
        Ok(executor)
    }

    /// Runs `f` with exclusive use of the executor for `device`, creating it on first use.
    pub fn with_executor<R>(
        device: i32,
        f: impl FnOnce(&CudaExecutor) -> Result<R>,
    ) -> Result<R> {
        let executor = executor(super::ordinal(device)?)?;
        let executor = executor.lock();
        executor.run(f)
    }
}

pub use imp::{with_executor, Alloc};

#[cfg(test)]
mod tests {
    use gpulinalg_math::ErrorKind;

    use super::ordinal;

    #[test]
    fn negative_ordinal() {
        assert_eq!(ordinal(-1).unwrap_err().kind(), ErrorKind::IllegalArgument);
        assert_eq!(ordinal(2).unwrap(), 2);
    }
}
