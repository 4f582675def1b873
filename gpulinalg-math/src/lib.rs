/// Traits and implementations of BLAS providers
pub mod blas;

/// Column of variable length lists kept on a device
pub mod column;

mod error;

/// The operations exposed to foreign callers
pub mod linalg;

/// Traits and implementations of dense solvers
pub mod solver;

pub mod trace;

#[cfg(feature = "cuda")]
mod cuda;

pub use error::{Error, ErrorKind, Result, Stage};
pub use gpulinalg_sys as sys;

#[cfg(feature = "cuda")]
pub use cuda::CudaExecutor;
