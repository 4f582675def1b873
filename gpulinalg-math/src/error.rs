use std::borrow::Cow;

use gpulinalg_sys::device::DeviceError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The category a caller sees for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Runtime,
    IllegalArgument,
    OutOfMemory,
    InvalidConfiguration,
}

#[derive(Debug, Error)]
pub enum Error {
    /// A device, driver or vendor library call failed while running `stage`
    #[error("{stage} failed: {source}")]
    Device {
        stage: Cow<'static, str>,
        out_of_memory: bool,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    IllegalArgument(String),

    #[error("{0}")]
    OutOfMemory(String),

    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("{0}")]
    Runtime(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Device {
                out_of_memory: true,
                ..
            }
            | Error::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Error::Device { .. } | Error::Runtime(_) => ErrorKind::Runtime,
            Error::IllegalArgument(_) => ErrorKind::IllegalArgument,
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
        }
    }

    pub(crate) fn illegal(msg: impl Into<String>) -> Self {
        Error::IllegalArgument(msg.into())
    }
}

/// Names the step a device error happened in.
pub trait Stage<T> {
    fn stage(self, stage: &'static str) -> Result<T>;
    fn with_stage<F: FnOnce() -> String>(self, stage: F) -> Result<T>;
}

impl<T, E: DeviceError> Stage<T> for std::result::Result<T, E> {
    fn stage(self, stage: &'static str) -> Result<T> {
        self.with_stage(|| stage.to_owned())
    }

    fn with_stage<F: FnOnce() -> String>(self, stage: F) -> Result<T> {
        self.map_err(|err| Error::Device {
            stage: stage().into(),
            out_of_memory: err.is_out_of_memory(),
            source: Box::new(err),
        })
    }
}
