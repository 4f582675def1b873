use std::{
    cell::RefCell,
    ffi::{c_char, CString},
    panic::{catch_unwind, AssertUnwindSafe},
};

use gpulinalg_math::{Error, ErrorKind, Result};

/// Result of every fallible entry point
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    Runtime = 1,
    IllegalArgument = 2,
    OutOfMemory = 3,
    InvalidConfiguration = 4,
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Runtime => Status::Runtime,
            ErrorKind::IllegalArgument => Status::IllegalArgument,
            ErrorKind::OutOfMemory => Status::OutOfMemory,
            ErrorKind::InvalidConfiguration => Status::InvalidConfiguration,
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(err: &Error) {
    let msg = err.to_string().replace('\0', "\\0");
    let msg = CString::new(msg).unwrap_or_default();
    LAST_ERROR.with(|last| *last.borrow_mut() = Some(msg));
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Runs `f`, turning its error or panic into a status code and recording the message.
pub(crate) fn guard(operation: &'static str, f: impl FnOnce() -> Result<()>) -> i32 {
    let result = catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| {
        Err(Error::Runtime(format!(
            "{operation} panicked: {}",
            panic_message(&*panic)
        )))
    });

    match result {
        Ok(()) => Status::Ok as i32,
        Err(err) => {
            tracing::warn!(operation, kind = ?err.kind(), %err, "call failed");
            set_last_error(&err);
            Status::from(err.kind()) as i32
        }
    }
}

/// The message of the last failed call on this thread, or null if no call has failed.
///
/// The string stays valid until the next failing call on the same thread.
#[no_mangle]
pub extern "C" fn gpulinalg_last_error() -> *const c_char {
    LAST_ERROR.with(|last| {
        last.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |msg| msg.as_ptr())
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use gpulinalg_math::Error;

    use super::{gpulinalg_last_error, guard, Status};

    #[test]
    fn records_last_error() {
        let status = guard("test", || Err(Error::OutOfMemory("no room".into())));
        assert_eq!(status, Status::OutOfMemory as i32);

        let msg = unsafe { CStr::from_ptr(gpulinalg_last_error()) };
        assert_eq!(msg.to_str().unwrap(), "no room");

        assert_eq!(guard("test", || Ok(())), Status::Ok as i32);
    }

    #[test]
    fn catches_panics() {
        let status = guard("boom", || panic!("oh no"));
        assert_eq!(status, Status::Runtime as i32);

        let msg = unsafe { CStr::from_ptr(gpulinalg_last_error()) };
        assert_eq!(msg.to_str().unwrap(), "boom panicked: oh no");
    }
}
