//! Named, nested ranges for profiling.
//!
//! Every range opens a `tracing` span. With the `cuda` feature it is also pushed to NVTX
//! so it shows up on the Nsight Systems timeline.

use std::{cell::RefCell, ffi::CStr};

use tracing::span::EnteredSpan;

thread_local! {
    static RANGES: RefCell<Vec<EnteredSpan>> = RefCell::new(Vec::new());
}

/// Opens a range on the calling thread. `color` is ARGB.
pub fn range_push(name: &CStr, color: u32) {
    let span = tracing::debug_span!("range", range = %name.to_string_lossy(), color).entered();

    #[cfg(feature = "cuda")]
    gpulinalg_sys::device::cuda::nvtx::range_push(name, color);

    RANGES.with(|ranges| ranges.borrow_mut().push(span));
}

/// Closes the innermost range opened on the calling thread. Does nothing if none is open.
pub fn range_pop() {
    let Some(span) = RANGES.with(|ranges| ranges.borrow_mut().pop()) else {
        return;
    };

    #[cfg(feature = "cuda")]
    gpulinalg_sys::device::cuda::nvtx::range_pop();

    span.exit();
}

/// Number of ranges open on the calling thread
pub fn range_depth() -> usize {
    RANGES.with(|ranges| ranges.borrow().len())
}
