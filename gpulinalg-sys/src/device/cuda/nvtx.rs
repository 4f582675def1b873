//! Bindings to the NVTX range API, used to annotate the profiler timeline.

use std::ffi::{c_char, c_int, CStr};

const NVTX_VERSION: u16 = 2;
const NVTX_COLOR_ARGB: i32 = 1;
const NVTX_PAYLOAD_UNKNOWN: i32 = 0;
const NVTX_MESSAGE_TYPE_ASCII: i32 = 1;

/// `nvtxEventAttributes_t`. The payload union is always 8 bytes wide and unused here.
#[repr(C)]
struct EventAttributes {
    version: u16,
    size: u16,
    category: u32,
    color_type: i32,
    color: u32,
    payload_type: i32,
    reserved0: i32,
    payload: u64,
    message_type: i32,
    message: *const c_char,
}

#[link(name = "nvToolsExt")]
extern "C" {
    fn nvtxRangePushEx(attributes: *const EventAttributes) -> c_int;
    fn nvtxRangePop() -> c_int;
}

/// Opens a nested range named `name` with an ARGB `color`.
///
/// Returns the zero based level of the new range, or a negative value on error.
pub fn range_push(name: &CStr, color: u32) -> i32 {
    let attributes = EventAttributes {
        version: NVTX_VERSION,
        size: std::mem::size_of::<EventAttributes>() as u16,
        category: 0,
        color_type: NVTX_COLOR_ARGB,
        color,
        payload_type: NVTX_PAYLOAD_UNKNOWN,
        reserved0: 0,
        payload: 0,
        message_type: NVTX_MESSAGE_TYPE_ASCII,
        message: name.as_ptr(),
    };
    unsafe { nvtxRangePushEx(&attributes) }
}

/// Closes the innermost open range.
pub fn range_pop() -> i32 {
    unsafe { nvtxRangePop() }
}
