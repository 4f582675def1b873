//! Opaque list column handles owned by the caller.

use gpulinalg_math::{blas::BLASContext, column::ListColumn, Error, Result};

use crate::{
    backend::{with_executor, Alloc},
    error::guard,
    slice, slice_mut,
};

/// A [`ListColumn`] together with the device it lives on
pub struct ListColumnHandle {
    device: i32,
    column: ListColumn<Alloc>,
}

impl ListColumnHandle {
    pub(crate) fn new(device: i32, column: ListColumn<Alloc>) -> Self {
        Self { device, column }
    }

    /// The column, if it lives on `device`
    pub(crate) fn on_device(&self, device: i32) -> Result<&ListColumn<Alloc>> {
        if self.device != device {
            return Err(Error::IllegalArgument(format!(
                "list column lives on device {} but the call targets device {device}",
                self.device
            )));
        }
        Ok(&self.column)
    }

    pub(crate) fn into_raw(self) -> *mut ListColumnHandle {
        Box::into_raw(Box::new(self))
    }

    /// # Safety
    /// `ptr` must be null or come from [`ListColumnHandle::into_raw`] and not have been freed.
    pub(crate) unsafe fn from_ptr<'a>(ptr: *const ListColumnHandle) -> Result<&'a Self> {
        ptr.as_ref()
            .ok_or_else(|| Error::IllegalArgument("list column handle is null".to_owned()))
    }
}

/// Writes a new handle to `out`.
///
/// # Safety
/// `out` must be null or valid for a write.
pub(crate) unsafe fn write_handle(
    out: *mut *mut ListColumnHandle,
    f: impl FnOnce() -> Result<ListColumnHandle>,
) -> Result<()> {
    if out.is_null() {
        return Err(Error::IllegalArgument(
            "output handle pointer is null".to_owned(),
        ));
    }
    *out = f()?.into_raw();
    Ok(())
}

/// Uploads a list column to `device`. The new handle is written to `*out` and must be
/// released with [`gpulinalg_list_column_free`].
///
/// # Safety
/// `offsets` and `child` must be valid for `offsets_len` and `child_len` reads.
/// `out` must be valid for a write.
#[no_mangle]
pub unsafe extern "C" fn gpulinalg_list_column_from_host(
    offsets: *const i32,
    offsets_len: usize,
    child: *const f64,
    child_len: usize,
    device: i32,
    out: *mut *mut ListColumnHandle,
) -> i32 {
    guard("list_column_from_host", || {
        let offsets = slice("offsets", offsets, offsets_len)?;
        let child = slice("child", child, child_len)?;
        write_handle(out, || {
            with_executor(device, |ctx| {
                let column = ListColumn::from_host(offsets, child, ctx.allocator())?;
                Ok(ListColumnHandle::new(device, column))
            })
        })
    })
}

/// Reports the number of lists and the total number of values in a column.
///
/// # Safety
/// `handle` must be a live handle. `num_lists` and `child_len` must be valid for a write.
#[no_mangle]
pub unsafe extern "C" fn gpulinalg_list_column_sizes(
    handle: *const ListColumnHandle,
    num_lists: *mut usize,
    child_len: *mut usize,
) -> i32 {
    guard("list_column_sizes", || {
        let handle = ListColumnHandle::from_ptr(handle)?;
        if num_lists.is_null() || child_len.is_null() {
            return Err(Error::IllegalArgument("size pointer is null".to_owned()));
        }
        *num_lists = handle.column.num_lists();
        *child_len = handle.column.child().len();
        Ok(())
    })
}

/// Copies a column back to the host. `offsets_len` must be the number of lists plus one
/// and `child_len` the number of values.
///
/// # Safety
/// `handle` must be a live handle. `offsets` and `child` must be valid for
/// `offsets_len` and `child_len` writes.
#[no_mangle]
pub unsafe extern "C" fn gpulinalg_list_column_to_host(
    handle: *const ListColumnHandle,
    offsets: *mut i32,
    offsets_len: usize,
    child: *mut f64,
    child_len: usize,
) -> i32 {
    guard("list_column_to_host", || {
        let handle = ListColumnHandle::from_ptr(handle)?;
        let column = &handle.column;
        if offsets_len != column.offsets().len() || child_len != column.child().len() {
            return Err(Error::IllegalArgument(format!(
                "buffers of {offsets_len} offsets and {child_len} values do not match \
                 a column of {} lists and {} values",
                column.num_lists(),
                column.child().len()
            )));
        }
        let offsets = slice_mut("offsets", offsets, offsets_len)?;
        let child = slice_mut("child", child, child_len)?;

        let (host_offsets, host_child) = with_executor(handle.device, |_| column.to_host())?;
        offsets.copy_from_slice(&host_offsets);
        child.copy_from_slice(&host_child);
        Ok(())
    })
}

/// Releases a handle and its device memory. Null is ignored.
///
/// # Safety
/// `handle` must be null or a live handle, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn gpulinalg_list_column_free(handle: *mut ListColumnHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}
