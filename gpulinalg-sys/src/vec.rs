use std::{alloc::System, fmt, ops::Deref};

use crate::{
    device::{AllocPtr, DeviceAllocator, DevicePtr},
    zero::Zero,
};

/// Same as [`std::vec::Vec`] but using device allocators rather than host allocators.
/// This allows you to have owned buffers on GPUs and CPUs using a single data structure.
///
/// Unlike the std vec, the length is fixed at allocation. The memory is
/// returned to the allocator when the vec is dropped.
pub struct Vec<T: Copy, A: DeviceAllocator = System> {
    ptr: AllocPtr<T, A>,
    len: usize,
    alloc: A,
}

pub type DefaultVec<T> = Vec<T, System>;

impl<T: Copy, A: DeviceAllocator> Drop for Vec<T, A> {
    fn drop(&mut self) {
        unsafe { self.alloc.deallocate::<T>(self.ptr, self.len) }
    }
}

impl<T: Copy, A: DeviceAllocator> Vec<T, A> {
    /// # Safety
    /// The contents are uninitialised and must be written before they are read
    pub unsafe fn uninit_in(len: usize, alloc: A) -> Result<Self, A::Error> {
        let ptr = alloc.allocate::<T>(len)?;
        Ok(Self { ptr, len, alloc })
    }

    pub fn zeroed_in(len: usize, alloc: A) -> Result<Self, A::Error>
    where
        T: Zero,
    {
        let ptr = alloc.allocate_zeroed::<T>(len)?;
        Ok(Self { ptr, len, alloc })
    }

    pub fn zeroed(len: usize) -> Result<Self, A::Error>
    where
        T: Zero,
        A: Default,
    {
        Self::zeroed_in(len, A::default())
    }

    pub fn copy_from_host_in(slice: &[T], alloc: A) -> Result<Self, A::Error> {
        unsafe {
            let mut vec = Self::uninit_in(slice.len(), alloc)?;
            vec.write_from_host(slice)?;
            Ok(vec)
        }
    }

    pub fn copy_from_host(slice: &[T]) -> Result<Self, A::Error>
    where
        A: Default,
    {
        Self::copy_from_host_in(slice, A::default())
    }

    /// Overwrites the contents with `from`.
    ///
    /// # Panics
    /// If the lengths differ
    pub fn write_from_host(&mut self, from: &[T]) -> Result<(), A::Error> {
        assert_eq!(self.len, from.len());
        unsafe { self.alloc.copy_from_host(from, self.ptr) }
    }

    /// Copies the contents into `to`, waiting for any outstanding work on the buffer.
    ///
    /// # Panics
    /// If the lengths differ
    pub fn copy_to_host(&self, to: &mut [T]) -> Result<(), A::Error> {
        assert_eq!(self.len, to.len());
        unsafe { self.alloc.copy_to_host(self.ptr, to) }
    }

    pub fn to_host(&self) -> Result<std::vec::Vec<T>, A::Error>
    where
        T: Default,
    {
        let mut out = vec![T::default(); self.len];
        self.copy_to_host(&mut out)?;
        Ok(out)
    }

    pub fn as_ptr(&self) -> AllocPtr<T, A> {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }
}

impl<T: Copy> Deref for Vec<T, System> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_raw(), self.len) }
    }
}

impl<T: Copy, A: DeviceAllocator> fmt::Debug for Vec<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vec")
            .field("ptr", &self.ptr.as_raw())
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::alloc::System;

    use crate::device::{cpu::HostError, DeviceError};

    use super::{DefaultVec, Vec};

    #[test]
    fn round_trip() {
        let v = DefaultVec::copy_from_host(&[0., 1., 2., 3., 4.]).unwrap();
        assert_eq!(v.len(), 5);
        assert_eq!(&*v, [0., 1., 2., 3., 4.]);

        let mut out = [0.0; 5];
        v.copy_to_host(&mut out).unwrap();
        assert_eq!(out, [0., 1., 2., 3., 4.]);
    }

    #[test]
    fn zeroed() {
        let v = DefaultVec::<i32>::zeroed(4).unwrap();
        assert_eq!(v.to_host().unwrap(), vec![0; 4]);
    }

    #[test]
    fn empty() {
        let v = DefaultVec::<f64>::copy_from_host(&[]).unwrap();
        assert!(v.is_empty());
        assert!(v.to_host().unwrap().is_empty());
    }

    #[test]
    fn overwrite() {
        let mut v = DefaultVec::<f64>::zeroed(3).unwrap();
        v.write_from_host(&[7., 8., 9.]).unwrap();
        assert_eq!(&*v, [7., 8., 9.]);
    }

    #[test]
    fn overflow() {
        let err = Vec::<f64, System>::zeroed_in(usize::MAX / 2, System).unwrap_err();
        assert!(matches!(err, HostError::CapacityOverflow { .. }));
        assert!(err.is_out_of_memory());
    }
}
