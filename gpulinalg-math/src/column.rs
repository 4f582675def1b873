use std::alloc::System;

use gpulinalg_sys::{device::DeviceAllocator, Vec};

use crate::error::{Error, Result, Stage};

/// A column of variable length lists of `f64`, resident on a device.
///
/// List `i` holds `child[offsets[i]..offsets[i + 1]]`. The offsets start at zero,
/// never decrease and end at the length of the child buffer.
pub struct ListColumn<A: DeviceAllocator = System> {
    offsets: Vec<i32, A>,
    child: Vec<f64, A>,
}

impl<A: DeviceAllocator> ListColumn<A> {
    /// Uploads a column from host buffers, checking the offsets first.
    pub fn from_host(offsets: &[i32], child: &[f64], alloc: A) -> Result<Self> {
        validate_offsets(offsets, child.len())?;

        let offsets = Vec::copy_from_host_in(offsets, alloc.clone())
            .stage("copying list offsets to device")?;
        let child = Vec::copy_from_host_in(child, alloc).stage("copying list values to device")?;
        Ok(Self { offsets, child })
    }

    /// Wraps `child` as `count` lists of `list_len` values each.
    pub fn uniform(child: Vec<f64, A>, list_len: usize, count: usize) -> Result<Self> {
        let expected = list_len.checked_mul(count);
        if expected != Some(child.len()) {
            return Err(Error::illegal(format!(
                "{count} lists of {list_len} values do not match {} child values",
                child.len()
            )));
        }

        let offsets = (0..=count)
            .map(|i| i32::try_from(i * list_len).ok())
            .collect::<Option<std::vec::Vec<i32>>>()
            .ok_or_else(|| {
                Error::illegal(format!(
                    "offsets of {count} lists of {list_len} values overflow a 32-bit offset"
                ))
            })?;

        let offsets = Vec::copy_from_host_in(&offsets, child.allocator().clone())
            .stage("copying list offsets to device")?;
        Ok(Self { offsets, child })
    }

    pub fn num_lists(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn offsets(&self) -> &Vec<i32, A> {
        &self.offsets
    }

    /// The values of every list, back to back
    pub fn child(&self) -> &Vec<f64, A> {
        &self.child
    }

    /// Copies the offsets and the child values back to the host
    pub fn to_host(&self) -> Result<(std::vec::Vec<i32>, std::vec::Vec<f64>)> {
        let offsets = self
            .offsets
            .to_host()
            .stage("copying list offsets to host")?;
        let child = self.child.to_host().stage("copying list values to host")?;
        Ok((offsets, child))
    }
}

fn validate_offsets(offsets: &[i32], child_len: usize) -> Result<()> {
    match offsets.first() {
        None => return Err(Error::illegal("a list column needs at least one offset")),
        Some(&first) if first != 0 => {
            return Err(Error::illegal(format!(
                "list offsets must start at 0, got {first}"
            )))
        }
        _ => {}
    }

    if let Some(i) = offsets.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::illegal(format!(
            "list offsets must not decrease, offset {} is {} but offset {} is {}",
            i,
            offsets[i],
            i + 1,
            offsets[i + 1]
        )));
    }

    let last = offsets[offsets.len() - 1];
    if last as usize != child_len {
        return Err(Error::illegal(format!(
            "last list offset {last} does not match {child_len} child values"
        )));
    }
    Ok(())
}

impl<A: DeviceAllocator> std::fmt::Debug for ListColumn<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListColumn")
            .field("num_lists", &self.num_lists())
            .field("child_len", &self.child.len())
            .finish()
    }
}
