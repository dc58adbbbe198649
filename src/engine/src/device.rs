//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! The execution device and its buffer objects.
use std::mem;
use thiserror::Error;

use rayverb_common::dispatch::Queue;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to allocate a device buffer of {bytes} bytes")]
    Allocation { bytes: usize },
}

/// A SIMT execution device.
///
/// Kernels submitted through the device's queue execute one independent work
/// item per ray or impulse. The host suspends only at explicit buffer copies,
/// which complete before the next submission begins.
#[derive(Debug)]
pub struct Device<Q> {
    queue: Q,
}

impl<Q: Queue> Device<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Allocate a buffer of `len` elements, every element set to `fill`.
    pub fn buffer<T: Copy>(&self, len: usize, fill: T) -> Result<Buffer<T>, DeviceError> {
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| {
            DeviceError::Allocation { bytes: len * mem::size_of::<T>() }
        })?;
        data.resize(len, fill);
        Ok(Buffer { data: data.into_boxed_slice() })
    }

    /// Allocate a buffer and upload `data` into it.
    pub fn buffer_from<T: Copy>(&self, data: &[T]) -> Result<Buffer<T>, DeviceError> {
        let mut storage = Vec::new();
        storage.try_reserve_exact(data.len()).map_err(|_| {
            DeviceError::Allocation { bytes: data.len() * mem::size_of::<T>() }
        })?;
        storage.extend_from_slice(data);
        Ok(Buffer { data: storage.into_boxed_slice() })
    }
}

/// A value-owned device allocation.
///
/// There is exactly one owner at a time; the storage is released when the
/// buffer is dropped. Copies in and out are explicit and are the only host
/// synchronization points.
#[derive(Debug)]
pub struct Buffer<T> {
    data: Box<[T]>,
}

impl<T: Copy> Buffer<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn fill(&mut self, value: T) {
        for x in self.data.iter_mut() {
            *x = value;
        }
    }

    /// Copy `src` into the leading elements of the buffer.
    pub fn write(&mut self, src: &[T]) {
        assert!(src.len() <= self.data.len());
        self.data[..src.len()].copy_from_slice(src);
    }

    /// Copy the leading elements of the buffer into `dst`.
    pub fn read(&self, dst: &mut [T]) {
        assert!(dst.len() <= self.data.len());
        dst.copy_from_slice(&self.data[..dst.len()]);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayverb_common::dispatch::SerialQueue;

    #[test]
    fn round_trip() {
        let device = Device::new(SerialQueue);
        let mut buffer = device.buffer(8, 0i32).unwrap();
        buffer.write(&[1, 2, 3]);

        let mut out = [0i32; 8];
        buffer.read(&mut out);
        assert_eq!(out, [1, 2, 3, 0, 0, 0, 0, 0]);

        buffer.fill(7);
        let mut out = [0i32; 4];
        buffer.read(&mut out);
        assert_eq!(out, [7; 4]);
    }

    #[test]
    fn upload() {
        let device = Device::new(SerialQueue);
        let buffer = device.buffer_from(&[1.0f32, 2.0, 3.0]).unwrap();
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0]);
    }
}
