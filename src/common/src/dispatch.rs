//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Generalization of data-parallel dispatch queue systems.
use rayon::iter::{IntoParallelIterator, ParallelIterator};

struct SendPtr<T>(*mut T);

unsafe impl<T> Sync for SendPtr<T> {}
unsafe impl<T> Send for SendPtr<T> {}

/// Generalization of a dispatch queue.
///
/// Every work item submitted through `apply` is independent; implementations
/// may run them in any order and with any degree of parallelism, but `apply`
/// must not return until all of them have completed.
pub unsafe trait Queue: Send + Sync {
    fn apply<F>(&self, num_iterations: usize, work: F)
    where
        F: Sync + Fn(usize);

    fn foreach<T, F>(&self, slice: &mut [T], work: F)
    where
        F: Sync + Fn(usize, &mut T),
        T: Send,
    {
        let ptr = SendPtr(slice.as_mut_ptr());
        self.apply(slice.len(), |i| {
            work(i, unsafe { &mut *ptr.0.add(i) });
        });
    }

    fn hardware_concurrency(&self) -> usize;
}

/// Serial implementation of `Queue`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialQueue;

unsafe impl Queue for SerialQueue {
    fn apply<F>(&self, num_iterations: usize, work: F)
    where
        F: Sync + Fn(usize),
    {
        for i in 0..num_iterations {
            work(i);
        }
    }

    fn hardware_concurrency(&self) -> usize {
        1
    }
}

/// `Queue` that runs work items on the global thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentQueue;

unsafe impl Queue for ConcurrentQueue {
    fn apply<F>(&self, num_iterations: usize, work: F)
    where
        F: Sync + Fn(usize),
    {
        (0..num_iterations).into_par_iter().for_each(|i| work(i));
    }

    fn hardware_concurrency(&self) -> usize {
        rayon::current_num_threads()
    }
}
