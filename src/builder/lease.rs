//! Worker leases.
//!
//! A lease admits one compiler process. The driver holds a lease only while
//! the process runs; [`WorkerLease`] releases it when dropped, whatever the
//! outcome.

use std::sync::{Condvar, Mutex, PoisonError};

/// Concurrency admission for compiler processes.
pub trait WorkerLeaseService: Send + Sync {
    /// Block until a lease is available and take it.
    fn acquire_lease(&self);

    /// Return a lease taken with [`acquire_lease`](Self::acquire_lease).
    fn release_lease(&self);
}

/// A held lease. Released on drop.
pub struct WorkerLease<'a> {
    service: &'a dyn WorkerLeaseService,
}

impl<'a> WorkerLease<'a> {
    /// Block until a lease is available.
    pub fn acquire(service: &'a dyn WorkerLeaseService) -> Self {
        service.acquire_lease();
        WorkerLease { service }
    }
}

impl Drop for WorkerLease<'_> {
    fn drop(&mut self) {
        self.service.release_lease();
    }
}

/// Counting lease pool.
#[derive(Debug)]
pub struct WorkerLeases {
    max: usize,
    in_use: Mutex<usize>,
    available: Condvar,
}

impl WorkerLeases {
    /// Create a pool of `max` leases (at least one).
    pub fn new(max: usize) -> Self {
        WorkerLeases {
            max: max.max(1),
            in_use: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// One lease per available CPU.
    pub fn per_cpu() -> Self {
        Self::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        )
    }

    /// Maximum number of concurrent leases.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Number of leases currently held.
    pub fn in_use(&self) -> usize {
        *self.in_use.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkerLeaseService for WorkerLeases {
    fn acquire_lease(&self) {
        let mut in_use = self.in_use.lock().unwrap_or_else(PoisonError::into_inner);
        while *in_use >= self.max {
            in_use = self
                .available
                .wait(in_use)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *in_use += 1;
    }

    fn release_lease(&self) {
        let mut in_use = self.in_use.lock().unwrap_or_else(PoisonError::into_inner);
        *in_use = in_use.saturating_sub(1);
        self.available.notify_one();
    }
}
