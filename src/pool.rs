//! Bounded admission of concurrent work units.
//!
//! A [`ProcessorPool`] limits how many units of work of a pipeline run at
//! the same time. The submitting driver calls [`ProcessorPool::request`]
//! before each [`ProcessorPool::exec`]; `request` blocks while the pool is
//! saturated, which throttles the driver to the pool's capacity
//! (backpressure, never an error). Units run on rayon worker threads.

use anyhow::{Context, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Sizing of a [`ProcessorPool`].
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum number of concurrently running units (`0` = CPU count).
    pub workers: usize,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            thread_name: "orderflow-worker".to_string(),
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Effective number of concurrent units.
    #[must_use]
    pub fn capacity(&self) -> usize {
        if self.workers == 0 { num_cpus::get().max(1) } else { self.workers }
    }
}

struct Inner {
    capacity: usize,
    admitted: Mutex<usize>,
    room: Condvar,
    idle: Condvar,
    workers: Option<rayon::ThreadPool>,
}

/// A shareable admission gate plus the workers executing admitted units.
#[derive(Clone)]
pub struct ProcessorPool {
    inner: Arc<Inner>,
}

impl Debug for ProcessorPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("ProcessorPool")
            .field("capacity", &self.inner.capacity)
            .field("admitted", &*self.inner.admitted.lock())
            .field("dedicated_workers", &self.inner.workers.is_some())
            .finish()
    }
}

/// Frees the slot of one admitted unit when dropped, also on unwind.
struct Slot(ProcessorPool);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl ProcessorPool {
    /// A pool admitting at most `n` concurrent units (`0` = CPU count).
    pub fn new(n: usize) -> Self {
        Self::with_config(PoolConfig::with_workers(n))
    }

    /// Build a pool with dedicated worker threads.
    ///
    /// If the worker threads cannot be created the failure is logged and
    /// units run on rayon's global pool, still bounded by the capacity.
    pub fn with_config(config: PoolConfig) -> Self {
        let workers = match Self::build_workers(&config) {
            Ok(w) => Some(w),
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "falling back to the global rayon pool");
                None
            }
        };
        Self::from_parts(config.capacity(), workers)
    }

    /// Like [`ProcessorPool::with_config`], but fails instead of falling back.
    pub fn try_with_config(config: PoolConfig) -> Result<Self> {
        let workers = Self::build_workers(&config)?;
        Ok(Self::from_parts(config.capacity(), Some(workers)))
    }

    fn build_workers(config: &PoolConfig) -> Result<rayon::ThreadPool> {
        let prefix = config.thread_name.clone();
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.capacity())
            .thread_name(move |i| format!("{prefix}-{i}"))
            .panic_handler(|_| tracing::error!("work unit panicked outside its guard"))
            .build()
            .with_context(|| format!("building {} processing workers", config.capacity()))
    }

    fn from_parts(capacity: usize, workers: Option<rayon::ThreadPool>) -> Self {
        tracing::debug!(capacity, "processor pool created");
        Self {
            inner: Arc::new(Inner {
                capacity,
                admitted: Mutex::new(0),
                room: Condvar::new(),
                idle: Condvar::new(),
                workers,
            }),
        }
    }

    /// Maximum number of concurrently admitted units.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of units currently admitted and not yet finished.
    pub fn admitted(&self) -> usize {
        *self.inner.admitted.lock()
    }

    /// Block until a slot is free, then reserve it.
    ///
    /// The reserved slot belongs to the next [`ProcessorPool::exec`], which
    /// frees it when its task finishes. To join all submitted tasks use
    /// [`ProcessorPool::wait_idle`].
    pub fn request(&self) {
        let mut admitted = self.inner.admitted.lock();
        while *admitted >= self.inner.capacity {
            self.inner.room.wait(&mut admitted);
        }
        *admitted += 1;
    }

    fn release(&self) {
        let mut admitted = self.inner.admitted.lock();
        *admitted = admitted.saturating_sub(1);
        self.inner.room.notify_one();
        if *admitted == 0 {
            self.inner.idle.notify_all();
        }
    }

    /// Run `task` on a worker, occupying the slot reserved by the preceding
    /// [`ProcessorPool::request`] until it finishes.
    pub fn exec<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let slot = Slot(self.clone());
        let unit = move || {
            let _slot = slot;
            task();
        };
        match &self.inner.workers {
            Some(workers) => workers.spawn(unit),
            None => rayon::spawn(unit),
        }
    }

    /// Block until no admitted unit is outstanding.
    pub fn wait_idle(&self) {
        let mut admitted = self.inner.admitted.lock();
        while *admitted > 0 {
            self.inner.idle.wait(&mut admitted);
        }
    }
}

impl Default for ProcessorPool {
    fn default() -> Self {
        Self::with_config(PoolConfig::default())
    }
}
