//! Execution of chain steps against concrete data.
//!
//! A [`ProcessingResult`] is the state of one pipeline run after some
//! number of steps. It is in one of three modes:
//!
//! - **synchronous**: every step fully materializes its output before the
//!   next one starts;
//! - **asynchronous**: every step materializes on a background thread and
//!   readers block until it is ready;
//! - **parallel**: data flows through [`ProcessingBuffer`]s and every
//!   element of a step is processed as its own unit on a [`ProcessorPool`].
//!
//! Results are consumed by value: each step returns a new result.

mod parallel;

use crate::buffer::{BufferKind, ProcessingBuffer};
use crate::chain::ProcessChain;
use crate::data::{Element, Input, Slice, Values};
use crate::logging::LogContext;
use crate::operation::{ExplodeOp, FilterOp, MapOp, Operation, TryMapOp, contained, guarded};
use crate::pool::ProcessorPool;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) use parallel::entries_from_iterable;

/// A stage output computed on a background thread.
struct Deferred<T> {
    slot: Arc<(Mutex<Option<Input<T>>>, Condvar)>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Element> Deferred<T> {
    fn ready(input: Input<T>) -> Self {
        Self {
            slot: Arc::new((Mutex::new(Some(input)), Condvar::new())),
        }
    }

    /// Compute the output on a background thread. If `compute` panics the
    /// slot is filled with an empty output so readers are not left waiting.
    fn spawn<F>(log: &LogContext, compute: F) -> Self
    where
        F: FnOnce() -> Input<T> + Send + 'static,
    {
        let d = Self {
            slot: Arc::new((Mutex::new(None), Condvar::new())),
        };
        let target = d.clone();
        parallel::spawn_driver("orderflow-async", log, move || {
            let data = contained("asynchronous step", compute).unwrap_or_else(|| Input::from(Slice::new(Vec::new())));
            let (lock, ready) = &*target.slot;
            *lock.lock() = Some(data);
            ready.notify_all();
        });
        d
    }

    /// Block until the stage output is available.
    fn wait(&self) -> Input<T> {
        let (lock, ready) = &*self.slot;
        let mut data = lock.lock();
        loop {
            if let Some(input) = data.as_ref() {
                return input.clone();
            }
            ready.wait(&mut data);
        }
    }
}

enum Mode<T> {
    Synchronous(Input<T>),
    Asynchronous(Deferred<T>),
    Parallel {
        buffer: ProcessingBuffer<T>,
        pool: ProcessorPool,
    },
}

/// The (possibly still running) outcome of processing data through steps.
pub struct ProcessingResult<T> {
    mode: Mode<T>,
    log: LogContext,
}

impl<T: Element> ProcessingResult<T> {
    /// Start a synchronous run over `input`.
    pub fn new(input: impl Into<Input<T>>, log: LogContext) -> Self {
        Self {
            mode: Mode::Synchronous(input.into()),
            log,
        }
    }

    fn with_mode<O>(&self, mode: Mode<O>) -> ProcessingResult<O> {
        ProcessingResult {
            mode,
            log: self.log.clone(),
        }
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.mode, Mode::Parallel { .. })
    }

    pub fn is_asynchronous(&self) -> bool {
        matches!(self.mode, Mode::Asynchronous(_))
    }

    /// The order values are yielded in, if this result is parallel.
    pub fn buffer_kind(&self) -> Option<BufferKind> {
        match &self.mode {
            Mode::Parallel { buffer, .. } => Some(buffer.kind()),
            _ => None,
        }
    }

    /// Apply a per-element operation in the current mode.
    pub fn process<O: Element>(self, op: Arc<dyn Operation<T, O>>) -> ProcessingResult<O> {
        match &self.mode {
            Mode::Synchronous(input) => {
                let data = apply_all(input.values(), op.as_ref());
                self.with_mode(Mode::Synchronous(Input::from(data)))
            }
            Mode::Asynchronous(upstream) => {
                let upstream = upstream.clone();
                let d = Deferred::spawn(&self.log, move || Input::from(apply_all(upstream.wait().values(), op.as_ref())));
                self.with_mode(Mode::Asynchronous(d))
            }
            Mode::Parallel { buffer, pool } => {
                let out = parallel::step(buffer, pool, op, &self.log);
                self.with_mode(Mode::Parallel {
                    buffer: out,
                    pool: pool.clone(),
                })
            }
        }
    }

    /// Replace every element by the elements `f` returns for it.
    ///
    /// In parallel mode the produced elements keep their position beneath
    /// the parent element.
    pub fn explode<O, F>(self, f: F) -> ProcessingResult<O>
    where
        O: Element,
        F: Fn(&T) -> Vec<O> + Send + Sync + 'static,
    {
        self.process(Arc::new(ExplodeOp::<T, O, F>(f, PhantomData)))
    }

    pub fn map<O, F>(self, f: F) -> ProcessingResult<O>
    where
        O: Element,
        F: Fn(&T) -> O + Send + Sync + 'static,
    {
        self.process(Arc::new(MapOp::<T, O, F>(f, PhantomData)))
    }

    pub fn filter<F>(self, f: F) -> ProcessingResult<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.process(Arc::new(FilterOp::<T, F>(f, PhantomData)))
    }

    /// Map with a fallible function; elements whose mapping fails are dropped.
    pub fn try_map<O, E, F>(self, f: F) -> ProcessingResult<O>
    where
        O: Element,
        E: Display + 'static,
        F: Fn(&T) -> Result<O, E> + Send + Sync + 'static,
    {
        self.process(Arc::new(TryMapOp::<T, O, E, F>(f, PhantomData)))
    }

    /// Stable sort of all elements. Drains the previous step first.
    pub fn sort<F>(self, cmp: F) -> ProcessingResult<T>
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.transform(move |values| {
            let mut v: Vec<T> = values.collect();
            v.sort_by(|a, b| cmp(a, b));
            v
        })
    }

    /// Rewrite the complete element sequence at once.
    ///
    /// Drains the previous step first. In parallel mode the output is
    /// republished in order. If `f` panics the panic is logged and the
    /// step yields no elements, in every mode.
    pub fn transform<O, F>(self, f: F) -> ProcessingResult<O>
    where
        O: Element,
        F: FnOnce(Values<T>) -> Vec<O> + Send + 'static,
    {
        match &self.mode {
            Mode::Synchronous(input) => {
                let values = input.values();
                let data = Slice::new(contained("transform", move || f(values)).unwrap_or_default());
                self.with_mode(Mode::Synchronous(Input::from(data)))
            }
            Mode::Asynchronous(upstream) => {
                let upstream = upstream.clone();
                let d = Deferred::spawn(&self.log, move || Input::from(Slice::new(f(upstream.wait().values()))));
                self.with_mode(Mode::Asynchronous(d))
            }
            Mode::Parallel { buffer, pool } => {
                let out = parallel::barrier(buffer, &self.log, f);
                self.with_mode(Mode::Parallel {
                    buffer: out,
                    pool: pool.clone(),
                })
            }
        }
    }

    /// Continue in parallel mode on `pool`.
    ///
    /// Plain input is indexed in iteration order; a parallel result only
    /// switches pools.
    pub fn with_pool(self, pool: ProcessorPool) -> ProcessingResult<T> {
        tracing::debug!(capacity = pool.capacity(), "entering parallel mode");
        let buffer = match self.mode {
            Mode::Parallel { buffer, .. } => buffer,
            Mode::Synchronous(Input::Entries(buffer)) => buffer,
            Mode::Synchronous(Input::Values(data)) => entries_from_iterable(move || data.values(), &self.log),
            Mode::Asynchronous(upstream) => entries_from_iterable(move || upstream.wait().values(), &self.log),
        };
        ProcessingResult {
            mode: Mode::Parallel { buffer, pool },
            log: self.log,
        }
    }

    /// Continue in parallel mode on a new pool of `n` workers (`0` = CPU count).
    pub fn parallel(self, n: usize) -> ProcessingResult<T> {
        self.with_pool(ProcessorPool::new(n))
    }

    /// Yield elements in completion order from here on.
    ///
    /// Only affects parallel results; sequential modes are already ordered.
    pub fn unordered(self) -> ProcessingResult<T> {
        match self.mode {
            Mode::Parallel { buffer, pool } => ProcessingResult {
                mode: Mode::Parallel {
                    buffer: buffer.unordered(),
                    pool,
                },
                log: self.log,
            },
            mode => ProcessingResult { mode, log: self.log },
        }
    }

    /// Continue with synchronous steps.
    pub fn synchronously(self) -> ProcessingResult<T> {
        let input = match self.mode {
            Mode::Synchronous(input) => input,
            Mode::Asynchronous(upstream) => upstream.wait(),
            Mode::Parallel { buffer, .. } => Input::Entries(buffer),
        };
        ProcessingResult {
            mode: Mode::Synchronous(input),
            log: self.log,
        }
    }

    /// Continue with steps computed on background threads.
    pub fn asynchronously(self) -> ProcessingResult<T> {
        let mode = match self.mode {
            Mode::Synchronous(input) => Mode::Asynchronous(Deferred::ready(input)),
            Mode::Parallel { buffer, .. } => Mode::Asynchronous(Deferred::ready(Input::Entries(buffer))),
            mode @ Mode::Asynchronous(_) => mode,
        };
        ProcessingResult { mode, log: self.log }
    }

    /// Continue this run with the steps of `chain`.
    pub fn apply<O: Element>(self, chain: &ProcessChain<T, O>) -> ProcessingResult<O> {
        chain.process_result(self)
    }

    /// A blocking iterator over the values produced so far and still to come.
    pub fn iter(&self) -> Values<T> {
        match &self.mode {
            Mode::Synchronous(input) => input.values(),
            Mode::Asynchronous(upstream) => upstream.wait().values(),
            Mode::Parallel { buffer, .. } => Box::new(buffer.iter()),
        }
    }

    /// Wait for all values and collect them.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Wait for all values and materialize them as an indexable slice,
    /// for consumers that need the length up front.
    pub fn as_slice(&self) -> Slice<T> {
        Slice::new(self.to_vec())
    }
}

impl<T: Element> IntoIterator for ProcessingResult<T> {
    type Item = T;
    type IntoIter = Values<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Element> IntoIterator for &ProcessingResult<T> {
    type Item = T;
    type IntoIter = Values<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn apply_all<I, O>(values: Values<I>, op: &dyn Operation<I, O>) -> Slice<O>
where
    I: Element,
    O: Element,
{
    Slice::new(values.flat_map(|v| guarded(op, &v)).collect())
}
