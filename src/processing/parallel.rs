//! Parallel stage execution over processing buffers.
//!
//! A parallel step owns one driver thread that reads the raw entries of the
//! upstream buffer, admits one work unit per entry through the
//! [`ProcessorPool`], and closes the destination buffer once every unit has
//! finished.

use crate::buffer::ProcessingBuffer;
use crate::data::{Element, Values};
use crate::entry::Entry;
use crate::logging::LogContext;
use crate::operation::{Operation, Outcome, contained, guarded};
use crate::pool::ProcessorPool;
use crossbeam_utils::sync::WaitGroup;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

/// Run `job` on a named background thread inside the pipeline's span.
///
/// If no thread can be spawned the failure is logged and `job` runs on the
/// calling thread.
pub(crate) fn spawn_driver<F>(name: &str, log: &LogContext, job: F)
where
    F: FnOnce() + Send + 'static,
{
    let slot = Arc::new(Mutex::new(Some(job)));
    let span = log.span();
    let remote = Arc::clone(&slot);
    let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
        let _entered = span.entered();
        if let Some(job) = remote.lock().take() {
            job();
        }
    });
    if let Err(err) = spawned {
        tracing::error!(thread = name, error = %err, "cannot spawn driver thread, running inline");
        let job = slot.lock().take();
        if let Some(job) = job {
            job();
        }
    }
}

/// Feed the values produced by `produce` into a fresh ordered buffer,
/// tagging them with consecutive top-level indices.
///
/// The buffer is closed even when `produce` panics; readers then see the
/// values fed before the panic.
pub(crate) fn entries_from_iterable<T, F>(produce: F, log: &LogContext) -> ProcessingBuffer<T>
where
    T: Element,
    F: FnOnce() -> Values<T> + Send + 'static,
{
    let out = ProcessingBuffer::new_ordered(log.clone());
    let target = out.clone();
    spawn_driver("orderflow-source", log, move || {
        let fed = contained("indexing", || {
            let mut n = 0;
            for (i, v) in produce().enumerate() {
                target.add(Entry::top(i, v));
                n = i + 1;
            }
            n
        });
        if let Some(n) = fed {
            tracing::trace!(entries = n, "indexed input");
        }
        target.close();
    });
    out
}

/// Drain the values of `upstream`, rewrite them as a whole and republish
/// the result in a fresh ordered buffer.
pub(crate) fn barrier<T, O, F>(upstream: &ProcessingBuffer<T>, log: &LogContext, rewrite: F) -> ProcessingBuffer<O>
where
    T: Element,
    O: Element,
    F: FnOnce(Values<T>) -> Vec<O> + Send + 'static,
{
    let values: Values<T> = Box::new(upstream.iter());
    entries_from_iterable(move || Box::new(rewrite(values).into_iter()), log)
}

/// Apply `op` to every entry of `upstream` on the pool.
///
/// The destination buffer keeps the ordering mode of the upstream view.
pub(crate) fn step<I, O>(
    upstream: &ProcessingBuffer<I>,
    pool: &ProcessorPool,
    op: Arc<dyn Operation<I, O>>,
    log: &LogContext,
) -> ProcessingBuffer<O>
where
    I: Element,
    O: Element,
{
    let out = ProcessingBuffer::new(upstream.kind(), log.clone());
    let entries = upstream.processing_iter();
    let target = out.clone();
    let pool = pool.clone();
    tracing::debug!(step = %op.kind(), kind = ?upstream.kind(), capacity = pool.capacity(), "starting parallel step");
    spawn_driver("orderflow-step", log, move || {
        let done = WaitGroup::new();
        for entry in entries {
            pool.request();
            let unit = Unit {
                op: Arc::clone(&op),
                out: target.clone(),
                _done: done.clone(),
            };
            pool.exec(move || unit.run(entry));
        }
        done.wait();
        target.close();
    });
    out
}

/// One admitted piece of work: process a single entry into `out`.
struct Unit<I, O> {
    op: Arc<dyn Operation<I, O>>,
    out: ProcessingBuffer<O>,
    _done: WaitGroup,
}

impl<I: Element, O: Element> Unit<I, O> {
    fn run(self, entry: Entry<I>) {
        let Some(value) = entry.valid_value() else {
            self.out.add(entry.invalidated());
            return;
        };
        let index = entry.index.clone();
        match guarded(self.op.as_ref(), value) {
            Outcome::Empty => {
                self.out.add(Entry {
                    max_sub: entry.max_sub,
                    ..Entry::tombstone(index, entry.max_index)
                });
            }
            Outcome::One(v) => {
                self.out.add(Entry {
                    index,
                    max_index: entry.max_index,
                    max_sub: entry.max_sub,
                    valid: true,
                    value: Some(v),
                });
            }
            Outcome::Many(values) => {
                let n = values.len();
                self.out.add(Entry {
                    index: index.clone(),
                    max_index: entry.max_index,
                    max_sub: n,
                    valid: false,
                    value: None,
                });
                for (i, v) in values.into_iter().enumerate() {
                    self.out.add(Entry::builder(index.child(i), v).max_index(n).build());
                }
            }
        }
    }
}
