//! Monitor-protected holding areas for entries between pipeline stages.
//!
//! A [`ProcessingBuffer`] collects entries produced concurrently by worker
//! units and hands them to consumers through blocking iterators. It comes
//! in two flavors:
//!
//! - **simple**: values are yielded in submission order (first finished,
//!   first out);
//! - **ordered**: values are yielded in [`Index`](crate::Index) order,
//!   reconstructed from out-of-order completions (see [`ordered`]).
//!
//! All state of one buffer is guarded by a single mutex. Two condition
//! variables signal consumers: `frontier` whenever the ordered frontier
//! advances, `arrivals` on every added entry. Both fire on close.

mod ordered;

use crate::data::{Element, Iterable, Values};
use crate::entry::Entry;
use crate::logging::LogContext;
use ordered::OrderedList;
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::Serialize;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Which order a buffer (view) yields its values in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    Simple,
    Ordered,
}

struct State<T> {
    entries: Vec<Entry<T>>,
    order: Option<OrderedList>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    frontier: Condvar,
    arrivals: Condvar,
    log: LogContext,
}

/// A handle to a shared entry buffer. Cloning shares the buffer.
pub struct ProcessingBuffer<T> {
    shared: Arc<Shared<T>>,
    view: BufferKind,
}

impl<T> Clone for ProcessingBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            view: self.view,
        }
    }
}

impl<T> Debug for ProcessingBuffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let st = self.shared.state.lock();
        f.debug_struct("ProcessingBuffer")
            .field("view", &self.view)
            .field("len", &st.entries.len())
            .field("closed", &st.closed)
            .finish()
    }
}

impl<T: Element> ProcessingBuffer<T> {
    pub fn new(kind: BufferKind, log: LogContext) -> Self {
        let order = match kind {
            BufferKind::Simple => None,
            BufferKind::Ordered => Some(OrderedList::new()),
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    entries: Vec::new(),
                    order,
                    closed: false,
                }),
                frontier: Condvar::new(),
                arrivals: Condvar::new(),
                log,
            }),
            view: kind,
        }
    }

    pub fn new_simple(log: LogContext) -> Self {
        Self::new(BufferKind::Simple, log)
    }

    pub fn new_ordered(log: LogContext) -> Self {
        Self::new(BufferKind::Ordered, log)
    }

    /// The order this handle yields values in.
    pub fn kind(&self) -> BufferKind {
        self.view
    }

    /// A FIFO view of the same storage.
    #[must_use]
    pub fn unordered(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            view: BufferKind::Simple,
        }
    }

    /// Add an entry and wake the consumers it unblocks.
    ///
    /// Returns whether the ordered frontier advanced; simple buffers always
    /// report `true`.
    ///
    /// # Panics
    ///
    /// Panics when the entry's index violates its declared bound while the
    /// buffer keeps index order. Entries built with
    /// [`EntryBuilder`](crate::EntryBuilder) never do.
    pub fn add(&self, entry: Entry<T>) -> bool {
        let advanced = {
            let mut guard = self.shared.state.lock();
            let st = &mut *guard;
            if st.order.is_some() {
                if let Err(err) = entry.index.validate(entry.max_index) {
                    drop(guard);
                    panic!("{err}");
                }
            }
            tracing::trace!(
                realm = self.shared.log.realm(),
                index = %entry.index,
                valid = entry.valid,
                sub = entry.max_sub,
                "add entry"
            );
            let id = st.entries.len();
            st.entries.push(entry);
            match st.order.as_mut() {
                Some(order) => order.insert(&st.entries, id),
                None => true,
            }
        };
        self.shared.arrivals.notify_all();
        if advanced {
            self.shared.frontier.notify_all();
        }
        advanced
    }

    /// Reopen a closed buffer for further additions.
    pub fn open(&self) {
        self.shared.state.lock().closed = false;
    }

    /// Signal that no more entries will be added.
    ///
    /// An ordered buffer exposes every entry linked so far, even if gaps
    /// in the index sequence were never filled.
    pub fn close(&self) {
        {
            let mut guard = self.shared.state.lock();
            let st = &mut *guard;
            if let Some(order) = st.order.as_mut() {
                order.close(&st.entries);
            }
            st.closed = true;
        }
        self.shared.frontier.notify_all();
        self.shared.arrivals.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of entries added so far, tombstones included.
    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at position `i` of this view, if that entry is valid.
    pub fn get(&self, i: usize) -> Option<T> {
        let st = self.shared.state.lock();
        let id = match (self.view, st.order.as_ref()) {
            (BufferKind::Ordered, Some(order)) => order.nth(i)?,
            _ => i,
        };
        st.entries.get(id)?.valid_value().cloned()
    }

    /// Blocking iterator over the valid values of this view.
    pub fn iter(&self) -> ValueIter<T> {
        let cursor = match self.view {
            BufferKind::Ordered => Cursor::Ordered(None),
            BufferKind::Simple => Cursor::Fifo(0),
        };
        ValueIter {
            shared: Arc::clone(&self.shared),
            cursor,
        }
    }

    /// Blocking iterator over all raw entries in submission order.
    ///
    /// This is what the next pipeline stage consumes: tombstones and
    /// explosion placeholders are needed there to keep the index space intact.
    pub fn processing_iter(&self) -> EntryIter<T> {
        EntryIter {
            shared: Arc::clone(&self.shared),
            pos: 0,
        }
    }
}

impl<T: Element> Iterable<T> for ProcessingBuffer<T> {
    fn values(&self) -> Values<T> {
        Box::new(self.iter())
    }
}

impl<T: Element> IntoIterator for &ProcessingBuffer<T> {
    type Item = T;
    type IntoIter = ValueIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    /// Number of entries consumed in submission order.
    Fifo(usize),
    /// Last consumed node of the ordered list (`None` = none yet).
    Ordered(Option<usize>),
}

enum Scan<T> {
    Ready(T),
    Available,
    Pending,
    Exhausted,
}

/// Iterator over the valid values of a buffer view.
///
/// `next` blocks until the next value is available or the buffer is closed.
pub struct ValueIter<T> {
    shared: Arc<Shared<T>>,
    cursor: Cursor,
}

impl<T: Element> ValueIter<T> {
    fn scan(&mut self, st: &State<T>, consume: bool) -> Scan<T> {
        loop {
            let candidate = match self.cursor {
                Cursor::Fifo(pos) => st.entries.get(pos).map(|e| (Cursor::Fifo(pos + 1), e)),
                Cursor::Ordered(current) => match st.order.as_ref() {
                    Some(order) if current != order.frontier() => order
                        .successor(current)
                        .map(|n| (Cursor::Ordered(Some(n)), &st.entries[n])),
                    _ => None,
                },
            };
            let Some((cursor, entry)) = candidate else {
                return if st.closed { Scan::Exhausted } else { Scan::Pending };
            };
            match entry.valid_value() {
                None => self.cursor = cursor,
                Some(v) if consume => {
                    self.cursor = cursor;
                    return Scan::Ready(v.clone());
                }
                Some(_) => return Scan::Available,
            }
        }
    }

    fn wait(&self, guard: &mut MutexGuard<'_, State<T>>) {
        match self.cursor {
            Cursor::Fifo(_) => self.shared.arrivals.wait(guard),
            Cursor::Ordered(_) => self.shared.frontier.wait(guard),
        }
    }

    /// Blocks until a next value is available (`true`) or the buffer is
    /// closed and drained (`false`).
    pub fn has_next(&mut self) -> bool {
        let shared = Arc::clone(&self.shared);
        let mut guard = shared.state.lock();
        loop {
            match self.scan(&guard, false) {
                Scan::Ready(_) | Scan::Available => return true,
                Scan::Exhausted => return false,
                Scan::Pending => self.wait(&mut guard),
            }
        }
    }

    /// Reports whether a next value is available right now, without
    /// blocking.
    pub fn check_next(&mut self) -> bool {
        let shared = Arc::clone(&self.shared);
        let guard = shared.state.lock();
        matches!(self.scan(&guard, false), Scan::Ready(_) | Scan::Available)
    }
}

impl<T: Element> Iterator for ValueIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let shared = Arc::clone(&self.shared);
        let mut guard = shared.state.lock();
        loop {
            match self.scan(&guard, true) {
                Scan::Ready(v) => return Some(v),
                Scan::Exhausted => return None,
                Scan::Available => unreachable!("consuming scan never reports availability"),
                Scan::Pending => self.wait(&mut guard),
            }
        }
    }
}

/// Iterator over the raw entries of a buffer in submission order.
pub struct EntryIter<T> {
    shared: Arc<Shared<T>>,
    pos: usize,
}

impl<T: Element> Iterator for EntryIter<T> {
    type Item = Entry<T>;

    fn next(&mut self) -> Option<Entry<T>> {
        let shared = Arc::clone(&self.shared);
        let mut guard = shared.state.lock();
        loop {
            if let Some(e) = guard.entries.get(self.pos) {
                self.pos += 1;
                return Some(e.clone());
            }
            if guard.closed {
                return None;
            }
            shared.arrivals.wait(&mut guard);
        }
    }
}
