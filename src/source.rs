//! Incrementally fed pipeline input.

use crate::buffer::ProcessingBuffer;
use crate::data::Element;
use crate::entry::Entry;
use crate::error::ProcessingError;
use crate::logging::LogContext;
use parking_lot::Mutex;
use std::sync::Arc;

/// A producer handle feeding elements into an ordered buffer.
///
/// Elements get consecutive top-level indices in the order they are added.
/// Chains can start processing the source before it is closed; consumers
/// block until the next element arrives or the source is closed.
///
/// Clones share the same source.
#[derive(Clone, Debug)]
pub struct IncrementalProcessingSource<T> {
    buffer: ProcessingBuffer<T>,
    next: Arc<Mutex<Option<usize>>>,
}

impl<T: Element> IncrementalProcessingSource<T> {
    pub fn new(log: LogContext) -> Self {
        Self {
            buffer: ProcessingBuffer::new_ordered(log),
            next: Arc::new(Mutex::new(Some(0))),
        }
    }

    /// Append an element.
    pub fn add(&self, value: T) -> Result<(), ProcessingError> {
        let mut next = self.next.lock();
        let Some(i) = *next else {
            return Err(ProcessingError::SourceClosed);
        };
        self.buffer.add(Entry::top(i, value));
        *next = Some(i + 1);
        Ok(())
    }

    /// Append all elements of `values`, stopping at the first error.
    pub fn add_all(&self, values: impl IntoIterator<Item = T>) -> Result<(), ProcessingError> {
        values.into_iter().try_for_each(|v| self.add(v))
    }

    /// Signal that no further elements follow.
    pub fn close(&self) -> Result<(), ProcessingError> {
        let mut next = self.next.lock();
        match next.take() {
            Some(n) => {
                tracing::trace!(elements = n, "source closed");
                self.buffer.close();
                Ok(())
            }
            None => Err(ProcessingError::AlreadyClosed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.next.lock().is_none()
    }

    /// The buffer chains read the elements from.
    pub fn buffer(&self) -> &ProcessingBuffer<T> {
        &self.buffer
    }
}

impl<T: Element> Default for IncrementalProcessingSource<T> {
    fn default() -> Self {
        Self::new(LogContext::default())
    }
}
