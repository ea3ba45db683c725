//! Testing utilities for processing chains and buffers.
//!
//! - **Assertions**: compare outputs with expected sequences, in order or as
//!   multisets (for unordered pipelines).
//! - [`Gather`]: drain a blocking value stream on a background thread while
//!   the test keeps feeding the producer side.
//!
//! # Example
//!
//! ```
//! use orderflow::testing::*;
//! use orderflow::{Entry, LogContext, ProcessingBuffer};
//!
//! let buffer = ProcessingBuffer::new_ordered(LogContext::default());
//! let gather = Gather::start(buffer.iter());
//! buffer.add(Entry::top(1, "b"));
//! buffer.add(Entry::top(0, "a"));
//! buffer.close();
//! assert_collections_equal(&gather.finish(), &["a", "b"]);
//! ```

pub mod assertions;

pub use assertions::*;

use std::thread::{self, JoinHandle};

/// Collects a blocking value stream on a background thread.
#[derive(Debug)]
pub struct Gather<T> {
    handle: JoinHandle<Vec<T>>,
}

impl<T: Send + 'static> Gather<T> {
    /// Start draining `values`.
    pub fn start<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let it = values.into_iter();
        Self {
            handle: thread::spawn(move || it.collect()),
        }
    }

    /// Wait until the stream ends and return everything it yielded.
    ///
    /// # Panics
    ///
    /// Panics if the collecting thread panicked.
    pub fn finish(self) -> Vec<T> {
        match self.handle.join() {
            Ok(v) => v,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}
