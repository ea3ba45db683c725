//! Error types for contract violations in the processing engine.
//!
//! Element-level failures never show up here: a failed or rejected element
//! becomes an invalid entry and simply disappears from the output.

use crate::index::Index;
use thiserror::Error;

/// Errors raised by entry construction and by producers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    /// A nested index was built without declaring the bound of its level.
    #[error("nested index {index} requires a max index")]
    MissingMaxIndex { index: Index },

    /// The deepest component of an index exceeds its declared bound.
    #[error("index {index} out of bounds: last component >= max {max}")]
    IndexOutOfBounds { index: Index, max: usize },

    /// An element was added to a source that has already been closed.
    #[error("source is closed, no further elements may be added")]
    SourceClosed,

    /// A source was closed twice.
    #[error("source already closed")]
    AlreadyClosed,
}
