//! Element bounds and the value-level data access used between stages.

use crate::buffer::ProcessingBuffer;
use crate::source::IncrementalProcessingSource;
use std::sync::Arc;

/// Bound for every element flowing through a pipeline.
///
/// Elements are handed between threads and may be read by several
/// iterators of the same buffer, hence `Clone + Send + Sync`.
pub trait Element: 'static + Send + Sync + Clone {}
impl<T> Element for T where T: 'static + Send + Sync + Clone {}

/// An owned, possibly blocking, stream of values.
pub type Values<T> = Box<dyn Iterator<Item = T> + Send>;

/// Something that can hand out any number of independent value streams.
pub trait Iterable<T>: Send + Sync {
    fn values(&self) -> Values<T>;
}

/// Shared, immutable, indexable sequence of materialized values.
#[derive(Debug)]
pub struct Slice<T>(Arc<Vec<T>>);

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        Slice(Arc::clone(&self.0))
    }
}

impl<T: Element> Slice<T> {
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Slice(Arc::new(data))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.0.get(i)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.0.as_ref().clone()
    }
}

impl<T: Element> Iterable<T> for Slice<T> {
    fn values(&self) -> Values<T> {
        let data = Arc::clone(&self.0);
        Box::new((0..data.len()).map(move |i| data[i].clone()))
    }
}

impl<T: Element> From<Vec<T>> for Slice<T> {
    fn from(data: Vec<T>) -> Self {
        Slice::new(data)
    }
}

/// What a chain can be processed against.
pub enum Input<T> {
    /// A plain value sequence; top-level indices are assigned on demand.
    Values(Arc<dyn Iterable<T>>),
    /// Entries already indexed by a producer.
    Entries(ProcessingBuffer<T>),
}

impl<T: Element> Input<T> {
    /// A value stream over this input.
    pub fn values(&self) -> Values<T> {
        match self {
            Input::Values(data) => data.values(),
            Input::Entries(buffer) => Box::new(buffer.iter()),
        }
    }
}

impl<T> Clone for Input<T> {
    fn clone(&self) -> Self {
        match self {
            Input::Values(data) => Input::Values(Arc::clone(data)),
            Input::Entries(buffer) => Input::Entries(buffer.clone()),
        }
    }
}

impl<T: Element> From<Vec<T>> for Input<T> {
    fn from(data: Vec<T>) -> Self {
        Input::Values(Arc::new(Slice::new(data)))
    }
}

impl<T: Element> From<Slice<T>> for Input<T> {
    fn from(data: Slice<T>) -> Self {
        Input::Values(Arc::new(data))
    }
}

impl<T: Element> From<Arc<dyn Iterable<T>>> for Input<T> {
    fn from(data: Arc<dyn Iterable<T>>) -> Self {
        Input::Values(data)
    }
}

impl<T: Element> From<&IncrementalProcessingSource<T>> for Input<T> {
    fn from(source: &IncrementalProcessingSource<T>) -> Self {
        Input::Entries(source.buffer().clone())
    }
}
