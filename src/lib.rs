//! # orderflow
//!
//! An **ordered parallel data-processing engine**. Elements flow through a
//! declarative chain of steps (explode, map, filter, sort, transform) that
//! can run synchronously, on background threads, or element-wise on a
//! bounded pool of workers, while the output keeps a deterministic
//! relationship to the input order.
//!
//! ## Key Features
//!
//! - **Immutable, reusable chains** - build a plan once, process many inputs
//! - **Order preservation in parallel mode** - every element carries a
//!   hierarchical [`Index`]; an ordered [`ProcessingBuffer`] reassembles
//!   out-of-order completions, including elements exploded into several
//! - **Completion-order mode** - [`ProcessChain::unordered`] yields first
//!   finished, first out
//! - **Bounded concurrency** - a [`ProcessorPool`] throttles submission to
//!   its capacity instead of failing
//! - **Failure as absence** - a rejected, failed or panicking element leaves
//!   a tombstone and simply disappears from the output
//! - **Incremental input** - feed an [`IncrementalProcessingSource`] while a
//!   chain is already consuming it
//!
//! ## Quick Start
//!
//! ```
//! use orderflow::*;
//!
//! let chain = ProcessChain::<i32>::default()
//!     .parallel(4)
//!     .explode(|x: &i32| vec![*x, *x * 10])
//!     .filter(|x: &i32| *x != 20)
//!     .map(|x: &i32| x + 1);
//!
//! assert_eq!(chain.process(vec![1, 2, 3]).to_vec(), vec![2, 11, 3, 4, 31]);
//! ```
//!
//! ## Execution modes
//!
//! A run starts **synchronously**: each step materializes its full output
//! before the next begins. [`ProcessingResult::asynchronously`] moves step
//! computation to background threads. [`ProcessChain::with_pool`] and
//! [`ProcessChain::parallel`] switch to **parallel** mode, where each
//! element is a unit of work on the pool and steps overlap.
//!
//! [`ProcessChain::sort`] and [`ProcessChain::transform`] are barriers: they
//! drain their input completely before producing output.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]. Background work of a pipeline runs in
//! a `processing` span carrying the [`LogContext`] realm.

pub mod buffer;
pub mod chain;
pub mod data;
pub mod entry;
pub mod error;
pub mod explain;
pub mod index;
pub mod logging;
pub mod operation;
pub mod pool;
pub mod processing;
pub mod source;
pub mod testing;

// General re-exports
pub use buffer::{BufferKind, EntryIter, ProcessingBuffer, ValueIter};
pub use chain::{ProcessChain, explode, filter, map, parallel, sort, transform, unordered, with_pool};
pub use data::{Element, Input, Iterable, Slice, Values};
pub use entry::{Entry, EntryBuilder};
pub use error::ProcessingError;
pub use explain::{ChainExplanation, ExecutionMode, ExplainStep, StepKind};
pub use index::Index;
pub use logging::LogContext;
pub use operation::{Operation, Outcome};
pub use pool::{PoolConfig, ProcessorPool};
pub use processing::ProcessingResult;
pub use source::IncrementalProcessingSource;
