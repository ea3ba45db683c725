//! Immutable, reusable processing plans.
//!
//! A [`ProcessChain`] records steps without touching any data. Every
//! builder method returns a new chain sharing the steps recorded so far,
//! so a common prefix can be extended in several directions. Calling
//! [`ProcessChain::process`] instantiates the steps for one input.
//!
//! ```
//! use orderflow::ProcessChain;
//!
//! let words = ProcessChain::<String>::default()
//!     .explode(|s: &String| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
//!     .filter(|w: &String| w.len() > 2)
//!     .sort(|a: &String, b: &String| a.cmp(b));
//!
//! let out = words.process(vec!["the quick brown fox".to_string()]).to_vec();
//! assert_eq!(out, vec!["brown", "fox", "quick", "the"]);
//! ```

use crate::data::{Element, Input, Values};
use crate::explain::{ChainExplanation, StepKind};
use crate::logging::LogContext;
use crate::operation::{ExplodeOp, FilterOp, MapOp, Operation, TryMapOp};
use crate::pool::{PoolConfig, ProcessorPool};
use crate::processing::ProcessingResult;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter, Result as FormatResult};
use std::marker::PhantomData;
use std::sync::Arc;

type Run<I, O> = Arc<dyn Fn(ProcessingResult<I>) -> ProcessingResult<O> + Send + Sync>;

/// A chain of step definitions from elements of type `I` to type `O`.
pub struct ProcessChain<I, O = I> {
    run: Run<I, O>,
    steps: Arc<Vec<StepKind>>,
    log: LogContext,
}

impl<I, O> Clone for ProcessChain<I, O> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
            steps: Arc::clone(&self.steps),
            log: self.log.clone(),
        }
    }
}

impl<I, O> Debug for ProcessChain<I, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("ProcessChain")
            .field("realm", &self.log.realm())
            .field("steps", &self.steps)
            .finish()
    }
}

impl<T: Element> ProcessChain<T, T> {
    /// The empty chain; processing with it yields the input unchanged.
    pub fn new(log: LogContext) -> Self {
        Self {
            run: Arc::new(|r: ProcessingResult<T>| r),
            steps: Arc::new(Vec::new()),
            log,
        }
    }
}

impl<T: Element> Default for ProcessChain<T, T> {
    fn default() -> Self {
        Self::new(LogContext::default())
    }
}

impl<I: Element, O: Element> ProcessChain<I, O> {
    fn then<P, F>(&self, kind: StepKind, step: F) -> ProcessChain<I, P>
    where
        P: Element,
        F: Fn(ProcessingResult<O>) -> ProcessingResult<P> + Send + Sync + 'static,
    {
        let prev = Arc::clone(&self.run);
        let mut steps = self.steps.as_ref().clone();
        steps.push(kind);
        ProcessChain {
            run: Arc::new(move |r: ProcessingResult<I>| step(prev(r))),
            steps: Arc::new(steps),
            log: self.log.clone(),
        }
    }

    fn operation<P: Element>(&self, op: Arc<dyn Operation<O, P>>) -> ProcessChain<I, P> {
        self.then(op.kind(), move |r| r.process(Arc::clone(&op)))
    }

    /// Replace every element by the elements `f` returns for it.
    #[must_use]
    pub fn explode<P, F>(&self, f: F) -> ProcessChain<I, P>
    where
        P: Element,
        F: Fn(&O) -> Vec<P> + Send + Sync + 'static,
    {
        self.operation(Arc::new(ExplodeOp::<O, P, F>(f, PhantomData)))
    }

    #[must_use]
    pub fn map<P, F>(&self, f: F) -> ProcessChain<I, P>
    where
        P: Element,
        F: Fn(&O) -> P + Send + Sync + 'static,
    {
        self.operation(Arc::new(MapOp::<O, P, F>(f, PhantomData)))
    }

    #[must_use]
    pub fn filter<F>(&self, f: F) -> ProcessChain<I, O>
    where
        F: Fn(&O) -> bool + Send + Sync + 'static,
    {
        self.operation(Arc::new(FilterOp::<O, F>(f, PhantomData)))
    }

    /// Map with a fallible function; failed elements are dropped.
    #[must_use]
    pub fn try_map<P, E, F>(&self, f: F) -> ProcessChain<I, P>
    where
        P: Element,
        E: Display + 'static,
        F: Fn(&O) -> Result<P, E> + Send + Sync + 'static,
    {
        self.operation(Arc::new(TryMapOp::<O, P, E, F>(f, PhantomData)))
    }

    /// Stable sort of the complete sequence.
    #[must_use]
    pub fn sort<F>(&self, cmp: F) -> ProcessChain<I, O>
    where
        F: Fn(&O, &O) -> Ordering + Send + Sync + 'static,
    {
        let cmp = Arc::new(cmp);
        self.then(StepKind::Sort, move |r| {
            let cmp = Arc::clone(&cmp);
            r.sort(move |a, b| cmp(a, b))
        })
    }

    /// Rewrite the complete sequence at once.
    #[must_use]
    pub fn transform<P, F>(&self, f: F) -> ProcessChain<I, P>
    where
        P: Element,
        F: Fn(Values<O>) -> Vec<P> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.then(StepKind::Transform, move |r| {
            let f = Arc::clone(&f);
            r.transform(move |values| f(values))
        })
    }

    /// Run the following steps on `pool`, shared by every run of the chain.
    #[must_use]
    pub fn with_pool(&self, pool: ProcessorPool) -> ProcessChain<I, O> {
        let workers = pool.capacity();
        self.then(StepKind::WithPool { workers }, move |r| r.with_pool(pool.clone()))
    }

    /// Run the following steps on a fresh pool of `n` workers per run
    /// (`0` = CPU count).
    #[must_use]
    pub fn parallel(&self, n: usize) -> ProcessChain<I, O> {
        let workers = PoolConfig::with_workers(n).capacity();
        self.then(StepKind::WithPool { workers }, move |r| r.parallel(n))
    }

    /// Yield elements in completion order from here on.
    #[must_use]
    pub fn unordered(&self) -> ProcessChain<I, O> {
        self.then(StepKind::Unordered, ProcessingResult::unordered)
    }

    /// Continue with the steps of `other`.
    #[must_use]
    pub fn append<P: Element>(&self, other: &ProcessChain<O, P>) -> ProcessChain<I, P> {
        let prev = Arc::clone(&self.run);
        let next = Arc::clone(&other.run);
        let mut steps = self.steps.as_ref().clone();
        steps.extend(other.steps.iter().cloned());
        ProcessChain {
            run: Arc::new(move |r: ProcessingResult<I>| next(prev(r))),
            steps: Arc::new(steps),
            log: self.log.clone(),
        }
    }

    /// Continue with `other` only when `condition` holds.
    #[must_use]
    pub fn append_if(&self, condition: bool, other: &ProcessChain<O, O>) -> ProcessChain<I, O> {
        if condition { self.append(other) } else { self.clone() }
    }

    /// Instantiate the chain for `input`.
    pub fn process(&self, input: impl Into<Input<I>>) -> ProcessingResult<O> {
        let steps = self.steps.len();
        tracing::debug!(realm = self.log.realm(), steps, "processing chain");
        (self.run)(ProcessingResult::new(input, self.log.clone()))
    }

    /// Continue an existing run with the steps of this chain.
    pub fn process_result(&self, result: ProcessingResult<I>) -> ProcessingResult<O> {
        (self.run)(result)
    }

    /// The recorded steps, in order.
    pub fn steps(&self) -> &[StepKind] {
        &self.steps
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    /// Describe how each step will execute.
    pub fn explain(&self) -> ChainExplanation {
        ChainExplanation::from_steps(self.log.realm(), &self.steps)
    }
}

/// A chain exploding each element with `f`.
pub fn explode<T, O, F>(f: F) -> ProcessChain<T, O>
where
    T: Element,
    O: Element,
    F: Fn(&T) -> Vec<O> + Send + Sync + 'static,
{
    ProcessChain::default().explode(f)
}

/// A chain mapping each element with `f`.
pub fn map<T, O, F>(f: F) -> ProcessChain<T, O>
where
    T: Element,
    O: Element,
    F: Fn(&T) -> O + Send + Sync + 'static,
{
    ProcessChain::default().map(f)
}

/// A chain keeping the elements matching `f`.
pub fn filter<T, F>(f: F) -> ProcessChain<T>
where
    T: Element,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    ProcessChain::default().filter(f)
}

/// A chain sorting all elements with `cmp`.
pub fn sort<T, F>(cmp: F) -> ProcessChain<T>
where
    T: Element,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    ProcessChain::default().sort(cmp)
}

/// A chain rewriting the complete sequence with `f`.
pub fn transform<T, O, F>(f: F) -> ProcessChain<T, O>
where
    T: Element,
    O: Element,
    F: Fn(Values<T>) -> Vec<O> + Send + Sync + 'static,
{
    ProcessChain::default().transform(f)
}

/// A chain switching to parallel execution on `pool`.
pub fn with_pool<T: Element>(pool: ProcessorPool) -> ProcessChain<T> {
    ProcessChain::default().with_pool(pool)
}

/// A chain switching to parallel execution on `n` workers.
pub fn parallel<T: Element>(n: usize) -> ProcessChain<T> {
    ProcessChain::default().parallel(n)
}

/// A chain yielding elements in completion order.
pub fn unordered<T: Element>() -> ProcessChain<T> {
    ProcessChain::default().unordered()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_do_not_touch_the_parent() {
        let base = ProcessChain::<i32>::default().map(|x: &i32| x + 1);
        let doubled = base.map(|x: &i32| x * 2);
        assert_eq!(base.steps().len(), 1);
        assert_eq!(doubled.steps().len(), 2);
        assert_eq!(base.process(vec![1, 2]).to_vec(), vec![2, 3]);
        assert_eq!(doubled.process(vec![1, 2]).to_vec(), vec![4, 6]);
    }

    #[test]
    fn append_if_skips_on_false() {
        let base = map(|x: &i32| x + 1);
        let extra = filter(|x: &i32| x % 2 == 0);
        assert_eq!(base.append_if(false, &extra).steps().len(), 1);
        assert_eq!(base.append_if(true, &extra).process(vec![1, 2, 3]).to_vec(), vec![2, 4]);
    }
}
