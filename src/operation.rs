//! Per-element operation strategies executed by pipeline stages.
//!
//! Every stateless stage (explode, map, filter, try-map) is an
//! [`Operation`] turning one input value into an [`Outcome`]. The same
//! strategy object drives synchronous, asynchronous and parallel
//! execution, so the three modes cannot drift apart semantically.

use crate::data::Element;
use crate::explain::StepKind;
use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// What one input value turned into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<O> {
    /// Filtered out or failed; leaves a tombstone in parallel mode.
    Empty,
    One(O),
    /// Two or more values; expanded beneath the parent index.
    Many(Vec<O>),
}

impl<O> Outcome<O> {
    /// Classify a value list by its length.
    pub fn from_vec(mut values: Vec<O>) -> Self {
        match values.len() {
            0 => Outcome::Empty,
            1 => values.pop().map_or(Outcome::Empty, Outcome::One),
            _ => Outcome::Many(values),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Outcome::Empty => 0,
            Outcome::One(_) => 1,
            Outcome::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}

impl<O> IntoIterator for Outcome<O> {
    type Item = O;
    type IntoIter = std::vec::IntoIter<O>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Outcome::Empty => Vec::new().into_iter(),
            Outcome::One(v) => vec![v].into_iter(),
            Outcome::Many(v) => v.into_iter(),
        }
    }
}

/// A stateless per-element strategy.
pub trait Operation<I, O>: Send + Sync {
    fn process(&self, input: &I) -> Outcome<O>;

    /// The step this operation implements, for plan explanations.
    fn kind(&self) -> StepKind;
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run `op` on `input`; a panic inside the user function is logged and
/// yields [`Outcome::Empty`].
pub(crate) fn guarded<I, O>(op: &dyn Operation<I, O>, input: &I) -> Outcome<O> {
    match catch_unwind(AssertUnwindSafe(|| op.process(input))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::warn!(step = %op.kind(), %reason, "element processing panicked, dropping element");
            Outcome::Empty
        }
    }
}

/// Run whole-stage work such as a sort or transform. A panic is logged at
/// error level and yields `None`, so the caller can still end its output.
pub(crate) fn contained<R>(stage: &str, work: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(r) => Some(r),
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::error!(stage, %reason, "stage panicked, ending its output");
            None
        }
    }
}

pub(crate) struct MapOp<I, O, F>(pub(crate) F, pub(crate) PhantomData<fn(&I) -> O>);

impl<I, O, F> Operation<I, O> for MapOp<I, O, F>
where
    I: Element,
    O: Element,
    F: Fn(&I) -> O + Send + Sync + 'static,
{
    fn process(&self, input: &I) -> Outcome<O> {
        Outcome::One(self.0(input))
    }

    fn kind(&self) -> StepKind {
        StepKind::Map
    }
}

pub(crate) struct FilterOp<T, P>(pub(crate) P, pub(crate) PhantomData<fn(&T)>);

impl<T, P> Operation<T, T> for FilterOp<T, P>
where
    T: Element,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn process(&self, input: &T) -> Outcome<T> {
        if self.0(input) {
            Outcome::One(input.clone())
        } else {
            Outcome::Empty
        }
    }

    fn kind(&self) -> StepKind {
        StepKind::Filter
    }
}

pub(crate) struct ExplodeOp<I, O, F>(pub(crate) F, pub(crate) PhantomData<fn(&I) -> O>);

impl<I, O, F> Operation<I, O> for ExplodeOp<I, O, F>
where
    I: Element,
    O: Element,
    F: Fn(&I) -> Vec<O> + Send + Sync + 'static,
{
    fn process(&self, input: &I) -> Outcome<O> {
        Outcome::from_vec(self.0(input))
    }

    fn kind(&self) -> StepKind {
        StepKind::Explode
    }
}

/// Map with a fallible function; an `Err` is logged and drops the element.
pub(crate) struct TryMapOp<I, O, E, F>(pub(crate) F, pub(crate) PhantomData<fn(&I) -> Result<O, E>>);

impl<I, O, E, F> Operation<I, O> for TryMapOp<I, O, E, F>
where
    I: Element,
    O: Element,
    E: Display,
    F: Fn(&I) -> Result<O, E> + Send + Sync + 'static,
{
    fn process(&self, input: &I) -> Outcome<O> {
        match self.0(input) {
            Ok(v) => Outcome::One(v),
            Err(err) => {
                tracing::debug!(error = %err, "element mapping failed, dropping element");
                Outcome::Empty
            }
        }
    }

    fn kind(&self) -> StepKind {
        StepKind::TryMap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explode_outcome_follows_length() {
        let op = ExplodeOp::<usize, usize, _>(|n: &usize| (0..*n).collect::<Vec<_>>(), PhantomData);
        assert_eq!(op.process(&0), Outcome::Empty);
        assert_eq!(op.process(&1), Outcome::One(0));
        assert_eq!(op.process(&3), Outcome::Many(vec![0, 1, 2]));
    }

    #[test]
    fn filter_keeps_matching_values() {
        let op = FilterOp::<i32, _>(|n: &i32| n % 2 == 0, PhantomData);
        assert_eq!(op.process(&4), Outcome::One(4));
        assert!(op.process(&3).is_empty());
    }

    #[test]
    fn try_map_error_is_empty() {
        let op = TryMapOp::<String, i32, _, _>(|s: &String| s.parse::<i32>(), PhantomData);
        assert_eq!(op.process(&"7".to_string()), Outcome::One(7));
        assert_eq!(op.process(&"x".to_string()), Outcome::Empty);
    }

    #[test]
    fn panicking_operation_is_guarded() {
        let op = MapOp::<i32, i32, _>(
            |n: &i32| {
                assert!(*n != 0, "zero");
                10 / n
            },
            PhantomData,
        );
        assert_eq!(guarded(&op, &5), Outcome::One(2));
        assert_eq!(guarded(&op, &0), Outcome::Empty);
    }

    #[test]
    fn contained_reports_panics_as_none() {
        assert_eq!(contained("sum", || 2 + 2), Some(4));
        let failed: Option<i32> = contained("sum", || panic!("overflow"));
        assert_eq!(failed, None);
    }
}
