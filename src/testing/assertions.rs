//! Assertions for comparing pipeline outputs with expected sequences.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two sequences are equal element by element.
///
/// # Panics
///
/// Panics with the first differing position if the sequences differ.
///
/// # Example
///
/// ```
/// use orderflow::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 3], &[1, 2, 3]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Sequence length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Sequence mismatch at position {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two sequences hold the same elements with the same
/// multiplicities, in any order.
///
/// Completion-order output of unordered pipelines is compared this way.
///
/// # Panics
///
/// Panics listing missing and surplus elements if the contents differ.
///
/// # Example
///
/// ```
/// use orderflow::testing::assert_collections_unordered_equal;
///
/// assert_collections_unordered_equal(&[3, 1, 2, 1], &[1, 1, 2, 3]);
/// ```
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    let mut counts: HashMap<&T, isize> = HashMap::new();
    for e in expected {
        *counts.entry(e).or_default() += 1;
    }
    for a in actual {
        *counts.entry(a).or_default() -= 1;
    }

    let missing: Vec<_> = counts.iter().filter(|(_, n)| **n > 0).map(|(e, n)| (*e, *n)).collect();
    let surplus: Vec<_> = counts.iter().filter(|(_, n)| **n < 0).map(|(e, n)| (*e, -*n)).collect();

    if !missing.is_empty() || !surplus.is_empty() {
        panic!(
            "Sequence content mismatch:\n  Missing (element, count): {missing:?}\n  Surplus (element, count): {surplus:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}

/// Assert that a sequence is ordered according to `cmp`.
///
/// # Panics
///
/// Panics with the first out-of-order pair.
pub fn assert_sorted_by<T: Debug>(actual: &[T], cmp: impl Fn(&T, &T) -> std::cmp::Ordering) {
    for (i, pair) in actual.windows(2).enumerate() {
        assert!(
            cmp(&pair[0], &pair[1]).is_le(),
            "Sequence not sorted at position {}: {:?} precedes {:?}\n  Full actual: {actual:?}",
            i + 1,
            pair[0],
            pair[1]
        );
    }
}

/// Assert that all elements satisfy `predicate`.
///
/// # Panics
///
/// Panics with the first violating element.
pub fn assert_all<T: Debug>(actual: &[T], predicate: impl Fn(&T) -> bool) {
    if let Some((i, e)) = actual.iter().enumerate().find(|(_, e)| !predicate(e)) {
        panic!("Element at position {i} violates the predicate: {e:?}\n  Full actual: {actual:?}");
    }
}
