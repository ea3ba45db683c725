//! Hierarchical position keys.
//!
//! An [`Index`] identifies an element's place in the original, possibly
//! exploded, input stream. Top-level elements carry a single component
//! (`[i]`); the children produced by exploding element `[i]` live at
//! `[i, 0]`, `[i, 1]`, … and so on for deeper explosions.
//!
//! The ordered buffer relies on two operations:
//! - [`Index::after`], the ordering used to place entries in the buffer, and
//! - [`Index::next`], which computes the index expected to follow a given one.

use crate::error::ProcessingError;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// A hierarchical position key, most significant component first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Index(Vec<usize>);

impl Index {
    /// The top-level index `[i]`.
    #[must_use]
    pub fn top(i: usize) -> Self {
        Self(vec![i])
    }

    /// Build an index from its components.
    #[must_use]
    pub fn from_components(components: Vec<usize>) -> Self {
        Self(components)
    }

    /// The components of this index.
    #[must_use]
    pub fn components(&self) -> &[usize] {
        &self.0
    }

    /// Number of levels of this index.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The deepest component, if any.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// The index of the `i`-th child of this index (`self + [i]`).
    #[must_use]
    pub fn child(&self, i: usize) -> Self {
        let mut n = self.0.clone();
        n.push(i);
        Self(n)
    }

    /// Reports whether `self` is positioned after `other`.
    ///
    /// The first differing shared component decides. If all shared
    /// components match, the longer index (a descendant) is after the
    /// shorter one.
    ///
    /// ```
    /// use orderflow::Index;
    ///
    /// let i = Index::from_components(vec![1, 2, 3]);
    /// assert!(i.after(&Index::from_components(vec![1, 2])));
    /// assert!(!Index::from_components(vec![1, 2]).after(&i));
    /// assert!(!i.after(&Index::from_components(vec![1, 3])));
    /// ```
    #[must_use]
    pub fn after(&self, other: &Index) -> bool {
        for (l, v) in self.0.iter().enumerate() {
            match other.0.get(l) {
                None => return true,
                Some(o) if v != o => return v > o,
                Some(_) => {}
            }
        }
        self.0.len() > other.0.len()
    }

    /// The index expected to follow this one.
    ///
    /// - `sub > 0` (this element expands into `sub` children) or an empty
    ///   index: descend one level (`self + [0]`).
    /// - otherwise increment the last component; when a bound `max_index` is
    ///   declared and reached, ascend: drop the last component and increment
    ///   its parent.
    ///
    /// With `max_index == None` the level is unbounded and never ascends.
    #[must_use]
    pub fn next(&self, max_index: Option<usize>, sub: usize) -> Index {
        let mut n = self.0.clone();
        if sub > 0 || n.is_empty() {
            n.push(0);
            return Index(n);
        }
        let l = n.len();
        n[l - 1] += 1;
        match max_index {
            Some(max) if n[l - 1] >= max && l > 1 => {
                n.truncate(l - 1);
                n[l - 2] += 1;
            }
            _ => {}
        }
        Index(n)
    }

    /// Drop the deepest component and increment the new deepest one.
    pub(crate) fn ascend(&self) -> Index {
        let mut n = self.0.clone();
        n.pop();
        if let Some(last) = n.last_mut() {
            *last += 1;
        }
        Index(n)
    }

    /// Checks the deepest component against the declared bound.
    ///
    /// An index violating its bound cannot be advanced correctly by
    /// [`Index::next`]; callers treat this as a contract violation.
    pub fn validate(&self, max_index: Option<usize>) -> Result<(), ProcessingError> {
        match (self.last(), max_index) {
            (Some(last), Some(max)) if last >= max => Err(ProcessingError::IndexOutOfBounds {
                index: self.clone(),
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Index {
    fn from(components: Vec<usize>) -> Self {
        Self(components)
    }
}

impl<const N: usize> From<[usize; N]> for Index {
    fn from(components: [usize; N]) -> Self {
        Self(components.to_vec())
    }
}
