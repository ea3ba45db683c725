//! Tagged units of work flowing between pipeline stages.

use crate::error::ProcessingError;
use crate::index::Index;

/// A payload tagged with its position in the (possibly exploded) stream.
///
/// An invalid entry (`valid == false`) is a tombstone: the element was
/// filtered out or failed, but its index slot is still occupied so the
/// ordered buffer can advance past it.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T> {
    pub index: Index,
    /// Bound of the deepest index component (`None` = unbounded).
    pub max_index: Option<usize>,
    /// Number of child entries (`index + [i]`) following this one.
    pub max_sub: usize,
    pub valid: bool,
    pub value: Option<T>,
}

impl<T> Entry<T> {
    /// Start building an entry for `value` at `index`.
    pub fn builder(index: impl Into<Index>, value: T) -> EntryBuilder<T> {
        EntryBuilder {
            index: index.into(),
            value: Some(value),
            valid: true,
            max_sub: 0,
            max_index: None,
        }
    }

    /// A valid top-level entry `[i]` without declared bound or children.
    pub fn top(i: usize, value: T) -> Self {
        Self {
            index: Index::top(i),
            max_index: None,
            max_sub: 0,
            valid: true,
            value: Some(value),
        }
    }

    /// An invalid entry occupying `index`.
    pub fn tombstone(index: Index, max_index: Option<usize>) -> Self {
        Self {
            index,
            max_index,
            max_sub: 0,
            valid: false,
            value: None,
        }
    }

    /// The value, if this entry is valid.
    pub fn valid_value(&self) -> Option<&T> {
        if self.valid { self.value.as_ref() } else { None }
    }

    /// Same slot and shape, invalid, no payload. Used to carry a tombstone
    /// into a stage with a different element type.
    pub(crate) fn invalidated<O>(self) -> Entry<O> {
        Entry {
            index: self.index,
            max_index: self.max_index,
            max_sub: self.max_sub,
            valid: false,
            value: None,
        }
    }
}

/// Builder for [`Entry`], replacing loosely typed option lists.
#[derive(Debug)]
pub struct EntryBuilder<T> {
    index: Index,
    value: Option<T>,
    valid: bool,
    max_sub: usize,
    max_index: Option<usize>,
}

impl<T> EntryBuilder<T> {
    /// Validity flag; repeated calls are AND-combined.
    #[must_use]
    pub fn valid(mut self, valid: bool) -> Self {
        self.valid = self.valid && valid;
        self
    }

    /// Declare that `n` child entries will follow at `index + [i]`.
    #[must_use]
    pub fn sub_entries(mut self, n: usize) -> Self {
        self.max_sub = n;
        self
    }

    /// Declare the bound of the deepest index component.
    #[must_use]
    pub fn max_index(mut self, max: usize) -> Self {
        self.max_index = Some(max);
        self
    }

    /// Build the entry, failing on a contract violation.
    ///
    /// A nested index (depth > 1) needs a declared max index, and the
    /// deepest component must lie below it.
    pub fn try_build(self) -> Result<Entry<T>, ProcessingError> {
        if self.index.depth() > 1 && self.max_index.is_none() {
            return Err(ProcessingError::MissingMaxIndex { index: self.index });
        }
        self.index.validate(self.max_index)?;
        Ok(Entry {
            index: self.index,
            max_index: self.max_index,
            max_sub: self.max_sub,
            valid: self.valid,
            value: self.value,
        })
    }

    /// Build the entry; a contract violation is logged and the entry is
    /// downgraded to an unbounded tombstone at the same index.
    pub fn build(self) -> Entry<T> {
        let index = self.index.clone();
        let max_sub = self.max_sub;
        match self.try_build() {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(%index, error = %err, "invalid entry, downgraded to tombstone");
                Entry {
                    index,
                    max_index: None,
                    max_sub,
                    valid: false,
                    value: None,
                }
            }
        }
    }
}
