//! Per-element error report for a batch operation

use super::{AggregateIndexError, BackendError, StoreError};
use std::fmt;

/// One optional error per element of a batch, in input order.
///
/// Entry `i` describes element `i` of the originating request; `None` means that
/// element succeeded. The length is fixed when the aggregate is created.
#[derive(Debug, Clone, Default)]
pub struct ErrorAggregate {
    entries: Vec<Option<StoreError>>,
}

impl ErrorAggregate {
    /// Aggregate for a batch of `len` elements, all successful.
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![None; len],
        }
    }

    /// Build from a backend's per-element errors, normalizing each entry.
    pub fn from_backend<E, I>(entries: I) -> Self
    where
        E: BackendError,
        I: IntoIterator<Item = Option<E>>,
    {
        entries
            .into_iter()
            .map(|entry| entry.map(BackendError::into_store_error))
            .collect()
    }

    /// Number of batch elements covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the originating batch was empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Error recorded for element `index`, if it failed.
    pub fn get(&self, index: usize) -> Option<&StoreError> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    /// Entries in element order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&StoreError>> + '_ {
        self.entries.iter().map(Option::as_ref)
    }

    /// `(index, error)` for every failed element.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &StoreError)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|err| (index, err)))
    }

    /// Number of failed elements.
    pub fn error_count(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Whether any element failed.
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Option::is_some)
    }

    /// Lowest-indexed failure.
    pub fn first_error(&self) -> Option<&StoreError> {
        self.entries.iter().flatten().next()
    }

    /// Surface as an error only if some element actually failed.
    pub fn into_result(self) -> Result<(), StoreError> {
        if self.has_errors() {
            Err(StoreError::Aggregate(self))
        } else {
            Ok(())
        }
    }

    /// Take the raw entries.
    pub fn into_entries(self) -> Vec<Option<StoreError>> {
        self.entries
    }

    pub(crate) fn set(&mut self, index: usize, err: StoreError) -> Result<(), AggregateIndexError> {
        let size = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(AggregateIndexError { index, size })?;
        *slot = Some(err);
        Ok(())
    }
}

impl From<Vec<Option<StoreError>>> for ErrorAggregate {
    fn from(entries: Vec<Option<StoreError>>) -> Self {
        Self { entries }
    }
}

impl FromIterator<Option<StoreError>> for ErrorAggregate {
    fn from_iter<I: IntoIterator<Item = Option<StoreError>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// Only the first failure is rendered, followed by a count of the rest, so the
// message stays bounded for large batches.
impl fmt::Display for ErrorAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut failures = self.entries.iter().flatten();
        let Some(first) = failures.next() else {
            return f.write_str("(0 errors)");
        };
        match failures.count() {
            0 => write!(f, "{first}"),
            1 => write!(f, "{first} (and 1 other error)"),
            others => write!(f, "{first} (and {others} other errors)"),
        }
    }
}

// No `source`: the summary already carries the first failure's message, and
// the entries are reached through `failures`.
impl std::error::Error for ErrorAggregate {}
