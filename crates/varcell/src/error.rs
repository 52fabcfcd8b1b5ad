#![forbid(unsafe_code)]

use std::convert::Infallible;

use thiserror::Error;

/// Failure of a fallible update operation.
///
/// `E` is the error type of the caller's snapshot accessor and producer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError<E> {
    /// The snapshot accessor failed. The cell was not touched.
    #[error("snapshot copy failed")]
    Snapshot(#[source] E),

    /// The producer failed after a change was detected.
    ///
    /// `committed` is true when the new snapshot had already been written,
    /// i.e. the cell now holds a snapshot whose derived value was never
    /// stored.
    #[error("producer failed (snapshot committed: {committed})")]
    Produce {
        committed: bool,
        #[source]
        source: E,
    },
}

impl<E> CellError<E> {
    /// Whether the failed update left a committed snapshot behind.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Produce { committed: true, .. })
    }

    /// The caller's error, discarding which stage produced it.
    #[must_use]
    pub fn into_inner(self) -> E {
        match self {
            Self::Snapshot(source) | Self::Produce { source, .. } => source,
        }
    }
}

/// Unwrap the result of an update whose closures cannot fail.
pub(crate) fn infallible<T>(result: Result<T, CellError<Infallible>>) -> T {
    let Ok(value) = result;
    value
}
