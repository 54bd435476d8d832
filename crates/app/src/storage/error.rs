//! Storage errors.

use thiserror::Error;

/// Boxed error source carried by [`StoreError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Storage-agnostic error returned by every store.
///
/// Backends translate their native errors into one of these kinds so that no
/// driver type leaks past the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Conflict,

    #[error("related record not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage unavailable")]
    Unavailable(#[source] BoxError),

    #[error("storage error")]
    Other(#[source] BoxError),
}

impl StoreError {
    /// Whether retrying the whole unit of work may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
