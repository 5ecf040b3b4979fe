//! Error types for order queries.

/// Error type for store access and order assembly.
///
/// The variants separate caller mistakes, infrastructure failures, and
/// programming-contract violations so that each can be mapped to a distinct
/// HTTP status and asserted on independently in tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Bad paging or filter input. Raised before any query is issued.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store could not be reached or the read transaction failed.
    ///
    /// Never retried here; retry policy belongs to the caller.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// An association was resolved through a read scope that was already closed.
    #[error("Read scope already closed; associations must be resolved before the scope ends")]
    ScopeClosed,

    /// A row referenced a parent or child that does not exist.
    #[error("Dangling reference: {entity} with id {id} not found")]
    DanglingReference {
        /// Entity kind that was referenced
        entity: &'static str,
        /// Referenced identifier
        id: i64,
    },

    /// A stored value could not be mapped onto the domain model.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl QueryError {
    /// Build an [`QueryError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Build a [`QueryError::StoreUnavailable`].
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }
}

/// Result type for order queries.
pub type Result<T> = std::result::Result<T, QueryError>;
