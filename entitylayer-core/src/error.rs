//! Error types and result type for entity store operations.
//!
//! Every failure surfaced by this layer is one of four kinds. Raw driver
//! errors never escape: the underlying cause is stringified into the
//! classified variant, and diagnostic context (collection name, attempted
//! parameters) is logged at the failure site before the error is returned.

use std::fmt::Display;
use thiserror::Error;

/// Represents all failures the entity access layer can surface.
#[derive(Error, Debug)]
pub enum Error {
    /// The connector could not establish or reuse a database connection.
    #[error("failed to establish database connection: {0}")]
    Connection(String),
    /// A programming/contract violation, such as an entity type resolving
    /// an empty collection name.
    #[error("internal contract violation: {0}")]
    Internal(String),
    /// A storage operation failed, was unacknowledged, or returned a
    /// malformed result. Carries the collection it was issued against.
    #[error("storage operation failed on collection `{collection}`: {message}")]
    Persistence {
        /// The collection the failing operation targeted.
        collection: String,
        /// The stringified underlying cause.
        message: String,
    },
    /// A required document was absent: a reload after a write found
    /// nothing, or a fail-fast lookup found nothing.
    #[error("document not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Builds a [`Error::Persistence`] from a collection name and any
    /// displayable cause.
    pub fn persistence(collection: impl Into<String>, cause: impl Display) -> Self {
        Error::Persistence {
            collection: collection.into(),
            message: cause.to_string(),
        }
    }
}

/// A specialized `Result` type for entity store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_carries_collection_context() {
        let err = Error::persistence("widget", "socket closed");
        assert_eq!(
            err.to_string(),
            "storage operation failed on collection `widget`: socket closed",
        );
    }

    #[test]
    fn not_found_is_distinct_from_persistence() {
        let err = Error::NotFound("widget 64d2".into());
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!matches!(err, Error::Persistence { .. }));
    }
}
