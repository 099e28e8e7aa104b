//! Booking error types.

use thiserror::Error;

use super::{BookingId, BookingStatus, lifecycle::Operation};
use crate::db::RepositoryError;

/// Booking lifecycle errors
#[derive(Debug, Error)]
pub enum BookingError {
    /// Referenced booking does not exist
    #[error("Booking {0} not found")]
    NotFound(BookingId),

    /// Operation is illegal for the booking's current status
    #[error("Cannot {operation} a booking that is {status}")]
    InvalidState {
        status: BookingStatus,
        operation: Operation,
    },

    /// Caller is neither the owner nor a listed player
    #[error("User {username} is not allowed to change booking {id}")]
    NotAllowed { username: String, id: BookingId },

    /// Storage failed while performing `action`
    #[error("failed to {action}: {source}")]
    Persistence {
        action: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl BookingError {
    /// Map a repository failure raised while performing `action`.
    ///
    /// A missing row stays `NotFound` and a lost status race becomes
    /// `InvalidState`, so callers branch on the same variants whether the
    /// problem was seen at read or at write time.
    pub fn from_repository(action: &'static str, operation: Operation, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => BookingError::NotFound(id),
            RepositoryError::StatusConflict { actual, .. } => BookingError::InvalidState {
                status: actual,
                operation,
            },
            source @ RepositoryError::Database(_) => BookingError::Persistence { action, source },
        }
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            BookingError::NotFound(_) => "booking not found".to_string(),
            BookingError::InvalidState { .. } => "invalid booking state".to_string(),
            BookingError::NotAllowed { .. } => "not allowed to perform this operation".to_string(),
            BookingError::Persistence { action, .. } => format!("failed to {action}"),
        }
    }
}

/// Result type for booking operations
pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cancel_persistence_error_is_wrapped() {
        let err = BookingError::from_repository(
            "cancel booking",
            Operation::Cancel,
            RepositoryError::Database(sqlx::Error::PoolTimedOut),
        );

        assert!(matches!(err, BookingError::Persistence { action: "cancel booking", .. }));
        assert!(err.to_string().starts_with("failed to cancel booking: "));
        assert_eq!(err.client_message(), "failed to cancel booking");
    }

    #[test]
    fn test_status_conflict_maps_to_invalid_state() {
        let id = Uuid::new_v4();
        let err = BookingError::from_repository(
            "accept booking",
            Operation::Accept,
            RepositoryError::StatusConflict {
                id,
                expected: BookingStatus::Pending,
                actual: BookingStatus::Canceled,
            },
        );

        match err {
            BookingError::InvalidState { status, operation } => {
                assert_eq!(status, BookingStatus::Canceled);
                assert_eq!(operation, Operation::Accept);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_message_hides_database_details() {
        let err = BookingError::Persistence {
            action: "update booking",
            source: RepositoryError::Database(sqlx::Error::RowNotFound),
        };
        assert!(!err.client_message().contains("Database"));
    }
}
