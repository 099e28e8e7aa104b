//! Repository error types.

use thiserror::Error;

use crate::booking::{BookingId, BookingStatus};

/// Errors raised by booking storage
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No row matched the booking ID
    #[error("Booking {0} not found")]
    NotFound(BookingId),

    /// The row exists but its status changed since it was read
    #[error("Booking {id} status is {actual}, expected {expected}")]
    StatusConflict {
        id: BookingId,
        expected: BookingStatus,
        actual: BookingStatus,
    },
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
