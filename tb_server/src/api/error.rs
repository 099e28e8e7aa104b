//! API error type and its JSON rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use table_booking::{BookingError, discord::DiscordError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by HTTP handlers and middleware
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// Malformed query, path or body
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    /// Discord call failed while serving the request
    #[error("failed to {action}: {source}")]
    Upstream {
        action: &'static str,
        #[source]
        source: DiscordError,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Booking(BookingError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Booking(BookingError::InvalidState { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Booking(BookingError::NotAllowed { .. }) => StatusCode::FORBIDDEN,
            ApiError::Booking(BookingError::Persistence { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Booking(e) => e.client_message(),
            ApiError::Upstream { action, .. } => format!("failed to {action}"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_booking::booking::{BookingStatus, Operation};
    use table_booking::db::RepositoryError;
    use uuid::Uuid;

    #[test]
    fn test_booking_errors_map_to_status_codes() {
        let cases = [
            (BookingError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                BookingError::InvalidState {
                    status: BookingStatus::Canceled,
                    operation: Operation::Accept,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BookingError::NotAllowed {
                    username: "someone".to_string(),
                    id: Uuid::nil(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                BookingError::Persistence {
                    action: "cancel booking",
                    source: RepositoryError::NotFound(Uuid::nil()),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_upstream_message_hides_discord_details() {
        let err = ApiError::Upstream {
            action: "search users",
            source: DiscordError::Api {
                status: 403,
                body: "Missing Access".to_string(),
            },
        };

        assert_eq!(err.client_message(), "failed to search users");
        assert!(err.to_string().contains("Missing Access"));
    }
}
