//! Booking data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking ID type
pub type BookingId = Uuid;

/// Lifecycle stage of a booking.
///
/// Storage is free text, so a value outside the four known stages is kept
/// verbatim as `Unrecognized` instead of failing the read. Such bookings can
/// still be accepted, refused or canceled, but never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Refused,
    Canceled,
    Unrecognized(String),
}

impl BookingStatus {
    /// Database/JSON representation
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Refused => "refused",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => BookingStatus::Pending,
            "accepted" => BookingStatus::Accepted,
            "refused" => BookingStatus::Refused,
            "canceled" => BookingStatus::Canceled,
            _ => BookingStatus::Unrecognized(raw),
        }
    }
}

impl From<&str> for BookingStatus {
    fn from(raw: &str) -> Self {
        BookingStatus::from(raw.to_string())
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub game: String,
    /// Discord user ID of the requester
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    pub points: i32,
    #[serde(default)]
    pub description: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub reminder_enabled: bool,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub players: Vec<String>,
}

impl Booking {
    /// Build a pending booking from a draft once storage has assigned an ID.
    pub fn from_draft(id: BookingId, draft: BookingDraft) -> Self {
        Self {
            id,
            game: draft.game,
            user_id: draft.user_id,
            username: draft.username,
            points: draft.points,
            description: draft.description,
            status: BookingStatus::Pending,
            reminder_enabled: draft.reminder_enabled,
            date_time: draft.date_time,
            players: draft.players,
        }
    }

    /// Overwrite the mutable scheduling fields. Owner and status are untouched.
    pub fn apply(&mut self, changes: BookingChanges) {
        self.game = changes.game;
        self.points = changes.points;
        self.description = changes.description;
        self.reminder_enabled = changes.reminder_enabled;
        self.date_time = changes.date_time;
        self.players = changes.players;
    }
}

/// Booking creation request.
///
/// Carries no `id` or `status`: both are decided by storage and the engine.
/// Unknown JSON fields such as a client-supplied `status` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub game: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub players: Vec<String>,
}

/// Fields a caller may change while a booking is pending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingChanges {
    pub game: String,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub players: Vec<String>,
}

/// Authenticated identity of the user issuing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub username: String,
    pub admin: bool,
}

/// Accepted bookings per game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameBookingCount {
    pub game: String,
    #[serde(rename = "bookingCount")]
    pub count: i64,
}

/// Accepted bookings per day of the week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekDayBookingCount {
    #[serde(rename = "dayOfWeek")]
    pub week_day: String,
    #[serde(rename = "bookingCount")]
    pub count: i64,
}
