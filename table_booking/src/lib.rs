//! # Table Booking
//!
//! Booking engine for a tabletop gaming community: members request a table
//! for a game session, admins accept or refuse the request, and every change
//! is announced on the community's Discord server.
//!
//! ## Core Modules
//!
//! - [`booking`]: Data model, lifecycle state machine and the [`BookingService`] engine
//! - [`db`]: PostgreSQL connection pool and booking repository
//! - [`discord`]: Discord REST client and payloads
//! - [`notify`]: Announcement rendering, member resolution and caching
//!
//! ## Lifecycle
//!
//! ```text
//! pending  ──accept──▶ accepted
//! pending  ──refuse──▶ refused
//! pending  ──cancel──▶ canceled
//! accepted ──refuse──▶ refused
//! accepted ──cancel──▶ canceled
//! refused  ──accept──▶ accepted
//! ```
//!
//! `canceled` is final. Only `pending` bookings can be edited.

/// Booking model, lifecycle rules and engine.
pub mod booking;
pub use booking::{
    Booking, BookingChanges, BookingDraft, BookingError, BookingId, BookingResult,
    BookingService, BookingStatus, Caller,
};

/// Database connection pooling and booking storage.
pub mod db;

/// Discord REST integration.
pub mod discord;

/// Lifecycle announcements.
pub mod notify;

/// In-memory doubles for the repository, hook and chat client.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
