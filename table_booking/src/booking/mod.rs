//! Booking module: data model, lifecycle state machine and engine.
//!
//! A booking is created `pending`, may be edited by its requester or players
//! while pending, is accepted or refused by an admin, and can be canceled by
//! its requester or players until it is refused. Every committed change is
//! handed to a [`LifecycleHook`], which in production posts a Discord
//! announcement.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use table_booking::booking::BookingService;
//! use table_booking::db::{Database, PgBookingRepository};
//! use table_booking::discord::DiscordClient;
//! use table_booking::notify::{Announcer, IdentityResolver, NotifyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let repo = Arc::new(PgBookingRepository::new(Arc::new(db.pool().clone())));
//!
//!     let discord = Arc::new(DiscordClient::new(Default::default())?);
//!     let resolver = IdentityResolver::with_ttl(discord.clone(), std::time::Duration::from_secs(60));
//!     let announcer = Announcer::new(discord, resolver, &NotifyConfig::new("123456"));
//!
//!     let service = BookingService::new(repo, Arc::new(announcer));
//!     for booking in service.active_bookings().await? {
//!         println!("{} - {}", booking.game, booking.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod hooks;
pub mod lifecycle;
pub mod models;
pub mod service;

pub use errors::{BookingError, BookingResult};
pub use hooks::{LifecycleEvent, LifecycleEventKind, LifecycleHook};
pub use lifecycle::Operation;
pub use models::{
    Booking, BookingChanges, BookingDraft, BookingId, BookingStatus, Caller, GameBookingCount,
    WeekDayBookingCount,
};
pub use service::BookingService;
