//! Booking lifecycle engine.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;

use super::{
    Booking, BookingChanges, BookingDraft, BookingId, BookingStatus, Caller, GameBookingCount,
    WeekDayBookingCount,
    errors::{BookingError, BookingResult},
    hooks::{LifecycleEvent, LifecycleEventKind, LifecycleHook},
    lifecycle::{self, Operation},
};
use crate::db::{BookingRepository, RepositoryError};

/// Booking service
///
/// Loads bookings, checks the transition and the caller's rights, persists
/// the change and hands the committed booking to the post-commit hook. The
/// service keeps no state of its own and is shared behind an `Arc`.
#[derive(Clone)]
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    hook: Arc<dyn LifecycleHook>,
}

impl BookingService {
    /// Create a new booking service
    ///
    /// # Arguments
    ///
    /// * `repo` - Booking storage
    /// * `hook` - Side effect fired after every committed change
    pub fn new(repo: Arc<dyn BookingRepository>, hook: Arc<dyn LifecycleHook>) -> Self {
        Self { repo, hook }
    }

    /// Bookings scheduled from now on
    pub async fn active_bookings(&self) -> BookingResult<Vec<Booking>> {
        self.repo
            .active_bookings(Utc::now())
            .await
            .map_err(|e| persistence("fetch bookings", e))
    }

    /// Find booking by ID
    pub async fn find_by_id(&self, id: BookingId) -> BookingResult<Booking> {
        self.load(id, "fetch booking").await
    }

    /// Bookings where `username` is the requester or a player
    pub async fn find_by_username(&self, username: &str) -> BookingResult<Vec<Booking>> {
        self.repo
            .find_by_username(username)
            .await
            .map_err(|e| persistence("fetch bookings for username", e))
    }

    /// Create a booking request.
    ///
    /// The stored booking is always `pending`, whatever the client sent.
    pub async fn create(&self, draft: BookingDraft) -> BookingResult<Booking> {
        let booking = self
            .repo
            .insert(&draft)
            .await
            .map_err(|e| persistence("insert booking", e))?;

        info!(
            "Booking {} created by {} for {} on {}",
            booking.id, booking.username, booking.game, booking.date_time
        );
        self.notify(LifecycleEventKind::Created, booking.clone());

        Ok(booking)
    }

    /// Edit a pending booking's scheduling fields
    ///
    /// # Errors
    ///
    /// * `BookingError::NotFound` - No booking with this ID
    /// * `BookingError::InvalidState` - Booking is no longer pending
    /// * `BookingError::NotAllowed` - Caller is neither owner nor player
    pub async fn modify(
        &self,
        id: BookingId,
        changes: BookingChanges,
        caller: &Caller,
    ) -> BookingResult<Booking> {
        let mut booking = self.load(id, "fetch booking").await?;
        ensure_transition(&booking, Operation::Modify)?;
        ensure_participant(&booking, caller)?;

        booking.apply(changes);
        self.repo
            .update(&booking, &BookingStatus::Pending)
            .await
            .map_err(|e| BookingError::from_repository("update booking", Operation::Modify, e))?;

        info!("Booking {} modified by {}", booking.id, caller.username);
        self.notify(LifecycleEventKind::Modified, booking.clone());

        Ok(booking)
    }

    /// Accept a booking. Callers must have checked admin rights.
    pub async fn accept(&self, id: BookingId) -> BookingResult<Booking> {
        let booking = self.load(id, "fetch booking").await?;
        let booking = self
            .transition(booking, Operation::Accept, "accept booking")
            .await?;

        self.notify(LifecycleEventKind::Accepted, booking.clone());
        Ok(booking)
    }

    /// Refuse a booking with an optional reason. Callers must have checked admin rights.
    pub async fn refuse(&self, id: BookingId, reason: &str) -> BookingResult<Booking> {
        let booking = self.load(id, "fetch booking").await?;
        let booking = self
            .transition(booking, Operation::Refuse, "refuse booking")
            .await?;

        self.notify(
            LifecycleEventKind::Refused {
                reason: reason.to_string(),
            },
            booking.clone(),
        );
        Ok(booking)
    }

    /// Cancel a booking on behalf of its owner or one of its players
    ///
    /// The status is checked before the caller's rights, so a stranger
    /// canceling an already refused booking gets `InvalidState`.
    pub async fn cancel(&self, id: BookingId, caller: &Caller) -> BookingResult<Booking> {
        let booking = self.load(id, "fetch booking").await?;
        ensure_transition(&booking, Operation::Cancel)?;
        ensure_participant(&booking, caller)?;

        let booking = self
            .transition(booking, Operation::Cancel, "cancel booking")
            .await?;

        self.notify(LifecycleEventKind::Canceled, booking.clone());
        Ok(booking)
    }

    pub async fn count_per_game(&self) -> BookingResult<Vec<GameBookingCount>> {
        self.repo
            .count_per_game()
            .await
            .map_err(|e| persistence("fetch bookings count per game", e))
    }

    pub async fn count_per_week_day(&self) -> BookingResult<Vec<WeekDayBookingCount>> {
        self.repo
            .count_per_week_day()
            .await
            .map_err(|e| persistence("fetch bookings count per week day", e))
    }

    pub async fn count_per_game_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<Vec<GameBookingCount>> {
        self.repo
            .count_per_game_in_period(start, end)
            .await
            .map_err(|e| persistence("fetch bookings count per game in period", e))
    }

    async fn load(&self, id: BookingId, action: &'static str) -> BookingResult<Booking> {
        self.repo.find_by_id(id).await.map_err(|e| match e {
            RepositoryError::NotFound(id) => BookingError::NotFound(id),
            other => persistence(action, other),
        })
    }

    /// Persist a status change guarded on the status that was read.
    ///
    /// When another request changed the status in between and `operation`
    /// is still legal from the new status, the write is retried once
    /// against it.
    async fn transition(
        &self,
        mut booking: Booking,
        operation: Operation,
        action: &'static str,
    ) -> BookingResult<Booking> {
        let mut retried = false;

        loop {
            let next = ensure_transition(&booking, operation)?;

            match self.repo.set_status(booking.id, &booking.status, &next).await {
                Ok(()) => {
                    info!("Booking {} moved from {} to {}", booking.id, booking.status, next);
                    booking.status = next;
                    return Ok(booking);
                }
                Err(RepositoryError::StatusConflict { actual, .. }) if !retried => {
                    debug!(
                        "Booking {} became {} before {operation} was written, retrying",
                        booking.id, actual
                    );
                    booking.status = actual;
                    retried = true;
                }
                Err(e) => return Err(BookingError::from_repository(action, operation, e)),
            }
        }
    }

    fn notify(&self, kind: LifecycleEventKind, booking: Booking) {
        self.hook.after_commit(LifecycleEvent::new(kind, booking));
    }
}

fn ensure_transition(booking: &Booking, operation: Operation) -> BookingResult<BookingStatus> {
    lifecycle::next_status(&booking.status, operation).ok_or_else(|| BookingError::InvalidState {
        status: booking.status.clone(),
        operation,
    })
}

fn ensure_participant(booking: &Booking, caller: &Caller) -> BookingResult<()> {
    if lifecycle::is_participant(booking, caller) {
        Ok(())
    } else {
        Err(BookingError::NotAllowed {
            username: caller.username.clone(),
            id: booking.id,
        })
    }
}

fn persistence(action: &'static str, source: RepositoryError) -> BookingError {
    BookingError::Persistence { action, source }
}
