//! Post-commit hooks fired after a lifecycle write succeeds.

use serde::{Deserialize, Serialize};

use super::Booking;

/// What happened to a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LifecycleEventKind {
    Created,
    Modified,
    Accepted,
    Refused { reason: String },
    Canceled,
}

/// A committed booking state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: LifecycleEventKind,
    /// Booking as stored after the change
    pub booking: Booking,
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleEventKind, booking: Booking) -> Self {
        Self { kind, booking }
    }
}

/// Side effect run once a lifecycle change has been persisted.
///
/// Implementations must not block and cannot fail the operation: anything
/// slow or fallible is detached and only observed through logs.
pub trait LifecycleHook: Send + Sync {
    fn after_commit(&self, event: LifecycleEvent);
}
