//! Booking status state machine.
//!
//! | current      | accept     | refuse     | cancel     | modify  |
//! |--------------|------------|------------|------------|---------|
//! | pending      | accepted   | refused    | canceled   | pending |
//! | accepted     | -          | refused    | canceled   | -       |
//! | refused      | accepted   | -          | -          | -       |
//! | canceled     | -          | -          | -          | -       |
//! | unrecognized | accepted   | refused    | canceled   | -       |
//!
//! Each operation is rejected only from the statuses listed against it;
//! `canceled` is final and `modify` requires an exact `pending`. A refused
//! booking can still be accepted by an admin who changes their mind.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Booking, BookingStatus, Caller};

/// Lifecycle operations that act on an existing booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Modify,
    Accept,
    Refuse,
    Cancel,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Modify => write!(f, "modify"),
            Operation::Accept => write!(f, "accept"),
            Operation::Refuse => write!(f, "refuse"),
            Operation::Cancel => write!(f, "cancel"),
        }
    }
}

/// Status a booking moves to when `operation` is applied in `current`.
///
/// Returns `None` when the operation is illegal for that status.
pub fn next_status(current: &BookingStatus, operation: Operation) -> Option<BookingStatus> {
    use BookingStatus::{Accepted, Canceled, Pending, Refused};

    match (current, operation) {
        (Pending, Operation::Modify) => Some(Pending),
        (_, Operation::Modify) => None,
        (Accepted | Canceled, Operation::Accept) => None,
        (_, Operation::Accept) => Some(Accepted),
        (Refused | Canceled, Operation::Refuse) => None,
        (_, Operation::Refuse) => Some(Refused),
        (Refused | Canceled, Operation::Cancel) => None,
        (_, Operation::Cancel) => Some(Canceled),
    }
}

/// Whether `caller` may edit or cancel `booking`.
///
/// The requester and every invited player have the same rights.
pub fn is_participant(booking: &Booking, caller: &Caller) -> bool {
    booking.user_id == caller.id || booking.players.iter().any(|p| *p == caller.username)
}
