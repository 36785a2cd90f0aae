//! Advisory cancellation notice.
//!
//! Cancelling close to departure may incur a fee under the operator's
//! policy. That policy lives elsewhere; this only tells the traveler
//! whether they are inside the window. It never blocks a cancel.

use chrono::Duration;
use serde::Serialize;

use crate::domain::{Booking, BookingStatus, Timestamp};

/// Hours before departure inside which a fee may apply.
pub const CANCELLATION_CUTOFF_HOURS: i64 = 24;

const FEE_MESSAGE: &str = "Cancellations within 24 hours may incur a cancellation fee";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationNotice {
    /// Next scheduled departure of the booked route after `now`.
    pub next_departure: Option<Timestamp>,
    /// Whether that departure is within the cutoff.
    pub fee_may_apply: bool,
    pub message: Option<&'static str>,
}

/// Build the notice for cancelling `booking` at `now`.
///
/// Only a confirmed booking with an upcoming departure inside the cutoff
/// carries a message.
pub fn cancellation_notice(booking: &Booking, now: Timestamp) -> CancellationNotice {
    let next_departure = booking.route().next_departure_after(now);
    let cutoff = now.saturating_add(Duration::hours(CANCELLATION_CUTOFF_HOURS));
    let fee_may_apply = booking.status() == BookingStatus::Confirmed
        && next_departure.is_some_and(|departure| departure <= cutoff);

    CancellationNotice {
        next_departure,
        fee_may_apply,
        message: fee_may_apply.then_some(FEE_MESSAGE),
    }
}
