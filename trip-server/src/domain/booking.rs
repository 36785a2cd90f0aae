//! Bookings and their status machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::money::Cents;
use super::route::Route;
use super::selection::Selection;
use super::time::Timestamp;

/// Opaque caller identity supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Booking identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id.
    pub fn generate() -> Self {
        Self(format!("booking-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a booking.
///
/// `Confirmed` is the only non-terminal state:
///
/// ```text
/// confirmed ──► completed
///     │
///     └──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        match self {
            BookingStatus::Confirmed => false,
            BookingStatus::Completed | BookingStatus::Cancelled => true,
        }
    }

    /// The status after moving to `target`, or `InvalidTransition`.
    pub fn transition(self, target: BookingStatus) -> Result<BookingStatus, DomainError> {
        match (self, target) {
            (BookingStatus::Confirmed, BookingStatus::Completed)
            | (BookingStatus::Confirmed, BookingStatus::Cancelled) => Ok(target),
            (from, to) if from == to => Err(DomainError::InvalidTransition(format!(
                "booking is already {}",
                from.as_str()
            ))),
            (from, BookingStatus::Cancelled) => Err(DomainError::InvalidTransition(format!(
                "cannot cancel a {} booking",
                from.as_str()
            ))),
            (from, BookingStatus::Completed) => Err(DomainError::InvalidTransition(format!(
                "cannot complete a {} booking",
                from.as_str()
            ))),
            (from, BookingStatus::Confirmed) => Err(DomainError::InvalidTransition(format!(
                "cannot reconfirm a {} booking",
                from.as_str()
            ))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's reservation against a route snapshot.
///
/// The route is copied by value at creation, so later edits or deletion of
/// the catalog route never change a historical booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    user: UserId,
    route: Route,
    selection: Selection,
    booking_time: Timestamp,
    status: BookingStatus,
    cost_in_stripe_cents: Cents,
}

impl Booking {
    /// A freshly confirmed booking.
    pub fn confirmed(
        id: BookingId,
        user: UserId,
        route: Route,
        selection: Selection,
        booking_time: Timestamp,
        cost_in_stripe_cents: Cents,
    ) -> Self {
        Self {
            id,
            user,
            route,
            selection,
            booking_time,
            status: BookingStatus::Confirmed,
            cost_in_stripe_cents,
        }
    }

    pub fn id(&self) -> &BookingId {
        &self.id
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn booking_time(&self) -> Timestamp {
        self.booking_time
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn cost_in_stripe_cents(&self) -> Cents {
        self.cost_in_stripe_cents
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user == user
    }

    /// Move to `target` if the status machine allows it.
    pub fn transition_to(&mut self, target: BookingStatus) -> Result<(), DomainError> {
        self.status = self.status.transition(target)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::route::fixtures::route;
    use crate::domain::{SeatId, TransportType};

    pub fn booking(id: &str, user: &str) -> Booking {
        Booking::confirmed(
            BookingId::new(id),
            UserId::new(user),
            route("r1", TransportType::Train),
            Selection::Seats(vec![SeatId::parse("4A").unwrap()]),
            Timestamp::from_nanos(500),
            Cents::new(140_000),
        )
    }
}
