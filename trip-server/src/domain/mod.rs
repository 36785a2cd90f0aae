//! Domain types for trip booking.
//!
//! This module contains the validated value types shared by every
//! component: money, instants, routes, selections, bookings and reviews.
//! Types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod booking;
mod compare;
mod error;
mod money;
mod review;
mod route;
mod selection;
mod time;

pub use booking::{Booking, BookingId, BookingStatus, UserId};
pub use compare::{CompareSet, MAX_COMPARED};
pub use error::DomainError;
pub use money::{Cents, Multiplier};
pub use review::{InvalidRating, Rating, Review, ReviewId};
pub use route::{InvalidTransportType, RateBreakdown, Route, RouteDraft, RouteId, TransportType};
pub use selection::{
    InvalidSeat, InvalidVehicleClass, SEATS_PER_ROW, SeatId, SeatMap, Selection, VehicleClass,
};
pub use time::Timestamp;

#[cfg(test)]
pub(crate) mod fixtures {
    pub use super::booking::fixtures::*;
    pub use super::route::fixtures::*;
}
