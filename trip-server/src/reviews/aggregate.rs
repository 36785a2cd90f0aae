//! Rating statistics and review eligibility.
//!
//! Everything here is a pure function over records the caller has already
//! fetched. Empty inputs give empty results, never errors.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Booking, BookingId, BookingStatus, DomainError, Review, RouteId, UserId};

/// Count and sum of ratings for one route.
///
/// Kept as integers so the mean is exact until it is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingSummary {
    pub count: u32,
    pub total: u32,
}

impl RatingSummary {
    /// Arithmetic mean of the ratings, or 0 with no reviews.
    ///
    /// Callers should use [`average_rating`], which returns `None` for a
    /// route without reviews, rather than display this 0.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        f64::from(self.total) / f64::from(self.count)
    }

    /// Whether the mean is at least `min`.
    pub fn meets(&self, min: f64) -> bool {
        self.count > 0 && self.average() >= min
    }

    fn add(&mut self, rating: u8) {
        self.count += 1;
        self.total += u32::from(rating);
    }
}

/// Route id to rating summary. Routes without reviews are absent.
pub type RatingIndex = HashMap<RouteId, RatingSummary>;

/// Summary of a route's reviews, or `None` if there are none.
///
/// ```
/// use trip_server::reviews::{average_rating, RatingSummary};
///
/// assert_eq!(average_rating(&[]), None::<RatingSummary>);
/// ```
pub fn average_rating(reviews: &[Review]) -> Option<RatingSummary> {
    if reviews.is_empty() {
        return None;
    }
    let mut summary = RatingSummary::default();
    for review in reviews {
        summary.add(review.rating.get());
    }
    Some(summary)
}

/// Group reviews by route into an index.
pub fn index_by_route<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> RatingIndex {
    let mut index = RatingIndex::new();
    for review in reviews {
        index
            .entry(review.route_id.clone())
            .or_default()
            .add(review.rating.get());
    }
    index
}

/// Check that `user` may review `booking`, with the precise failure.
///
/// `existing` is the review already recorded for this booking, if any.
pub fn check_eligibility<'a>(
    user: &UserId,
    booking_id: &BookingId,
    booking: Option<&'a Booking>,
    existing: Option<&Review>,
) -> Result<&'a Booking, DomainError> {
    let booking = booking.ok_or_else(|| DomainError::not_found("booking", booking_id.as_str()))?;

    if !booking.is_owned_by(user) {
        return Err(DomainError::forbidden(
            "only the traveler who made a booking can review it",
        ));
    }

    if booking.status() != BookingStatus::Completed {
        return Err(DomainError::InvalidTransition(format!(
            "only completed bookings can be reviewed; booking is {}",
            booking.status()
        )));
    }

    if existing.is_some() {
        return Err(DomainError::validation("booking has already been reviewed"));
    }

    Ok(booking)
}

/// Whether `user` may review the booking `booking_id`.
pub fn is_eligible(
    user: &UserId,
    booking_id: &BookingId,
    bookings: &[Booking],
    reviews: &[Review],
) -> bool {
    let booking = bookings.iter().find(|b| b.id() == booking_id);
    let existing = reviews.iter().find(|r| &r.booking_id == booking_id);
    check_eligibility(user, booking_id, booking, existing).is_ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Rating, ReviewId, Timestamp};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn average_within_bounds(ratings in prop::collection::vec(1i64..=5, 1..50)) {
            let reviews: Vec<Review> = ratings
                .iter()
                .enumerate()
                .map(|(i, r)| Review {
                    id: ReviewId::new(format!("rev-{i}")),
                    booking_id: BookingId::new(format!("b{i}")),
                    route_id: RouteId::new("r1"),
                    user: UserId::new("u"),
                    rating: Rating::new(*r).unwrap(),
                    review_text: String::new(),
                    timestamp: Timestamp::EPOCH,
                })
                .collect();
            let summary = average_rating(&reviews).unwrap();
            prop_assert_eq!(summary.count as usize, ratings.len());
            let avg = summary.average();
            prop_assert!((1.0..=5.0).contains(&avg));
        }
    }
}
