//! Reviews: rating statistics, eligibility, and submission.

mod aggregate;

pub use aggregate::{
    RatingIndex, RatingSummary, average_rating, check_eligibility, index_by_route, is_eligible,
};

use std::sync::Arc;

use futures::future::try_join_all;

use crate::domain::{BookingId, DomainError, Rating, Review, ReviewId, RouteId, Timestamp, UserId};
use crate::store::{BookingStore, ReviewStore};

/// Review submission and per-route lookups over the record stores.
#[derive(Clone)]
pub struct ReviewService {
    bookings: Arc<dyn BookingStore>,
    reviews: Arc<dyn ReviewStore>,
}

impl ReviewService {
    pub fn new(bookings: Arc<dyn BookingStore>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self { bookings, reviews }
    }

    /// Check whether `user` may review `booking_id`, returning the reason
    /// if not.
    pub async fn eligibility(
        &self,
        user: &UserId,
        booking_id: &BookingId,
    ) -> Result<(), DomainError> {
        let booking = self.bookings.get(booking_id).await?;
        let existing = self.reviews.for_booking(booking_id).await?;
        check_eligibility(user, booking_id, booking.as_ref(), existing.as_ref())?;
        Ok(())
    }

    /// Record a review for a completed booking the caller owns.
    pub async fn submit(
        &self,
        user: &UserId,
        booking_id: &BookingId,
        rating: Rating,
        review_text: String,
    ) -> Result<Review, DomainError> {
        let booking = self.bookings.get(booking_id).await?;
        let existing = self.reviews.for_booking(booking_id).await?;
        let booking = check_eligibility(user, booking_id, booking.as_ref(), existing.as_ref())?;

        let review = Review {
            id: ReviewId::generate(),
            booking_id: booking_id.clone(),
            route_id: booking.route().id().clone(),
            user: user.clone(),
            rating,
            review_text,
            timestamp: Timestamp::now(),
        };
        self.reviews.insert(review.clone()).await?;

        tracing::info!(
            review = %review.id,
            booking = %booking_id,
            route = %review.route_id,
            rating = rating.get(),
            "review submitted"
        );
        Ok(review)
    }

    /// Reviews for a route, oldest first.
    pub async fn reviews_for_route(&self, route: &RouteId) -> Result<Vec<Review>, DomainError> {
        self.reviews.for_route(route).await
    }

    /// Rating summary for one route, `None` without reviews.
    pub async fn summary_for_route(
        &self,
        route: &RouteId,
    ) -> Result<Option<RatingSummary>, DomainError> {
        let reviews = self.reviews.for_route(route).await?;
        Ok(average_rating(&reviews))
    }

    /// Rating index over `routes`, fetching each route's reviews concurrently.
    pub async fn rating_index(&self, routes: &[RouteId]) -> Result<RatingIndex, DomainError> {
        let per_route = try_join_all(routes.iter().map(|id| self.reviews.for_route(id))).await?;
        Ok(index_by_route(per_route.iter().flatten()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::booking;
    use crate::domain::BookingStatus;
    use crate::store::{InMemoryBookingStore, InMemoryReviewStore};

    async fn service_with(bookings: &[(&str, &str, BookingStatus)]) -> ReviewService {
        let store = InMemoryBookingStore::new();
        for (id, user, status) in bookings {
            store.insert(booking(id, user)).await.unwrap();
            if *status != BookingStatus::Confirmed {
                store
                    .transition(&BookingId::new(*id), *status)
                    .await
                    .unwrap();
            }
        }
        ReviewService::new(Arc::new(store), Arc::new(InMemoryReviewStore::new()))
    }

    fn rating(v: i64) -> Rating {
        Rating::new(v).unwrap()
    }

    #[tokio::test]
    async fn submit_for_completed_booking() {
        let service = service_with(&[("b1", "alice", BookingStatus::Completed)]).await;
        let alice = UserId::new("alice");
        let id = BookingId::new("b1");

        service.eligibility(&alice, &id).await.unwrap();
        let review = service
            .submit(&alice, &id, rating(4), "Smooth ride".into())
            .await
            .unwrap();
        assert_eq!(review.route_id, RouteId::new("r1"));
        assert!(review.id.as_str().starts_with("review-"));

        let err = service.eligibility(&alice, &id).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn submit_for_confirmed_booking_is_invalid_transition() {
        let service = service_with(&[("b1", "alice", BookingStatus::Confirmed)]).await;
        let err = service
            .submit(&UserId::new("alice"), &BookingId::new("b1"), rating(5), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn submit_for_someone_elses_booking_is_forbidden() {
        let service = service_with(&[("b1", "bob", BookingStatus::Completed)]).await;
        let err = service
            .submit(&UserId::new("alice"), &BookingId::new("b1"), rating(5), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn route_summary_and_index() {
        let service = service_with(&[
            ("b1", "alice", BookingStatus::Completed),
            ("b2", "bob", BookingStatus::Completed),
        ])
        .await;
        service
            .submit(&UserId::new("alice"), &BookingId::new("b1"), rating(5), String::new())
            .await
            .unwrap();
        service
            .submit(&UserId::new("bob"), &BookingId::new("b2"), rating(2), String::new())
            .await
            .unwrap();

        let r1 = RouteId::new("r1");
        let summary = service.summary_for_route(&r1).await.unwrap().unwrap();
        assert_eq!(summary.average(), 3.5);
        assert_eq!(service.reviews_for_route(&r1).await.unwrap().len(), 2);

        let index = service
            .rating_index(&[r1.clone(), RouteId::new("r2")])
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[&r1].count, 2);
        assert_eq!(
            service.summary_for_route(&RouteId::new("r2")).await.unwrap(),
            None
        );
    }
}
