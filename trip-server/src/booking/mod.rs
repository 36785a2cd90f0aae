//! Booking lifecycle.
//!
//! Creates bookings against a route snapshot after re-quoting the fare,
//! and moves them through the status machine defined on
//! [`BookingStatus`]:
//!
//! - `confirmed` on creation
//! - `cancelled` by the owning traveler
//! - `completed` by an external settlement signal
//!
//! Every transition is applied by the store against the status it holds,
//! so two racing cancels produce one success and one `InvalidTransition`.

mod notice;

pub use notice::{CANCELLATION_CUTOFF_HOURS, CancellationNotice, cancellation_notice};

use std::sync::Arc;

use crate::domain::{
    Booking, BookingId, BookingStatus, Cents, DomainError, Route, RouteId, Selection, Timestamp,
    UserId,
};
use crate::pricing::quote_selection;
use crate::store::{BookingStore, RouteStore};

/// Booking creation and status transitions over the record stores.
#[derive(Clone)]
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingStore>,
    routes: Arc<dyn RouteStore>,
}

impl BookingLifecycle {
    pub fn new(bookings: Arc<dyn BookingStore>, routes: Arc<dyn RouteStore>) -> Self {
        Self { bookings, routes }
    }

    /// Book `selection` on `route` for `user`.
    ///
    /// `quoted_total` is the total the traveler was shown. It must equal a
    /// fresh quote for the same route and selection.
    pub async fn create(
        &self,
        user: &UserId,
        route: &Route,
        selection: &Selection,
        quoted_total: Cents,
    ) -> Result<Booking, DomainError> {
        selection.validate_for(route.transport_type())?;

        let quote = quote_selection(route, selection);
        if quote.is_incomplete() {
            return Err(DomainError::validation(
                "select at least one seat before booking",
            ));
        }
        if quote.total != quoted_total {
            tracing::warn!(
                route = %route.id(),
                quoted = %quoted_total,
                expected = %quote.total,
                "quoted total does not match current fare"
            );
            return Err(DomainError::validation(format!(
                "quoted total {quoted_total} does not match current fare {}",
                quote.total
            )));
        }

        let booking = Booking::confirmed(
            BookingId::generate(),
            user.clone(),
            route.clone(),
            selection.clone(),
            Timestamp::now(),
            quote.total,
        );
        self.bookings.insert(booking.clone()).await?;

        tracing::info!(
            booking = %booking.id(),
            user = %user,
            route = %route.id(),
            total = %quote.total,
            "booking created"
        );
        Ok(booking)
    }

    /// As [`create`](Self::create), resolving the route by id.
    pub async fn create_for_route(
        &self,
        user: &UserId,
        route_id: &RouteId,
        selection: &Selection,
        quoted_total: Cents,
    ) -> Result<Booking, DomainError> {
        let route = self
            .routes
            .get(route_id)
            .await?
            .ok_or_else(|| DomainError::not_found("route", route_id.as_str()))?;
        self.create(user, &route, selection, quoted_total).await
    }

    /// Cancel a confirmed booking owned by `caller`.
    pub async fn cancel(&self, id: &BookingId, caller: &UserId) -> Result<Booking, DomainError> {
        self.get_owned(id, caller).await?;
        let booking = self.bookings.transition(id, BookingStatus::Cancelled).await?;
        tracing::info!(booking = %id, user = %caller, "booking cancelled");
        Ok(booking)
    }

    /// Mark a confirmed booking completed. Triggered by trip settlement,
    /// not by the traveler.
    pub async fn mark_completed(&self, id: &BookingId) -> Result<Booking, DomainError> {
        let booking = self.bookings.transition(id, BookingStatus::Completed).await?;
        tracing::info!(booking = %id, "booking completed");
        Ok(booking)
    }

    pub async fn get(&self, id: &BookingId) -> Result<Booking, DomainError> {
        self.bookings
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("booking", id.as_str()))
    }

    /// Fetch a booking, failing with `Forbidden` unless `caller` owns it.
    pub async fn get_owned(&self, id: &BookingId, caller: &UserId) -> Result<Booking, DomainError> {
        let booking = self.get(id).await?;
        if !booking.is_owned_by(caller) {
            return Err(DomainError::forbidden("booking belongs to another user"));
        }
        Ok(booking)
    }

    /// The caller's bookings, newest first.
    pub async fn list_for_user(&self, user: &UserId) -> Result<Vec<Booking>, DomainError> {
        let mut bookings = self.bookings.list_for_user(user).await?;
        bookings.sort_by(|a, b| {
            b.booking_time()
                .cmp(&a.booking_time())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::route;
    use crate::domain::{SeatId, TransportType, VehicleClass};
    use crate::store::{InMemoryBookingStore, InMemoryRouteStore};

    fn lifecycle() -> BookingLifecycle {
        let routes = InMemoryRouteStore::with_routes(vec![
            route("train", TransportType::Train),
            route("taxi", TransportType::Taxi),
        ])
        .unwrap();
        BookingLifecycle::new(Arc::new(InMemoryBookingStore::new()), Arc::new(routes))
    }

    fn seats(ids: &[&str]) -> Selection {
        Selection::Seats(ids.iter().map(|s| SeatId::parse(s).unwrap()).collect())
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[tokio::test]
    async fn create_snapshots_route_and_confirms() {
        let lifecycle = lifecycle();
        let booking = lifecycle
            .create_for_route(
                &alice(),
                &RouteId::new("train"),
                &seats(&["4A", "4B", "4C"]),
                Cents::new(420_000),
            )
            .await
            .unwrap();
        assert_eq!(booking.status(), BookingStatus::Confirmed);
        assert_eq!(booking.cost_in_stripe_cents(), Cents::new(420_000));
        assert_eq!(booking.route().id().as_str(), "train");
        assert_eq!(lifecycle.get(booking.id()).await.unwrap(), booking);
    }

    #[tokio::test]
    async fn create_taxi_suv() {
        let booking = lifecycle()
            .create_for_route(
                &alice(),
                &RouteId::new("taxi"),
                &Selection::Vehicle(VehicleClass::Suv),
                Cents::new(210_000),
            )
            .await
            .unwrap();
        assert_eq!(booking.cost_in_stripe_cents(), Cents::new(210_000));
    }

    #[tokio::test]
    async fn tampered_total_is_rejected() {
        let lifecycle = lifecycle();
        let err = lifecycle
            .create_for_route(
                &alice(),
                &RouteId::new("train"),
                &seats(&["4A"]),
                Cents::new(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(lifecycle.list_for_user(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn incomplete_selection_is_rejected() {
        let err = lifecycle()
            .create_for_route(&alice(), &RouteId::new("train"), &seats(&[]), Cents::ZERO)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: select at least one seat before booking"
        );
    }

    #[tokio::test]
    async fn wrong_selection_kind_is_rejected() {
        let err = lifecycle()
            .create_for_route(
                &alice(),
                &RouteId::new("taxi"),
                &seats(&["4A"]),
                Cents::new(140_000),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let err = lifecycle()
            .create_for_route(
                &alice(),
                &RouteId::new("nope"),
                &seats(&["4A"]),
                Cents::new(140_000),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    async fn booked(lifecycle: &BookingLifecycle) -> Booking {
        lifecycle
            .create_for_route(
                &alice(),
                &RouteId::new("train"),
                &seats(&["4A"]),
                Cents::new(140_000),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cancel_twice_fails_second_time() {
        let lifecycle = lifecycle();
        let booking = booked(&lifecycle).await;

        let cancelled = lifecycle.cancel(booking.id(), &alice()).await.unwrap();
        assert_eq!(cancelled.status(), BookingStatus::Cancelled);

        let err = lifecycle.cancel(booking.id(), &alice()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(
            lifecycle.get(booking.id()).await.unwrap().status(),
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn cancel_by_other_user_is_forbidden() {
        let lifecycle = lifecycle();
        let booking = booked(&lifecycle).await;
        let err = lifecycle
            .cancel(booking.id(), &UserId::new("mallory"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(
            lifecycle.get(booking.id()).await.unwrap().status(),
            BookingStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn cancel_missing_is_not_found() {
        let err = lifecycle()
            .cancel(&BookingId::new("nope"), &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn completed_booking_cannot_be_cancelled() {
        let lifecycle = lifecycle();
        let booking = booked(&lifecycle).await;
        lifecycle.mark_completed(booking.id()).await.unwrap();

        let err = lifecycle.cancel(booking.id(), &alice()).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot cancel a completed booking");

        let err = lifecycle.mark_completed(booking.id()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn list_newest_first() {
        let lifecycle = lifecycle();
        let first = booked(&lifecycle).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = booked(&lifecycle).await;

        let listed = lifecycle.list_for_user(&alice()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|b| b.id().clone()).collect();
        assert_eq!(ids, [second.id().clone(), first.id().clone()]);
        assert!(
            lifecycle
                .list_for_user(&UserId::new("bob"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn route_edits_do_not_touch_bookings() {
        let routes = Arc::new(InMemoryRouteStore::new());
        routes.insert(route("train", TransportType::Train)).await.unwrap();
        let lifecycle =
            BookingLifecycle::new(Arc::new(InMemoryBookingStore::new()), routes.clone());
        let booking = booked(&lifecycle).await;

        routes.delete(&RouteId::new("train")).await.unwrap();
        let stored = lifecycle.get(booking.id()).await.unwrap();
        assert_eq!(stored.route().origin(), "Mumbai");
        assert_eq!(stored.route().price_cents(), Cents::new(140_000));
    }
}
