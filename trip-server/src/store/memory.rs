//! In-memory stores.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Booking, BookingId, BookingStatus, DomainError, Review, Route, RouteId, UserId,
};

use super::{BookingStore, ReviewStore, RouteStore};

/// Routes held in a vector so listing preserves catalog order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRouteStore {
    routes: Arc<RwLock<Vec<Route>>>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `routes`. Duplicate ids are rejected.
    pub fn with_routes(routes: Vec<Route>) -> Result<Self, DomainError> {
        for (i, route) in routes.iter().enumerate() {
            if routes[..i].iter().any(|r| r.id() == route.id()) {
                return Err(DomainError::validation(format!(
                    "duplicate route id {}",
                    route.id()
                )));
            }
        }
        Ok(Self {
            routes: Arc::new(RwLock::new(routes)),
        })
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn list(&self) -> Result<Vec<Route>, DomainError> {
        Ok(self.routes.read().await.clone())
    }

    async fn get(&self, id: &RouteId) -> Result<Option<Route>, DomainError> {
        let routes = self.routes.read().await;
        Ok(routes.iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, route: Route) -> Result<(), DomainError> {
        let mut routes = self.routes.write().await;
        if routes.iter().any(|r| r.id() == route.id()) {
            return Err(DomainError::validation(format!(
                "route {} already exists",
                route.id()
            )));
        }
        routes.push(route);
        Ok(())
    }

    async fn update(&self, route: Route) -> Result<(), DomainError> {
        let mut routes = self.routes.write().await;
        let slot = routes
            .iter_mut()
            .find(|r| r.id() == route.id())
            .ok_or_else(|| DomainError::not_found("route", route.id().as_str()))?;
        *slot = route;
        Ok(())
    }

    async fn delete(&self, id: &RouteId) -> Result<(), DomainError> {
        let mut routes = self.routes.write().await;
        let index = routes
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| DomainError::not_found("route", id.as_str()))?;
        routes.remove(index);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: Booking) -> Result<(), DomainError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(booking.id()) {
            return Err(DomainError::validation(format!(
                "booking {} already exists",
                booking.id()
            )));
        }
        bookings.insert(booking.id().clone(), booking);
        Ok(())
    }

    async fn get(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.bookings.read().await.get(id).cloned())
    }

    async fn transition(
        &self,
        id: &BookingId,
        target: BookingStatus,
    ) -> Result<Booking, DomainError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("booking", id.as_str()))?;
        booking.transition_to(target)?;
        Ok(booking.clone())
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| b.is_owned_by(user))
            .cloned()
            .collect())
    }
}

/// Reviews keyed by booking id, which also enforces one review per booking.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReviewStore {
    reviews: Arc<RwLock<HashMap<BookingId, Review>>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn insert(&self, review: Review) -> Result<(), DomainError> {
        let mut reviews = self.reviews.write().await;
        if reviews.contains_key(&review.booking_id) {
            return Err(DomainError::validation(format!(
                "booking {} has already been reviewed",
                review.booking_id
            )));
        }
        reviews.insert(review.booking_id.clone(), review);
        Ok(())
    }

    async fn for_booking(&self, booking: &BookingId) -> Result<Option<Review>, DomainError> {
        Ok(self.reviews.read().await.get(booking).cloned())
    }

    async fn for_route(&self, route: &RouteId) -> Result<Vec<Review>, DomainError> {
        let reviews = self.reviews.read().await;
        let mut found: Vec<Review> = reviews
            .values()
            .filter(|r| &r.route_id == route)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.timestamp);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{booking, route};
    use crate::domain::{Rating, ReviewId, Timestamp, TransportType};

    fn review(booking: &str, route: &str, rating: i64, at: i64) -> Review {
        Review {
            id: ReviewId::new(format!("rev-{booking}")),
            booking_id: BookingId::new(booking),
            route_id: RouteId::new(route),
            user: UserId::new("alice"),
            rating: Rating::new(rating).unwrap(),
            review_text: String::new(),
            timestamp: Timestamp::from_nanos(at),
        }
    }

    #[tokio::test]
    async fn routes_keep_catalog_order() {
        let store = InMemoryRouteStore::new();
        for id in ["c", "a", "b"] {
            store.insert(route(id, TransportType::Bus)).await.unwrap();
        }
        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().as_str().to_string())
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn route_insert_rejects_duplicate() {
        let store = InMemoryRouteStore::new();
        store.insert(route("a", TransportType::Bus)).await.unwrap();
        let err = store.insert(route("a", TransportType::Taxi)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn route_update_and_delete_missing_is_not_found() {
        let store = InMemoryRouteStore::new();
        let err = store.update(route("x", TransportType::Bus)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        let err = store.delete(&RouteId::new("x")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn route_update_keeps_position() {
        let store = InMemoryRouteStore::with_routes(vec![
            route("a", TransportType::Bus),
            route("b", TransportType::Bus),
        ])
        .unwrap();
        store.update(route("a", TransportType::Taxi)).await.unwrap();
        let routes = store.list().await.unwrap();
        assert_eq!(routes[0].id().as_str(), "a");
        assert_eq!(routes[0].transport_type(), TransportType::Taxi);
    }

    #[test]
    fn with_routes_rejects_duplicates() {
        let err = InMemoryRouteStore::with_routes(vec![
            route("a", TransportType::Bus),
            route("a", TransportType::Bus),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "validation failed: duplicate route id a");
    }

    #[tokio::test]
    async fn booking_transition_is_checked_against_stored_status() {
        let store = InMemoryBookingStore::new();
        store.insert(booking("b1", "alice")).await.unwrap();
        let id = BookingId::new("b1");

        let updated = store.transition(&id, BookingStatus::Cancelled).await.unwrap();
        assert_eq!(updated.status(), BookingStatus::Cancelled);

        let err = store.transition(&id, BookingStatus::Cancelled).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn booking_transition_missing_is_not_found() {
        let store = InMemoryBookingStore::new();
        let err = store
            .transition(&BookingId::new("nope"), BookingStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn bookings_listed_per_user() {
        let store = InMemoryBookingStore::new();
        store.insert(booking("b1", "alice")).await.unwrap();
        store.insert(booking("b2", "bob")).await.unwrap();
        store.insert(booking("b3", "alice")).await.unwrap();
        let mut ids: Vec<_> = store
            .list_for_user(&UserId::new("alice"))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id().as_str().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, ["b1", "b3"]);
    }

    #[tokio::test]
    async fn one_review_per_booking() {
        let store = InMemoryReviewStore::new();
        store.insert(review("b1", "r1", 4, 10)).await.unwrap();
        let err = store.insert(review("b1", "r1", 5, 20)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn reviews_for_route_oldest_first() {
        let store = InMemoryReviewStore::new();
        store.insert(review("b2", "r1", 3, 20)).await.unwrap();
        store.insert(review("b1", "r1", 5, 10)).await.unwrap();
        store.insert(review("b3", "r2", 1, 5)).await.unwrap();

        let found = store.for_route(&RouteId::new("r1")).await.unwrap();
        let bookings: Vec<_> = found.iter().map(|r| r.booking_id.as_str()).collect();
        assert_eq!(bookings, ["b1", "b2"]);
        assert!(store.for_route(&RouteId::new("r9")).await.unwrap().is_empty());
    }
}
