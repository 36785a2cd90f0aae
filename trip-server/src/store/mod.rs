//! Record stores for routes, bookings and reviews.
//!
//! The stores are the single source of truth. Each trait method is atomic
//! for one record; nothing here spans records. Missing ids on update or
//! delete are `NotFound`.
//!
//! Adapters:
//! - [`memory`]: `RwLock`-guarded maps, used by the server and tests
//! - [`seed`]: loads an initial route catalog from a JSON file
//! - [`cached`]: a moka-backed read-through cache over any [`RouteStore`]

mod cached;
mod error;
mod memory;
mod seed;

pub use cached::{CachedRouteStore, RouteCacheConfig};
pub use error::StoreError;
pub use memory::{InMemoryBookingStore, InMemoryReviewStore, InMemoryRouteStore};
pub use seed::{load_routes, parse_routes};

use async_trait::async_trait;

use crate::domain::{
    Booking, BookingId, BookingStatus, DomainError, Review, Route, RouteId, UserId,
};

/// Route records, in catalog order.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// All routes, in the order they were added.
    async fn list(&self) -> Result<Vec<Route>, DomainError>;

    async fn get(&self, id: &RouteId) -> Result<Option<Route>, DomainError>;

    /// Add a new route. Fails with `Validation` if the id is taken.
    async fn insert(&self, route: Route) -> Result<(), DomainError>;

    /// Replace an existing route, keeping its catalog position.
    async fn update(&self, route: Route) -> Result<(), DomainError>;

    async fn delete(&self, id: &RouteId) -> Result<(), DomainError>;
}

/// Booking records. Bookings are never deleted.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Add a new booking. Fails with `Validation` if the id is taken.
    async fn insert(&self, booking: Booking) -> Result<(), DomainError>;

    async fn get(&self, id: &BookingId) -> Result<Option<Booking>, DomainError>;

    /// Apply a status transition to the stored record under one write.
    ///
    /// The transition is checked against the status held by the store, not
    /// a copy the caller read earlier.
    async fn transition(
        &self,
        id: &BookingId,
        target: BookingStatus,
    ) -> Result<Booking, DomainError>;

    /// Bookings owned by `user`, in no particular order.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Booking>, DomainError>;
}

/// Review records. Reviews are immutable once inserted.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Add a review. Fails with `Validation` if the booking already has one.
    async fn insert(&self, review: Review) -> Result<(), DomainError>;

    async fn for_booking(&self, booking: &BookingId) -> Result<Option<Review>, DomainError>;

    async fn for_route(&self, route: &RouteId) -> Result<Vec<Review>, DomainError>;
}
