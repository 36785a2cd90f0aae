//! Application state for the web layer.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;

use crate::booking::BookingLifecycle;
use crate::catalog::RouteCatalog;
use crate::domain::{CompareSet, UserId};
use crate::payment::{CheckoutConfig, PaymentOrchestrator, PaymentProcessor};
use crate::reviews::ReviewService;
use crate::store::{BookingStore, ReviewStore, RouteStore};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    pub catalog: RouteCatalog,
    pub bookings: BookingLifecycle,
    pub reviews: ReviewService,
    pub payments: PaymentOrchestrator,

    /// Per-caller comparison sets. Session state, never persisted.
    pub compare: CompareSets,

    /// Whether checkout goes to Stripe rather than the mock processor.
    pub stripe_configured: bool,
}

/// Comparison sets keyed by caller, each locked on its own.
pub type CompareSets = Cache<UserId, Arc<Mutex<CompareSet>>>;

/// Callers whose comparison sets are kept at once.
pub const COMPARE_CAPACITY: u64 = 10_000;

/// A comparison set untouched for this long is dropped.
pub const COMPARE_IDLE: Duration = Duration::from_secs(30 * 60);

pub(crate) fn compare_sets(capacity: u64, idle: Duration) -> CompareSets {
    Cache::builder()
        .max_capacity(capacity)
        .time_to_idle(idle)
        .build()
}

/// The record stores behind the services.
pub struct Stores {
    pub routes: Arc<dyn RouteStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl AppState {
    /// Wire the services together over `stores` and `processor`.
    pub fn new(
        stores: Stores,
        processor: Arc<dyn PaymentProcessor>,
        stripe_configured: bool,
        admins: impl IntoIterator<Item = UserId>,
        checkout: CheckoutConfig,
    ) -> Self {
        let catalog = RouteCatalog::new(stores.routes.clone(), admins);
        let bookings = BookingLifecycle::new(stores.bookings.clone(), stores.routes);
        let reviews = ReviewService::new(stores.bookings, stores.reviews);
        let payments = PaymentOrchestrator::new(processor, bookings.clone(), checkout);

        Self {
            catalog,
            bookings,
            reviews,
            payments,
            compare: compare_sets(COMPARE_CAPACITY, COMPARE_IDLE),
            stripe_configured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn compare_sets_are_bounded() {
        let sets = compare_sets(2, COMPARE_IDLE);
        for user in ["a", "b", "c", "d", "e"] {
            sets.insert(UserId::new(user), Arc::default()).await;
        }
        sets.run_pending_tasks().await;
        assert!(sets.entry_count() <= 2);
    }

    #[tokio::test]
    async fn idle_compare_sets_expire() {
        let sets = compare_sets(COMPARE_CAPACITY, Duration::from_millis(50));
        sets.insert(UserId::new("a"), Arc::default()).await;
        assert!(sets.get(&UserId::new("a")).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(sets.get(&UserId::new("a")).await.is_none());
    }
}
