//! Route catalog: search over the route store plus admin route edits.
//!
//! The search itself is a pure projection (see [`search`]); [`RouteCatalog`]
//! fetches the collection from the store and gates admin writes behind an
//! allow-list of user ids.

mod criteria;
mod search;

pub use criteria::{InvalidSortKey, PriceRange, SearchCriteria, SortKey};
pub use search::{search, sort_routes};

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{DomainError, Route, RouteDraft, RouteId, UserId};
use crate::store::RouteStore;

/// Read access to routes, and admin-only writes.
#[derive(Clone)]
pub struct RouteCatalog {
    store: Arc<dyn RouteStore>,
    admins: Arc<HashSet<UserId>>,
}

impl RouteCatalog {
    pub fn new(store: Arc<dyn RouteStore>, admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            store,
            admins: Arc::new(admins.into_iter().collect()),
        }
    }

    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admins.contains(user)
    }

    /// Every route, in catalog order.
    pub async fn all(&self) -> Result<Vec<Route>, DomainError> {
        self.store.list().await
    }

    pub async fn get(&self, id: &RouteId) -> Result<Route, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("route", id.as_str()))
    }

    /// Add a route. A missing id is generated.
    pub async fn add_route(
        &self,
        caller: &UserId,
        id: Option<RouteId>,
        draft: RouteDraft,
    ) -> Result<Route, DomainError> {
        self.require_admin(caller)?;
        let route = Route::new(id.unwrap_or_else(RouteId::generate), draft)?;
        self.store.insert(route.clone()).await?;
        tracing::info!(route = %route.id(), admin = %caller, "route added");
        Ok(route)
    }

    /// Replace a route's editable fields.
    ///
    /// Existing bookings hold their own snapshot and are unaffected.
    pub async fn update_route(
        &self,
        caller: &UserId,
        id: &RouteId,
        draft: RouteDraft,
    ) -> Result<Route, DomainError> {
        self.require_admin(caller)?;
        let route = self.get(id).await?.with_draft(draft)?;
        self.store.update(route.clone()).await?;
        tracing::info!(route = %id, admin = %caller, "route updated");
        Ok(route)
    }

    pub async fn delete_route(&self, caller: &UserId, id: &RouteId) -> Result<(), DomainError> {
        self.require_admin(caller)?;
        self.store.delete(id).await?;
        tracing::info!(route = %id, admin = %caller, "route deleted");
        Ok(())
    }

    fn require_admin(&self, caller: &UserId) -> Result<(), DomainError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            tracing::warn!(user = %caller, "non-admin attempted a route change");
            Err(DomainError::forbidden("route changes require an admin"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{draft, route};
    use crate::domain::{Cents, RateBreakdown, TransportType};
    use crate::store::InMemoryRouteStore;

    fn catalog() -> RouteCatalog {
        let store = InMemoryRouteStore::with_routes(vec![
            route("r1", TransportType::Train),
            route("r2", TransportType::Taxi),
        ])
        .unwrap();
        RouteCatalog::new(Arc::new(store), [UserId::new("admin")])
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let err = catalog().get(&RouteId::new("nope")).await.unwrap_err();
        assert_eq!(err.to_string(), "route not found: nope");
    }

    #[tokio::test]
    async fn admin_can_add_update_delete() {
        let catalog = catalog();
        let admin = UserId::new("admin");

        let added = catalog
            .add_route(&admin, None, draft(TransportType::Bus))
            .await
            .unwrap();
        assert!(added.id().as_str().starts_with("route-"));
        assert_eq!(catalog.all().await.unwrap().len(), 3);

        let mut d = draft(TransportType::Bus);
        d.rate_breakdown = RateBreakdown::new(1_000, 100, 0);
        let updated = catalog.update_route(&admin, added.id(), d).await.unwrap();
        assert_eq!(updated.price_cents(), Cents::new(1_100));
        assert_eq!(
            catalog.get(added.id()).await.unwrap().price_cents(),
            Cents::new(1_100)
        );

        catalog.delete_route(&admin, added.id()).await.unwrap();
        assert_eq!(catalog.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let catalog = catalog();
        let user = UserId::new("alice");
        let err = catalog
            .add_route(&user, None, draft(TransportType::Bus))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = catalog
            .delete_route(&user, &RouteId::new("r1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(catalog.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_draft_is_validation_error() {
        let mut d = draft(TransportType::Bus);
        d.destination = "Mumbai".into();
        let err = catalog()
            .add_route(&UserId::new("admin"), Some(RouteId::new("r9")), d)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
