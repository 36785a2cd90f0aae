//! Read-through cache for the route catalog.
//!
//! Search reads the whole catalog on every request. The listing is cached
//! under a single key with a short TTL; any write through this wrapper
//! invalidates it, and single-route reads always go to the inner store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;

use crate::domain::{DomainError, Route, RouteId};

use super::RouteStore;

/// Configuration for the route cache.
#[derive(Debug, Clone)]
pub struct RouteCacheConfig {
    /// TTL for the cached listing.
    pub ttl: Duration,

    /// Maximum number of cached listings.
    pub max_capacity: u64,
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 16,
        }
    }
}

impl RouteCacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A [`RouteStore`] that caches `list()`.
pub struct CachedRouteStore<S> {
    inner: S,
    listing: MokaCache<(), Arc<Vec<Route>>>,
    /// Held shared while a miss loads and caches, exclusively across a write
    /// and its invalidation.
    gate: RwLock<()>,
}

impl<S: RouteStore> CachedRouteStore<S> {
    pub fn new(inner: S, config: &RouteCacheConfig) -> Self {
        let listing = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        Self {
            inner,
            listing,
            gate: RwLock::new(()),
        }
    }

    /// Drop the cached listing.
    pub async fn invalidate(&self) {
        self.listing.invalidate(&()).await;
    }

    /// Number of cached listings (0 or 1).
    pub fn entry_count(&self) -> u64 {
        self.listing.entry_count()
    }
}

#[async_trait]
impl<S: RouteStore> RouteStore for CachedRouteStore<S> {
    async fn list(&self) -> Result<Vec<Route>, DomainError> {
        if let Some(cached) = self.listing.get(&()).await {
            return Ok(cached.as_ref().clone());
        }

        let _gate = self.gate.read().await;
        let routes = self
            .listing
            .try_get_with((), async {
                let routes = self.inner.list().await?;
                tracing::debug!(count = routes.len(), "route listing cache miss");
                Ok::<_, DomainError>(Arc::new(routes))
            })
            .await
            .map_err(|e| (*e).clone())?;
        Ok(routes.as_ref().clone())
    }

    async fn get(&self, id: &RouteId) -> Result<Option<Route>, DomainError> {
        self.inner.get(id).await
    }

    async fn insert(&self, route: Route) -> Result<(), DomainError> {
        let _gate = self.gate.write().await;
        let result = self.inner.insert(route).await;
        self.listing.invalidate(&()).await;
        result
    }

    async fn update(&self, route: Route) -> Result<(), DomainError> {
        let _gate = self.gate.write().await;
        let result = self.inner.update(route).await;
        self.listing.invalidate(&()).await;
        result
    }

    async fn delete(&self, id: &RouteId) -> Result<(), DomainError> {
        let _gate = self.gate.write().await;
        let result = self.inner.delete(id).await;
        self.listing.invalidate(&()).await;
        result
    }
}
