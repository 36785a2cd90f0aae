//! Side-by-side comparison set.
//!
//! Session-scoped: callers own a `CompareSet` and pass it to whatever needs
//! it. Nothing here is global.

use serde::Serialize;

use super::route::{Route, RouteId};

/// Maximum number of routes compared at once.
pub const MAX_COMPARED: usize = 3;

/// Up to three routes in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompareSet {
    routes: Vec<Route>,
}

impl CompareSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Returns `false` if the set is full or already holds
    /// a route with this id.
    pub fn add(&mut self, route: Route) -> bool {
        if !self.can_add_more() || self.contains(route.id()) {
            return false;
        }
        self.routes.push(route);
        true
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &RouteId) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.id() != id);
        self.routes.len() != before
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn contains(&self, id: &RouteId) -> bool {
        self.routes.iter().any(|r| r.id() == id)
    }

    pub fn can_add_more(&self) -> bool {
        self.routes.len() < MAX_COMPARED
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
