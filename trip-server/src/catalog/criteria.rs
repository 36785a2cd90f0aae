//! Search criteria for the route catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Route, Timestamp, TransportType};

/// Error returned when parsing an unknown sort key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort key: {0:?} (expected price-asc, price-desc, departure or duration)")]
pub struct InvalidSortKey(String);

/// Result ordering. Every key sorts stably, so ties keep catalog order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    PriceAsc,
    PriceDesc,
    /// Earliest scheduled departure first; unscheduled routes sort first.
    Departure,
    Duration,
}

impl SortKey {
    /// Parse a kebab-case sort tag.
    ///
    /// ```
    /// use trip_server::catalog::SortKey;
    ///
    /// assert_eq!(SortKey::parse("price-desc").unwrap(), SortKey::PriceDesc);
    /// assert!(SortKey::parse("rating").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidSortKey> {
        match s {
            "price-asc" => Ok(SortKey::PriceAsc),
            "price-desc" => Ok(SortKey::PriceDesc),
            "departure" => Ok(SortKey::Departure),
            "duration" => Ok(SortKey::Duration),
            other => Err(InvalidSortKey(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::Departure => "departure",
            SortKey::Duration => "duration",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds on `price_cents`. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Cents>,
    pub max: Option<Cents>,
}

impl PriceRange {
    pub fn new(min: Option<Cents>, max: Option<Cents>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: Cents) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }
}

/// Conjunctive route filters plus a sort key.
///
/// Every filter is optional; the default matches everything and sorts by
/// price ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    /// Case-insensitive substring of the origin city.
    pub origin: Option<String>,
    /// Case-insensitive substring of the destination city.
    pub destination: Option<String>,
    /// The single search-mode filter.
    pub mode: Option<TransportType>,
    /// Multi-select mode filter. Empty means any.
    pub modes: Vec<TransportType>,
    pub price: PriceRange,
    /// Minimum average rating. Values of 0 or below disable the filter.
    pub min_rating: Option<f64>,
    /// Case-insensitive substring of the operator name.
    pub operator: Option<String>,
    /// Keep routes with a departure at or after this instant.
    pub departing_from: Option<Timestamp>,
    /// Keep routes with a departure at or before this instant.
    pub departing_to: Option<Timestamp>,
    pub sort: SortKey,
}

impl SearchCriteria {
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_mode(mut self, mode: TransportType) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_modes(mut self, modes: impl IntoIterator<Item = TransportType>) -> Self {
        self.modes = modes.into_iter().collect();
        self
    }

    pub fn with_price(mut self, price: PriceRange) -> Self {
        self.price = price;
        self
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Require one departure inside `[from, to]`. Either end may be open.
    pub fn with_departures(mut self, from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        self.departing_from = from;
        self.departing_to = to;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// The minimum rating, if it actually filters anything.
    pub(crate) fn rating_floor(&self) -> Option<f64> {
        self.min_rating.filter(|m| *m > 0.0)
    }

    /// Whether `route` passes every non-rating filter.
    pub(crate) fn matches(&self, route: &Route) -> bool {
        contains_ignore_case(route.origin(), self.origin.as_deref())
            && contains_ignore_case(route.destination(), self.destination.as_deref())
            && self.mode.is_none_or(|m| route.transport_type() == m)
            && (self.modes.is_empty() || self.modes.contains(&route.transport_type()))
            && self.price.contains(route.price_cents())
            && contains_ignore_case(route.operator_name(), self.operator.as_deref())
            && self.departs_in_window(route)
    }

    /// Both ends are inclusive. Unscheduled routes fail any window.
    fn departs_in_window(&self, route: &Route) -> bool {
        if self.departing_from.is_none() && self.departing_to.is_none() {
            return true;
        }
        route.schedule().iter().any(|t| {
            self.departing_from.is_none_or(|from| *t >= from)
                && self.departing_to.is_none_or(|to| *t <= to)
        })
    }
}

/// `needle` absent or blank matches anything.
pub(crate) fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}
