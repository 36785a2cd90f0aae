//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::booking::CancellationNotice;
use crate::catalog::{PriceRange, SearchCriteria, SortKey};
use crate::domain::{
    Booking, Cents, CompareSet, Review, Route, RouteDraft, RouteId, SEATS_PER_ROW,
    SeatId, SeatMap, Selection, Timestamp, TransportType, UserId, VehicleClass,
};
use crate::pricing::{Quote, quote_selection};
use crate::reviews::RatingSummary;

/// Query parameters for route search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,

    /// Single search mode (`train`, `bus`, `taxi`)
    pub mode: Option<String>,

    /// Comma-separated multi-select modes
    pub modes: Option<String>,

    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_rating: Option<f64>,

    /// Operator name substring
    pub operator: Option<String>,

    /// Departure window bounds, inclusive, in epoch nanoseconds
    pub departing_from: Option<Timestamp>,
    pub departing_to: Option<Timestamp>,

    /// Sort key (`price-asc`, `price-desc`, `departure`, `duration`)
    pub sort: Option<String>,
}

impl SearchQuery {
    /// Parse into search criteria, naming the first bad parameter.
    pub fn into_criteria(self) -> Result<SearchCriteria, String> {
        let mode = self
            .mode
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(TransportType::parse)
            .transpose()
            .map_err(|e| e.to_string())?;

        let modes = self
            .modes
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(TransportType::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        let sort = self
            .sort
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(SortKey::parse)
            .transpose()
            .map_err(|e| e.to_string())?
            .unwrap_or_default();

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(format!("min_price {min} is above max_price {max}"));
            }
        }
        if let (Some(from), Some(to)) = (self.departing_from, self.departing_to) {
            if from > to {
                return Err(format!("departing_from {from} is after departing_to {to}"));
            }
        }

        Ok(SearchCriteria {
            origin: self.origin,
            destination: self.destination,
            mode,
            modes,
            price: PriceRange::new(
                self.min_price.map(Cents::new),
                self.max_price.map(Cents::new),
            ),
            min_rating: self.min_rating,
            operator: self.operator,
            departing_from: self.departing_from,
            departing_to: self.departing_to,
            sort,
        })
    }
}

/// Average rating for display. Absent when a route has no reviews.
#[derive(Debug, Serialize)]
pub struct RatingView {
    pub average: f64,
    pub count: u32,
}

impl From<RatingSummary> for RatingView {
    fn from(summary: RatingSummary) -> Self {
        Self {
            average: summary.average(),
            count: summary.count,
        }
    }
}

/// A route with its rating.
#[derive(Debug, Serialize)]
pub struct RouteView {
    #[serde(flatten)]
    pub route: Route,
    pub rating: Option<RatingView>,
}

#[derive(Debug, Serialize)]
pub struct RouteListResponse {
    pub routes: Vec<RouteView>,
}

/// Body for creating a route. The id is generated when omitted.
#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    #[serde(default)]
    pub id: Option<RouteId>,
    #[serde(flatten)]
    pub draft: RouteDraft,
}

/// One seat on a seat map.
#[derive(Debug, Serialize)]
pub struct SeatView {
    pub seat: SeatId,
    pub occupied: bool,
}

/// One bookable taxi class with its quoted price.
#[derive(Debug, Serialize)]
pub struct VehicleView {
    pub class: VehicleClass,
    pub multiplier: String,
    pub passengers: u8,
    pub luggage: u8,
    pub price_cents: Cents,
}

/// What can be selected on a route.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SelectionOptions {
    Seats {
        rows: u8,
        seats_per_row: u8,
        seats: Vec<SeatView>,
    },
    Vehicles {
        vehicles: Vec<VehicleView>,
    },
}

impl SelectionOptions {
    pub fn for_route(route: &Route) -> Self {
        match SeatMap::for_mode(route.transport_type()) {
            Some(map) => SelectionOptions::Seats {
                rows: map.rows(),
                seats_per_row: SEATS_PER_ROW,
                seats: map
                    .seats()
                    .map(|(seat, occupied)| SeatView { seat, occupied })
                    .collect(),
            },
            None => SelectionOptions::Vehicles {
                vehicles: VehicleClass::ALL
                    .into_iter()
                    .map(|class| VehicleView {
                        class,
                        multiplier: class.multiplier().to_string(),
                        passengers: class.capacity(),
                        luggage: class.luggage(),
                        price_cents: quote_selection(route, &Selection::Vehicle(class)).total,
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub route_id: RouteId,
    pub selection: Selection,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub route_id: RouteId,
    #[serde(flatten)]
    pub quote: Quote,
    pub per_unit: Cents,
    pub incomplete: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub route_id: RouteId,
    pub selection: Selection,
    /// Total the traveler was shown. Re-checked against a fresh quote.
    pub quoted_total: Cents,
}

#[derive(Debug, Serialize)]
pub struct BookingDetailResponse {
    pub booking: Booking,
    pub cancellation: CancellationNotice,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveCheckoutQuery {
    pub booking_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub review_text: String,
}

#[derive(Debug, Serialize)]
pub struct RouteReviewsResponse {
    pub route_id: RouteId,
    pub reviews: Vec<Review>,
    pub rating: Option<RatingView>,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub routes: Vec<Route>,
    pub can_add_more: bool,
}

impl From<&CompareSet> for CompareResponse {
    fn from(set: &CompareSet) -> Self {
        Self {
            routes: set.routes().to_vec(),
            can_add_more: set.can_add_more(),
        }
    }
}

/// What the caller may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserId,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub processor: &'static str,
    pub stripe_configured: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
