//! Routes and their fare breakdown.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::money::Cents;
use super::time::Timestamp;

/// Route identifier, assigned by the administrative collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id for an admin-created route.
    pub fn generate() -> Self {
        Self(format!("route-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing an unknown transport mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transport type: {0:?} (expected train, bus or taxi)")]
pub struct InvalidTransportType(String);

/// Transport mode of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Train,
    Bus,
    Taxi,
}

impl TransportType {
    pub const ALL: [TransportType; 3] =
        [TransportType::Train, TransportType::Bus, TransportType::Taxi];

    /// Parse a lowercase mode tag.
    ///
    /// ```
    /// use trip_server::domain::TransportType;
    ///
    /// assert_eq!(TransportType::parse("bus").unwrap(), TransportType::Bus);
    /// assert!(TransportType::parse("ferry").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidTransportType> {
        match s {
            "train" => Ok(TransportType::Train),
            "bus" => Ok(TransportType::Bus),
            "taxi" => Ok(TransportType::Taxi),
            other => Err(InvalidTransportType(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportType::Train => "train",
            TransportType::Bus => "bus",
            TransportType::Taxi => "taxi",
        }
    }

    /// Seat-based modes price per selected seat; taxi prices per vehicle.
    pub fn is_seat_based(self) -> bool {
        match self {
            TransportType::Train | TransportType::Bus => true,
            TransportType::Taxi => false,
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-part fare decomposition, all in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateBreakdown {
    pub base_fare: Cents,
    pub taxes: Cents,
    pub service_fees: Cents,
}

impl RateBreakdown {
    pub fn new(base_fare: u64, taxes: u64, service_fees: u64) -> Self {
        Self {
            base_fare: Cents::new(base_fare),
            taxes: Cents::new(taxes),
            service_fees: Cents::new(service_fees),
        }
    }

    /// Sum of the three components; `None` if it overflows.
    pub fn checked_total(&self) -> Option<Cents> {
        self.base_fare
            .checked_add(self.taxes)?
            .checked_add(self.service_fees)
    }
}

/// The admin-editable fields of a route, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteDraft {
    pub origin: String,
    pub destination: String,
    pub operator_name: String,
    #[serde(default)]
    pub route_name: String,
    pub transport_type: TransportType,
    pub distance_km: u32,
    pub duration_minutes: u32,
    #[serde(default)]
    pub schedule: Vec<Timestamp>,
    pub rate_breakdown: RateBreakdown,
}

/// Stored shape of a route. `price_cents` is optional on input and, when
/// present, must agree with the breakdown.
#[derive(Deserialize)]
struct RouteRecord {
    id: RouteId,
    #[serde(flatten)]
    draft: RouteDraft,
    #[serde(default)]
    price_cents: Option<Cents>,
}

/// A schedulable offering between two cities on one transport mode.
///
/// Construction validates the draft and derives `price_cents` from the
/// rate breakdown, so `price_cents == base_fare + taxes + service_fees`
/// holds for every `Route` value.
///
/// ```
/// use trip_server::domain::{Cents, RateBreakdown, Route, RouteDraft, RouteId, TransportType};
///
/// let route = Route::new(
///     RouteId::new("r1"),
///     RouteDraft {
///         origin: "Mumbai".into(),
///         destination: "Pune".into(),
///         operator_name: "Deccan Lines".into(),
///         route_name: String::new(),
///         transport_type: TransportType::Bus,
///         distance_km: 150,
///         duration_minutes: 180,
///         schedule: vec![],
///         rate_breakdown: RateBreakdown::new(120_000, 15_000, 5_000),
///     },
/// )
/// .unwrap();
/// assert_eq!(route.price_cents(), Cents::new(140_000));
/// assert_eq!(route.route_name(), "Mumbai to Pune");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RouteRecord")]
pub struct Route {
    id: RouteId,
    origin: String,
    destination: String,
    operator_name: String,
    route_name: String,
    transport_type: TransportType,
    distance_km: u32,
    duration_minutes: u32,
    schedule: Vec<Timestamp>,
    rate_breakdown: RateBreakdown,
    price_cents: Cents,
}

impl Route {
    /// Validate a draft and build the route.
    pub fn new(id: RouteId, draft: RouteDraft) -> Result<Self, DomainError> {
        if id.as_str().trim().is_empty() {
            return Err(DomainError::validation("route id must not be empty"));
        }

        let origin = draft.origin.trim().to_string();
        let destination = draft.destination.trim().to_string();
        let operator_name = draft.operator_name.trim().to_string();

        if origin.is_empty() || destination.is_empty() {
            return Err(DomainError::validation(
                "origin and destination are required",
            ));
        }
        if origin.to_lowercase() == destination.to_lowercase() {
            return Err(DomainError::validation(
                "origin and destination must be different cities",
            ));
        }
        if operator_name.is_empty() {
            return Err(DomainError::validation("operator name is required"));
        }

        let price_cents = draft
            .rate_breakdown
            .checked_total()
            .ok_or_else(|| DomainError::validation("rate breakdown total overflows"))?;

        let route_name = match draft.route_name.trim() {
            "" => format!("{origin} to {destination}"),
            name => name.to_string(),
        };

        let mut schedule = draft.schedule;
        schedule.sort_unstable();

        Ok(Self {
            id,
            origin,
            destination,
            operator_name,
            route_name,
            transport_type: draft.transport_type,
            distance_km: draft.distance_km,
            duration_minutes: draft.duration_minutes,
            schedule,
            rate_breakdown: draft.rate_breakdown,
            price_cents,
        })
    }

    pub fn id(&self) -> &RouteId {
        &self.id
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn operator_name(&self) -> &str {
        &self.operator_name
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn transport_type(&self) -> TransportType {
        self.transport_type
    }

    pub fn distance_km(&self) -> u32 {
        self.distance_km
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Departures in ascending order.
    pub fn schedule(&self) -> &[Timestamp] {
        &self.schedule
    }

    pub fn rate_breakdown(&self) -> &RateBreakdown {
        &self.rate_breakdown
    }

    pub fn price_cents(&self) -> Cents {
        self.price_cents
    }

    /// Earliest departure, or the epoch for an unscheduled route.
    pub fn earliest_departure(&self) -> Timestamp {
        self.schedule.first().copied().unwrap_or(Timestamp::EPOCH)
    }

    /// First departure strictly after `after`.
    pub fn next_departure_after(&self, after: Timestamp) -> Option<Timestamp> {
        self.schedule.iter().copied().find(|t| *t > after)
    }

    /// Replace the editable fields, keeping the id.
    pub fn with_draft(&self, draft: RouteDraft) -> Result<Self, DomainError> {
        Route::new(self.id.clone(), draft)
    }
}

impl TryFrom<RouteRecord> for Route {
    type Error = DomainError;

    fn try_from(record: RouteRecord) -> Result<Self, Self::Error> {
        let route = Route::new(record.id, record.draft)?;
        match record.price_cents {
            Some(stored) if stored != route.price_cents => Err(DomainError::validation(format!(
                "route {}: price_cents {} does not match rate breakdown total {}",
                route.id, stored, route.price_cents
            ))),
            _ => Ok(route),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn draft(transport_type: TransportType) -> RouteDraft {
        RouteDraft {
            origin: "Mumbai".into(),
            destination: "Pune".into(),
            operator_name: "Deccan Express".into(),
            route_name: String::new(),
            transport_type,
            distance_km: 150,
            duration_minutes: 180,
            schedule: vec![Timestamp::from_nanos(2_000), Timestamp::from_nanos(1_000)],
            rate_breakdown: RateBreakdown::new(120_000, 15_000, 5_000),
        }
    }

    pub fn route(id: &str, transport_type: TransportType) -> Route {
        Route::new(RouteId::new(id), draft(transport_type)).unwrap()
    }
}
