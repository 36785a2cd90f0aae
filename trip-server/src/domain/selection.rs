//! Fare-bearing selections: seats for train/bus, a vehicle class for taxi.
//!
//! The seat map is illustrative. It validates what a traveler picked
//! against a fixed layout but reserves nothing.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::money::Multiplier;
use super::route::TransportType;

/// Seats per row on every seat map.
pub const SEATS_PER_ROW: u8 = 4;

/// Seats shown as taken on every map.
const OCCUPIED: [&str; 6] = ["1A", "2B", "3C", "5D", "7A", "8B"];

/// Error returned when parsing an invalid seat label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid seat: {reason}")]
pub struct InvalidSeat {
    reason: &'static str,
}

/// A seat label: a row number from 1 followed by a column letter A-D.
///
/// ```
/// use trip_server::domain::SeatId;
///
/// let seat = SeatId::parse("12C").unwrap();
/// assert_eq!(seat.row(), 12);
/// assert_eq!(seat.to_string(), "12C");
///
/// assert!(SeatId::parse("0A").is_err());
/// assert!(SeatId::parse("3E").is_err());
/// assert!(SeatId::parse("A3").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatId {
    row: u8,
    column: u8,
}

impl SeatId {
    pub fn parse(s: &str) -> Result<Self, InvalidSeat> {
        let s = s.trim();
        let Some(column) = s.bytes().last() else {
            return Err(InvalidSeat {
                reason: "must not be empty",
            });
        };
        let column = column.to_ascii_uppercase();
        if !(b'A'..b'A' + SEATS_PER_ROW).contains(&column) {
            return Err(InvalidSeat {
                reason: "column must be a letter A-D",
            });
        }

        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidSeat {
                reason: "must start with a row number",
            });
        }
        let row: u8 = digits.parse().map_err(|_| InvalidSeat {
            reason: "row number out of range",
        })?;
        if row == 0 {
            return Err(InvalidSeat {
                reason: "rows are numbered from 1",
            });
        }

        Ok(Self { row, column })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn column(self) -> char {
        char::from(self.column)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column())
    }
}

impl FromStr for SeatId {
    type Err = InvalidSeat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeatId::parse(s)
    }
}

impl Serialize for SeatId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SeatId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Seat layout for a seat-based mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatMap {
    rows: u8,
}

impl SeatMap {
    /// Layout for a transport mode; `None` for taxi.
    pub fn for_mode(mode: TransportType) -> Option<Self> {
        match mode {
            TransportType::Train => Some(Self { rows: 12 }),
            TransportType::Bus => Some(Self { rows: 10 }),
            TransportType::Taxi => None,
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn capacity(&self) -> usize {
        usize::from(self.rows) * usize::from(SEATS_PER_ROW)
    }

    pub fn contains(&self, seat: SeatId) -> bool {
        seat.row <= self.rows
    }

    pub fn is_occupied(&self, seat: SeatId) -> bool {
        OCCUPIED
            .iter()
            .filter_map(|s| SeatId::parse(s).ok())
            .any(|s| s == seat)
    }

    /// Every seat on the map in row-major order, with its occupancy.
    pub fn seats(&self) -> impl Iterator<Item = (SeatId, bool)> + '_ {
        (1..=self.rows).flat_map(move |row| {
            (b'A'..b'A' + SEATS_PER_ROW).map(move |column| {
                let seat = SeatId { row, column };
                (seat, self.is_occupied(seat))
            })
        })
    }
}

/// Error returned when parsing an unknown vehicle class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid vehicle class: {0:?} (expected sedan, suv or van)")]
pub struct InvalidVehicleClass(String);

/// Taxi vehicle class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Sedan,
    Suv,
    Van,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [VehicleClass::Sedan, VehicleClass::Suv, VehicleClass::Van];

    pub fn parse(s: &str) -> Result<Self, InvalidVehicleClass> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sedan" => Ok(VehicleClass::Sedan),
            "suv" => Ok(VehicleClass::Suv),
            "van" => Ok(VehicleClass::Van),
            _ => Err(InvalidVehicleClass(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Sedan => "sedan",
            VehicleClass::Suv => "suv",
            VehicleClass::Van => "van",
        }
    }

    pub fn multiplier(self) -> Multiplier {
        match self {
            VehicleClass::Sedan => Multiplier::ONE,
            VehicleClass::Suv => Multiplier::ONE_AND_HALF,
            VehicleClass::Van => Multiplier::TWO,
        }
    }

    /// Passenger seats.
    pub fn capacity(self) -> u8 {
        match self {
            VehicleClass::Sedan => 4,
            VehicleClass::Suv => 6,
            VehicleClass::Van => 8,
        }
    }

    /// Pieces of luggage.
    pub fn luggage(self) -> u8 {
        match self {
            VehicleClass::Sedan => 2,
            VehicleClass::Suv => 4,
            VehicleClass::Van => 6,
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the traveler selected on a route before booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    Seats(Vec<SeatId>),
    Vehicle(VehicleClass),
}

impl Selection {
    /// Unit count: seat count for seat modes, 1 for a vehicle.
    pub fn quantity(&self) -> u32 {
        match self {
            Selection::Seats(seats) => u32::try_from(seats.len()).unwrap_or(u32::MAX),
            Selection::Vehicle(_) => 1,
        }
    }

    /// Vehicle-class factor; always 1 for seats.
    pub fn multiplier(&self) -> Multiplier {
        match self {
            Selection::Seats(_) => Multiplier::ONE,
            Selection::Vehicle(class) => class.multiplier(),
        }
    }

    /// Check the selection against the route's mode and seat map.
    ///
    /// An empty seat list is accepted here; it prices to zero and is
    /// reported as an incomplete selection by the pricing layer.
    pub fn validate_for(&self, mode: TransportType) -> Result<(), DomainError> {
        match (self, SeatMap::for_mode(mode)) {
            (Selection::Vehicle(_), None) => Ok(()),
            (Selection::Vehicle(_), Some(_)) => Err(DomainError::validation(format!(
                "{mode} routes are booked by seat, not by vehicle"
            ))),
            (Selection::Seats(_), None) => Err(DomainError::validation(
                "taxi routes are booked by vehicle class, not by seat",
            )),
            (Selection::Seats(seats), Some(map)) => {
                let mut seen = HashSet::with_capacity(seats.len());
                for seat in seats {
                    if !map.contains(*seat) {
                        return Err(DomainError::validation(format!(
                            "seat {seat} is not on the {mode} seat map"
                        )));
                    }
                    if map.is_occupied(*seat) {
                        return Err(DomainError::validation(format!(
                            "seat {seat} is already occupied"
                        )));
                    }
                    if !seen.insert(*seat) {
                        return Err(DomainError::validation(format!(
                            "seat {seat} selected twice"
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}
