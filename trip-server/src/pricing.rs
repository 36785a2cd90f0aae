//! Fare quotes.
//!
//! Pure computation from a route's rate breakdown and a selected quantity
//! and multiplier. Each of base fare, taxes and service fees is scaled
//! independently and rounded half up once per component; the total is the
//! sum of the rounded components. Rounding the summed total instead would
//! let three half-unit remainders drift apart from the itemised receipt.

use serde::Serialize;

use crate::domain::{Cents, Multiplier, RateBreakdown, Route, Selection};

/// An itemised fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub base_fare: Cents,
    pub taxes: Cents,
    pub service_fees: Cents,
    pub total: Cents,
    /// Units priced. Zero means the selection is incomplete.
    pub quantity: u32,
}

impl Quote {
    /// True when nothing was selected, so the total is zero.
    pub fn is_incomplete(&self) -> bool {
        self.quantity == 0
    }

    /// Price of one unit: the total divided evenly by the quantity.
    ///
    /// Multipliers are only ever applied with a quantity of 1, so the
    /// division is exact for every quote this module produces.
    pub fn per_unit(&self) -> Cents {
        match self.quantity {
            0 => Cents::ZERO,
            q => Cents::new(self.total.get() / u64::from(q)),
        }
    }
}

/// Quote `quantity` units of a fare at `multiplier`.
///
/// ```
/// use trip_server::domain::{Cents, Multiplier, RateBreakdown};
/// use trip_server::pricing::quote;
///
/// let rates = RateBreakdown::new(120_000, 15_000, 5_000);
/// let q = quote(&rates, 1, Multiplier::ONE_AND_HALF);
/// assert_eq!(q.base_fare, Cents::new(180_000));
/// assert_eq!(q.total, Cents::new(210_000));
/// ```
pub fn quote(rates: &RateBreakdown, quantity: u32, multiplier: Multiplier) -> Quote {
    let units = u64::from(quantity);
    let base_fare = multiplier.apply(rates.base_fare, units);
    let taxes = multiplier.apply(rates.taxes, units);
    let service_fees = multiplier.apply(rates.service_fees, units);

    Quote {
        base_fare,
        taxes,
        service_fees,
        total: base_fare + taxes + service_fees,
        quantity,
    }
}

/// Quote a selection on a route.
///
/// Quantity and multiplier come from the selection: seat count at x1 for
/// train and bus, one vehicle at its class factor for taxi. The selection
/// is not checked against the route's mode here; see
/// [`Selection::validate_for`].
pub fn quote_selection(route: &Route, selection: &Selection) -> Quote {
    quote(
        route.rate_breakdown(),
        selection.quantity(),
        selection.multiplier(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::route;
    use crate::domain::{SeatId, TransportType, VehicleClass};

    fn rates() -> RateBreakdown {
        RateBreakdown::new(120_000, 15_000, 5_000)
    }

    #[test]
    fn single_unit_is_price() {
        let q = quote(&rates(), 1, Multiplier::ONE);
        assert_eq!(q.total, Cents::new(140_000));
        assert_eq!(q.per_unit(), Cents::new(140_000));
        assert!(!q.is_incomplete());
    }

    #[test]
    fn taxi_suv_scenario() {
        let route = route("r1", TransportType::Taxi);
        let q = quote_selection(&route, &Selection::Vehicle(VehicleClass::Suv));
        assert_eq!(q.base_fare, Cents::new(180_000));
        assert_eq!(q.taxes, Cents::new(22_500));
        assert_eq!(q.service_fees, Cents::new(7_500));
        assert_eq!(q.total, Cents::new(210_000));
        assert_eq!(q.total.to_string(), "2100.00");
    }

    #[test]
    fn train_three_seats_scenario() {
        let route = route("r1", TransportType::Train);
        let seats = ["4A", "4B", "4C"]
            .iter()
            .map(|s| SeatId::parse(s).unwrap())
            .collect();
        let q = quote_selection(&route, &Selection::Seats(seats));
        assert_eq!(q.total, Cents::new(420_000));
        assert_eq!(q.per_unit(), Cents::new(140_000));
    }

    #[test]
    fn no_seats_is_incomplete() {
        let route = route("r1", TransportType::Bus);
        let q = quote_selection(&route, &Selection::Seats(vec![]));
        assert_eq!(q.total, Cents::ZERO);
        assert!(q.is_incomplete());
        assert_eq!(q.per_unit(), Cents::ZERO);
    }

    #[test]
    fn rounds_per_component() {
        // Each component 1 * 1.5 = 1.5 rounds to 2, total 6.
        // Rounding the summed total would give round(4.5) = 5.
        let q = quote(&RateBreakdown::new(1, 1, 1), 1, Multiplier::ONE_AND_HALF);
        assert_eq!(q.base_fare, Cents::new(2));
        assert_eq!(q.total, Cents::new(6));
    }

    #[test]
    fn van_doubles() {
        let q = quote(&rates(), 1, VehicleClass::Van.multiplier());
        assert_eq!(q.total, Cents::new(280_000));
    }
}
