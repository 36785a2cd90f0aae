//! Route filtering and ordering.
//!
//! All functions are read-only projections over a route slice. They never
//! fail; no matches is an empty vector.

use std::cmp::Reverse;

use crate::domain::Route;
use crate::reviews::RatingIndex;

use super::criteria::{SearchCriteria, SortKey};

/// Filter and sort `routes` by `criteria`.
///
/// A minimum-rating filter above 0 consults `ratings`; routes with no
/// reviews, or any route at all when `ratings` is `None`, are excluded.
pub fn search(
    routes: &[Route],
    criteria: &SearchCriteria,
    ratings: Option<&RatingIndex>,
) -> Vec<Route> {
    let floor = criteria.rating_floor();

    let mut found: Vec<Route> = routes
        .iter()
        .filter(|route| criteria.matches(route))
        .filter(|route| match floor {
            None => true,
            Some(min) => ratings
                .and_then(|index| index.get(route.id()))
                .is_some_and(|summary| summary.meets(min)),
        })
        .cloned()
        .collect();

    sort_routes(&mut found, criteria.sort);
    found
}

/// Stable sort by `key`.
pub fn sort_routes(routes: &mut [Route], key: SortKey) {
    match key {
        SortKey::PriceAsc => routes.sort_by_key(|r| r.price_cents()),
        SortKey::PriceDesc => routes.sort_by_key(|r| Reverse(r.price_cents())),
        SortKey::Departure => routes.sort_by_key(|r| r.earliest_departure()),
        SortKey::Duration => routes.sort_by_key(|r| r.duration_minutes()),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::catalog::PriceRange;
    use crate::domain::{Cents, RouteId, Timestamp, TransportType};
    use crate::reviews::RatingSummary;

    fn ids(routes: &[Route]) -> Vec<&str> {
        routes.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn default_criteria_sort_by_price_keeping_ties() {
        let found = search(&catalog(), &SearchCriteria::default(), None);
        // b1 and t2 tie at 300; catalog order keeps b1 first.
        assert_eq!(ids(&found), ["b1", "t2", "t1", "b2", "x1"]);
    }

    #[test]
    fn origin_and_destination_are_case_insensitive_substrings() {
        let criteria = SearchCriteria::default()
            .with_origin("mumbai")
            .with_destination("PU");
        let found = search(&catalog(), &criteria, None);
        assert_eq!(ids(&found), ["b1", "t1", "x1"]);
    }

    #[test]
    fn origin_substring_matches_inside_words() {
        let criteria = SearchCriteria::default().with_origin("mumbai");
        let found = search(&catalog(), &criteria, None);
        assert!(ids(&found).contains(&"b2"));
    }

    #[test]
    fn mode_and_modes_are_conjunctive() {
        let criteria = SearchCriteria::default()
            .with_modes([TransportType::Train, TransportType::Bus])
            .with_mode(TransportType::Bus);
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["b1", "b2"]);

        let criteria = SearchCriteria::default()
            .with_modes([TransportType::Taxi])
            .with_mode(TransportType::Bus);
        assert!(search(&catalog(), &criteria, None).is_empty());
    }

    #[test]
    fn price_range_inclusive() {
        let criteria = SearchCriteria::default().with_price(PriceRange::new(
            Some(Cents::new(300)),
            Some(Cents::new(500)),
        ));
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["b1", "t2", "t1"]);
    }

    #[test]
    fn sort_by_departure_puts_unscheduled_first() {
        let criteria = SearchCriteria::default().with_sort(SortKey::Departure);
        assert_eq!(
            ids(&search(&catalog(), &criteria, None)),
            ["x1", "b2", "b1", "t2", "t1"]
        );
    }

    #[test]
    fn sort_by_duration_and_price_desc() {
        let criteria = SearchCriteria::default().with_sort(SortKey::Duration);
        assert_eq!(
            ids(&search(&catalog(), &criteria, None)),
            ["t2", "x1", "t1", "b1", "b2"]
        );
        let criteria = SearchCriteria::default().with_sort(SortKey::PriceDesc);
        assert_eq!(
            ids(&search(&catalog(), &criteria, None)),
            ["x1", "b2", "t1", "b1", "t2"]
        );
    }

    #[test]
    fn min_rating_excludes_unrated_routes() {
        let mut index = RatingIndex::new();
        index.insert(RouteId::new("t1"), RatingSummary { count: 2, total: 9 });
        index.insert(RouteId::new("b1"), RatingSummary { count: 1, total: 3 });

        let criteria = SearchCriteria::default().with_min_rating(4.0);
        assert_eq!(ids(&search(&catalog(), &criteria, Some(&index))), ["t1"]);
        assert!(search(&catalog(), &criteria, None).is_empty());

        let criteria = SearchCriteria::default().with_min_rating(0.0);
        assert_eq!(search(&catalog(), &criteria, None).len(), 5);
    }

    #[test]
    fn empty_catalog_is_empty_result() {
        assert!(search(&[], &SearchCriteria::default().with_origin("x"), None).is_empty());
    }

    #[test]
    fn operator_filter_is_a_case_insensitive_substring() {
        let criteria = SearchCriteria::default().with_operator("BUS OP");
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["b1", "b2"]);

        let criteria = SearchCriteria::default()
            .with_operator("operator")
            .with_mode(TransportType::Taxi);
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["x1"]);
    }

    #[test]
    fn departure_window_is_inclusive_and_skips_unscheduled() {
        let criteria = SearchCriteria::default().with_departures(
            Some(Timestamp::from_nanos(100)),
            Some(Timestamp::from_nanos(200)),
        );
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["b1", "t2"]);

        let criteria =
            SearchCriteria::default().with_departures(Some(Timestamp::from_nanos(201)), None);
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["t1"]);

        let criteria =
            SearchCriteria::default().with_departures(None, Some(Timestamp::from_nanos(99)));
        assert_eq!(ids(&search(&catalog(), &criteria, None)), ["b2"]);
    }
}

#[cfg(test)]
mod proptests {
    use super::fixtures::priced;
    use super::*;
    use crate::catalog::PriceRange;
    use crate::domain::{Cents, TransportType};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn distinct_prices() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::hash_set(0u64..1_000_000, 0..30)
            .prop_map(|set: HashSet<u64>| set.into_iter().collect())
    }

    fn routes_from(prices: &[u64]) -> Vec<Route> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                priced(
                    &format!("r{i}"),
                    "A",
                    "B",
                    TransportType::Bus,
                    *p,
                    60,
                    None,
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn price_desc_reverses_price_asc_without_ties(prices in distinct_prices()) {
            let routes = routes_from(&prices);
            let asc = search(&routes, &SearchCriteria::default(), None);
            let mut desc = search(
                &routes,
                &SearchCriteria::default().with_sort(SortKey::PriceDesc),
                None,
            );
            desc.reverse();
            prop_assert_eq!(asc, desc);
        }

        #[test]
        fn search_never_invents_routes(
            prices in prop::collection::vec(0u64..1_000, 0..30),
            min in 0u64..1_000,
        ) {
            let routes = routes_from(&prices);
            let criteria = SearchCriteria::default()
                .with_price(PriceRange::new(Some(Cents::new(min)), None));
            let found = search(&routes, &criteria, None);
            prop_assert!(found.len() <= routes.len());
            for route in &found {
                prop_assert!(route.price_cents() >= Cents::new(min));
                prop_assert!(routes.contains(route));
            }
        }

        #[test]
        fn ties_keep_catalog_order(prices in prop::collection::vec(0u64..5, 0..30)) {
            let routes = routes_from(&prices);
            let found = search(&routes, &SearchCriteria::default(), None);
            for pair in found.windows(2) {
                if pair[0].price_cents() == pair[1].price_cents() {
                    let pos = |r: &Route| routes.iter().position(|x| x.id() == r.id());
                    prop_assert!(pos(&pair[0]) < pos(&pair[1]));
                }
            }
        }
    }
}
