//! Route catalog seed files.
//!
//! A seed file is a JSON array of route records. Each record is validated
//! as it is deserialized: an unknown transport type, a same-city route or
//! a `price_cents` that disagrees with its breakdown rejects the whole file.

use std::path::Path;

use crate::domain::Route;

use super::error::StoreError;
use super::memory::InMemoryRouteStore;

/// Parse a JSON array of routes.
pub fn parse_routes(json: &str) -> Result<Vec<Route>, StoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Load a seed file into a fresh in-memory route store.
pub fn load_routes(path: impl AsRef<Path>) -> Result<InMemoryRouteStore, StoreError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let routes = parse_routes(&json)?;
    tracing::info!(path = %path.display(), count = routes.len(), "loaded route seed");
    Ok(InMemoryRouteStore::with_routes(routes)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::{Cents, TransportType};
    use crate::store::RouteStore;

    const SEED: &str = r#"[
        {
            "id": "mum-pun-train",
            "origin": "Mumbai",
            "destination": "Pune",
            "operator_name": "Deccan Express",
            "transport_type": "train",
            "distance_km": 150,
            "duration_minutes": 180,
            "schedule": [1700000000000000000],
            "rate_breakdown": {"base_fare": 120000, "taxes": 15000, "service_fees": 5000},
            "price_cents": 140000
        },
        {
            "id": "mum-pun-taxi",
            "origin": "Mumbai",
            "destination": "Pune",
            "operator_name": "City Cabs",
            "transport_type": "taxi",
            "distance_km": 150,
            "duration_minutes": 150,
            "rate_breakdown": {"base_fare": 300000, "taxes": 30000, "service_fees": 10000}
        }
    ]"#;

    #[tokio::test]
    async fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let store = load_routes(file.path()).unwrap();
        let routes = store.list().await.unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_name(), "Mumbai to Pune");
        assert_eq!(routes[1].transport_type(), TransportType::Taxi);
        assert_eq!(routes[1].price_cents(), Cents::new(340_000));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_routes(dir.path().join("routes.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn tampered_price_rejects_file() {
        let json = SEED.replace("\"price_cents\": 140000", "\"price_cents\": 1");
        assert!(matches!(parse_routes(&json), Err(StoreError::Json(_))));
    }

    #[test]
    fn duplicate_ids_reject_file() {
        let json = SEED.replace("mum-pun-taxi", "mum-pun-train");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        assert!(matches!(
            load_routes(file.path()),
            Err(StoreError::Rejected(_))
        ));
    }

    #[test]
    fn bundled_seed_parses() {
        let routes = parse_routes(include_str!("../../data/routes.json")).unwrap();
        assert_eq!(routes.len(), 5);
        assert!(
            TransportType::ALL
                .iter()
                .all(|mode| routes.iter().any(|r| r.transport_type() == *mode))
        );
    }
}
