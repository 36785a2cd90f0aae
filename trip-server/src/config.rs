//! Server configuration.
//!
//! Read from environment variables at startup:
//!
//! | Variable                    | Default                 |
//! |-----------------------------|-------------------------|
//! | `TRIP_BIND_ADDR`            | `127.0.0.1:3000`        |
//! | `TRIP_PUBLIC_URL`           | `http://localhost:3000` |
//! | `TRIP_ROUTES_FILE`          | none (empty catalog)    |
//! | `TRIP_ADMINS`               | none                    |
//! | `TRIP_CURRENCY`             | `inr`                   |
//! | `TRIP_ROUTE_CACHE_TTL_SECS` | `30`                    |
//! | `STRIPE_SECRET_KEY`         | none (mock processor)   |
//! | `STRIPE_ALLOWED_COUNTRIES`  | none                    |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::UserId;
use crate::payment::{CheckoutConfig, StripeConfig};
use crate::store::RouteCacheConfig;

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Externally visible base URL, used for checkout redirects.
    pub public_url: String,
    pub routes_file: Option<PathBuf>,
    pub admins: Vec<UserId>,
    pub currency: String,
    pub route_cache: RouteCacheConfig,
    /// `None` means no secret key: the mock processor is used.
    pub stripe: Option<StripeConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            public_url: "http://localhost:3000".to_string(),
            routes_file: None,
            admins: Vec::new(),
            currency: "inr".to_string(),
            route_cache: RouteCacheConfig::default(),
            stripe: None,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to read each variable. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("TRIP_BIND_ADDR") {
            config.bind_addr = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "TRIP_BIND_ADDR",
                value: value.clone(),
                reason: "expected host:port",
            })?;
        }

        if let Some(value) = get("TRIP_PUBLIC_URL") {
            let value = value.trim();
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    var: "TRIP_PUBLIC_URL",
                    value: value.to_string(),
                    reason: "expected an http or https URL",
                });
            }
            config.public_url = value.trim_end_matches('/').to_string();
        }

        config.routes_file = get("TRIP_ROUTES_FILE").map(|v| PathBuf::from(v.trim()));

        config.admins = get("TRIP_ADMINS")
            .map(|v| split_list(&v).map(UserId::new).collect())
            .unwrap_or_default();

        if let Some(value) = get("TRIP_CURRENCY") {
            let currency = value.trim().to_lowercase();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::Invalid {
                    var: "TRIP_CURRENCY",
                    value,
                    reason: "expected a three-letter ISO currency code",
                });
            }
            config.currency = currency;
        }

        if let Some(value) = get("TRIP_ROUTE_CACHE_TTL_SECS") {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "TRIP_ROUTE_CACHE_TTL_SECS",
                value: value.clone(),
                reason: "expected a number of seconds",
            })?;
            config.route_cache = config.route_cache.with_ttl(Duration::from_secs(secs));
        }

        config.stripe = get("STRIPE_SECRET_KEY").map(|key| {
            let countries = get("STRIPE_ALLOWED_COUNTRIES")
                .map(|v| split_list(&v).map(str::to_uppercase).collect::<Vec<_>>())
                .unwrap_or_default();
            StripeConfig::new(key.trim()).with_allowed_countries(countries)
        });

        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_admins(mut self, admins: impl IntoIterator<Item = UserId>) -> Self {
        self.admins = admins.into_iter().collect();
        self
    }

    pub fn with_stripe(mut self, stripe: StripeConfig) -> Self {
        self.stripe = Some(stripe);
        self
    }

    /// Whether a real payment processor is configured.
    pub fn is_stripe_configured(&self) -> bool {
        self.stripe.as_ref().is_some_and(StripeConfig::is_configured)
    }

    /// Checkout redirects and currency derived from this configuration.
    pub fn checkout(&self) -> CheckoutConfig {
        CheckoutConfig::for_public_url(&self.public_url, self.currency.clone())
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
