//! Stripe Checkout HTTP client.
//!
//! Opens hosted checkout sessions and reads back their status through the
//! Stripe REST API. Requests are form-encoded, authenticated with the
//! secret key as a bearer token, and bounded by a semaphore.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio::sync::Semaphore;

use super::error::PaymentError;
use super::{CheckoutRequest, CheckoutSession, PaymentProcessor, SessionId, SessionStatus};

/// Default base URL for the Stripe API.
const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Configuration for the Stripe client.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: String,
    /// Base URL for the API (defaults to production Stripe)
    pub base_url: String,
    /// ISO country codes offered for the billing address. Empty means the
    /// checkout page does not collect one.
    pub allowed_countries: Vec<String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            allowed_countries: Vec::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_allowed_countries(mut self, countries: impl IntoIterator<Item = String>) -> Self {
        self.allowed_countries = countries.into_iter().collect();
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Whether a secret key is present.
    pub fn is_configured(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }
}

/// Stripe Checkout API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    allowed_countries: Vec<String>,
    semaphore: Arc<Semaphore>,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        if !config.is_configured() {
            return Err(PaymentError::NotConfigured(
                "STRIPE_SECRET_KEY is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.trim()))
            .map_err(|_| PaymentError::NotConfigured("invalid secret key format".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            allowed_countries: config.allowed_countries,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<StripeSession, PaymentError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| PaymentError::NotConfigured("client is shutting down".to_string()))?;

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PaymentError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PaymentError::RateLimited);
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let mut session: StripeSession =
            serde_json::from_str(&body).map_err(|e| PaymentError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;
        session.raw = body;
        Ok(session)
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let form = checkout_form(request, &self.allowed_countries);

        let session = self
            .send(
                self.http
                    .post(&url)
                    .header("Idempotency-Key", request.idempotency_key())
                    .form(&form),
            )
            .await?;

        let redirect = session.url.ok_or_else(|| PaymentError::Json {
            message: "session missing url".to_string(),
            body: None,
        })?;

        Ok(CheckoutSession {
            session_id: SessionId::new(session.id),
            url: redirect,
        })
    }

    async fn session_status(&self, session: &SessionId) -> Result<SessionStatus, PaymentError> {
        if !is_session_id(session.as_str()) {
            return Err(PaymentError::InvalidSessionId(session.to_string()));
        }
        let url = format!("{}/v1/checkout/sessions/{}", self.base_url, session.as_str());
        match self.send(self.http.get(&url)).await {
            Ok(found) => Ok(found.into_status()),
            Err(PaymentError::Api { status: 404, .. }) => {
                Err(PaymentError::SessionNotFound(session.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Whether `id` looks like a Checkout Session id (`cs_` then `[A-Za-z0-9_]+`).
///
/// The id is spliced into the request path, so anything else is refused.
fn is_session_id(id: &str) -> bool {
    id.strip_prefix("cs_").is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Form fields for `POST /v1/checkout/sessions`.
fn checkout_form(request: &CheckoutRequest, allowed_countries: &[String]) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "client_reference_id".to_string(),
            request.booking_id.to_string(),
        ),
        ("metadata[booking_id]".to_string(), request.booking_id.to_string()),
        ("metadata[user]".to_string(), request.user.to_string()),
    ];

    for (i, item) in request.items.iter().enumerate() {
        let key = |field: &str| format!("line_items[{i}]{field}");
        form.push((key("[quantity]"), item.quantity.to_string()));
        form.push((key("[price_data][currency]"), item.currency.to_lowercase()));
        form.push((
            key("[price_data][unit_amount]"),
            item.price_in_cents.get().to_string(),
        ));
        form.push((
            key("[price_data][product_data][name]"),
            item.product_name.clone(),
        ));
        if !item.product_description.is_empty() {
            form.push((
                key("[price_data][product_data][description]"),
                item.product_description.clone(),
            ));
        }
    }

    for (i, country) in allowed_countries.iter().enumerate() {
        form.push((
            format!("shipping_address_collection[allowed_countries][{i}]"),
            country.to_uppercase(),
        ));
    }

    form
}

/// Pull `error.message` out of a Stripe error body, or fall back to the
/// body itself.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(Envelope { error }) => error
            .message
            .or(error.code)
            .unwrap_or_else(|| "unknown error".to_string()),
        Err(_) => body.chars().take(500).collect(),
    }
}

/// The subset of a Stripe Checkout Session we read.
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(skip)]
    raw: String,
}

impl StripeSession {
    fn into_status(self) -> SessionStatus {
        match (self.status.as_deref(), self.payment_status.as_deref()) {
            (Some("complete"), Some("paid" | "no_payment_required")) => SessionStatus::Completed {
                user_principal: self.metadata.get("user").cloned(),
                booking_id: self
                    .metadata
                    .get("booking_id")
                    .cloned()
                    .or(self.client_reference_id),
                response: self.raw,
            },
            (Some("expired"), _) => SessionStatus::Failed {
                error: "checkout session expired".to_string(),
            },
            (Some("open"), _) => SessionStatus::Failed {
                error: "checkout session not completed".to_string(),
            },
            (_, payment) => SessionStatus::Failed {
                error: format!("payment {}", payment.unwrap_or("status unknown")),
            },
        }
    }
}
