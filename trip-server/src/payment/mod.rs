//! Payment: hosted checkout sessions for bookings.
//!
//! The processor is external. This module defines the port it is reached
//! through ([`PaymentProcessor`]), two adapters ([`StripeClient`] and
//! [`MockPaymentProcessor`]), and the [`PaymentOrchestrator`] that turns a
//! booking into line items and reports session outcomes back.
//!
//! A session outcome never changes booking status. A paid booking stays
//! `confirmed` until travel settles it; a failed payment leaves it
//! `confirmed` and unpaid until the traveler cancels.

mod error;
mod mock;
mod orchestrator;
mod stripe;

pub use error::PaymentError;
pub use mock::MockPaymentProcessor;
pub use orchestrator::{CheckoutConfig, CheckoutOutcome, PaymentOrchestrator, line_items};
pub use stripe::{StripeClient, StripeConfig};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BookingId, Cents, UserId};

/// Processor-issued checkout session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One purchasable line on a checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_name: String,
    pub product_description: String,
    /// Price of one unit of this line.
    pub price_in_cents: Cents,
    pub quantity: u32,
    pub currency: String,
}

impl LineItem {
    /// `price_in_cents * quantity`, saturating.
    pub fn subtotal(&self) -> Cents {
        self.price_in_cents
            .checked_mul(u64::from(self.quantity))
            .unwrap_or(Cents::new(u64::MAX))
    }
}

/// Everything a processor needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub booking_id: BookingId,
    pub user: UserId,
    pub items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Key under which a processor should deduplicate session creation.
    pub fn idempotency_key(&self) -> String {
        format!("checkout-{}", self.booking_id)
    }

    pub fn total(&self) -> Cents {
        self.items.iter().map(LineItem::subtotal).sum()
    }
}

/// An opened session: where to send the traveler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: SessionId,
    pub url: String,
}

/// Terminal outcome of a session as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed {
        /// Raw processor payload, kept for diagnostics.
        response: String,
        user_principal: Option<String>,
        /// Booking the session was opened for, when the processor echoes it.
        booking_id: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// An external payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn session_status(&self, session: &SessionId) -> Result<SessionStatus, PaymentError>;
}
