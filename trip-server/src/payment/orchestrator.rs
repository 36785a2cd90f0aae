//! Checkout orchestration.

use std::sync::Arc;

use serde::Serialize;

use crate::booking::BookingLifecycle;
use crate::domain::{Booking, BookingId, BookingStatus, Cents, DomainError, Selection, UserId};
use crate::pricing::quote_selection;

use super::{
    CheckoutRequest, CheckoutSession, LineItem, PaymentProcessor, SessionId, SessionStatus,
};

/// Placeholder the processor replaces with the session id on redirect.
const SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Where the processor sends the traveler afterwards, and in what currency
/// line items are priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutConfig {
    /// Success and failure pages under `public_url`.
    ///
    /// ```
    /// use trip_server::payment::CheckoutConfig;
    ///
    /// let config = CheckoutConfig::for_public_url("https://trips.example/", "inr");
    /// assert_eq!(
    ///     config.success_url,
    ///     "https://trips.example/payment-success?session_id={CHECKOUT_SESSION_ID}"
    /// );
    /// assert_eq!(config.cancel_url, "https://trips.example/payment-failure");
    /// ```
    pub fn for_public_url(public_url: &str, currency: impl Into<String>) -> Self {
        let base = public_url.trim_end_matches('/');
        Self {
            currency: currency.into(),
            success_url: format!("{base}/payment-success?session_id={SESSION_PLACEHOLDER}"),
            cancel_url: format!("{base}/payment-failure"),
        }
    }
}

/// What a resolved session means for its booking.
///
/// Neither variant implies a status change; the booking is returned as
/// currently stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CheckoutOutcome {
    Paid { booking: Booking, response: String },
    Failed { booking: Booking, error: String },
}

impl CheckoutOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            CheckoutOutcome::Paid { booking, .. } | CheckoutOutcome::Failed { booking, .. } => {
                booking
            }
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, CheckoutOutcome::Paid { .. })
    }
}

/// Build line items for a booking.
///
/// Seat bookings get one item per seat at the single-seat price; taxi
/// bookings get one item at the quoted vehicle price. The items must sum
/// to the booking's charged amount.
pub fn line_items(booking: &Booking, currency: &str) -> Result<Vec<LineItem>, DomainError> {
    let route = booking.route();
    let quote = quote_selection(route, booking.selection());
    let description = format!("{} - {}", route.operator_name(), route.transport_type());

    let items: Vec<LineItem> = match booking.selection() {
        Selection::Seats(seats) => seats
            .iter()
            .map(|seat| LineItem {
                product_name: format!("{} - Seat {seat}", route.route_name()),
                product_description: description.clone(),
                price_in_cents: quote.per_unit(),
                quantity: 1,
                currency: currency.to_string(),
            })
            .collect(),
        Selection::Vehicle(class) => vec![LineItem {
            product_name: format!("{} - {}", route.route_name(), class.as_str().to_uppercase()),
            product_description: description,
            price_in_cents: quote.total,
            quantity: 1,
            currency: currency.to_string(),
        }],
    };

    let sum: Cents = items.iter().map(LineItem::subtotal).sum();
    if items.is_empty() || sum != booking.cost_in_stripe_cents() {
        return Err(DomainError::validation(format!(
            "line items total {sum} does not match booking amount {}",
            booking.cost_in_stripe_cents()
        )));
    }
    Ok(items)
}

/// Opens checkout sessions for bookings and reports their outcomes.
#[derive(Clone)]
pub struct PaymentOrchestrator {
    processor: Arc<dyn PaymentProcessor>,
    bookings: BookingLifecycle,
    config: CheckoutConfig,
}

impl PaymentOrchestrator {
    pub fn new(
        processor: Arc<dyn PaymentProcessor>,
        bookings: BookingLifecycle,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            processor,
            bookings,
            config,
        }
    }

    /// Open a session for a confirmed booking.
    ///
    /// No retry; the first processor error is returned as `Upstream`.
    pub async fn start_checkout(&self, booking: &Booking) -> Result<CheckoutSession, DomainError> {
        if booking.status() != BookingStatus::Confirmed {
            return Err(DomainError::InvalidTransition(format!(
                "cannot check out a {} booking",
                booking.status()
            )));
        }

        let request = CheckoutRequest {
            booking_id: booking.id().clone(),
            user: booking.user().clone(),
            items: line_items(booking, &self.config.currency)?,
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        };

        let session = self.processor.create_session(&request).await.map_err(|e| {
            tracing::error!(booking = %booking.id(), error = %e, "checkout session failed");
            DomainError::from(e)
        })?;

        tracing::info!(
            booking = %booking.id(),
            session = %session.session_id,
            total = %request.total(),
            "checkout started"
        );
        Ok(session)
    }

    /// As [`start_checkout`](Self::start_checkout), loading the caller's
    /// booking first.
    pub async fn start_checkout_for(
        &self,
        booking_id: &BookingId,
        caller: &UserId,
    ) -> Result<CheckoutSession, DomainError> {
        let booking = self.bookings.get_owned(booking_id, caller).await?;
        self.start_checkout(&booking).await
    }

    /// Ask the processor how a session ended and pair it with its booking.
    ///
    /// The booking id comes from the caller alongside the session id. A
    /// completed session must have been opened for that booking by its
    /// owner.
    pub async fn resolve_session(
        &self,
        session: &SessionId,
        booking_id: &BookingId,
        caller: &UserId,
    ) -> Result<CheckoutOutcome, DomainError> {
        let booking = self.bookings.get_owned(booking_id, caller).await?;

        let status = self.processor.session_status(session).await.map_err(|e| {
            tracing::error!(session = %session, error = %e, "session status lookup failed");
            DomainError::from(e)
        })?;

        match status {
            SessionStatus::Completed {
                response,
                user_principal,
                booking_id: paid_for,
            } => {
                if user_principal.is_some_and(|p| p != booking.user().as_str()) {
                    return Err(DomainError::forbidden(
                        "checkout session was opened by another user",
                    ));
                }
                if let Some(paid_for) = paid_for.filter(|id| id != booking_id.as_str()) {
                    tracing::warn!(
                        booking = %booking_id,
                        session = %session,
                        paid_for = %paid_for,
                        "session resolved against the wrong booking"
                    );
                    return Err(DomainError::validation(format!(
                        "checkout session {session} was opened for booking {paid_for}, \
                         not {booking_id}"
                    )));
                }
                tracing::info!(booking = %booking_id, session = %session, "payment completed");
                Ok(CheckoutOutcome::Paid { booking, response })
            }
            SessionStatus::Failed { error } => {
                tracing::warn!(
                    booking = %booking_id,
                    session = %session,
                    error = %error,
                    "payment failed; booking left confirmed"
                );
                Ok(CheckoutOutcome::Failed { booking, error })
            }
        }
    }
}
