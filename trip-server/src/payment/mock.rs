//! Mock payment processor for development and tests.
//!
//! Sessions live in memory. Every session completes unless an outcome is
//! scripted for it, and creation can be made to fail. Like Stripe, the mock
//! returns the existing session when asked twice with the same
//! idempotency key.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::PaymentError;
use super::{CheckoutRequest, CheckoutSession, PaymentProcessor, SessionId, SessionStatus};

#[derive(Debug, Default)]
struct MockState {
    /// Sessions by id, with the request that opened them.
    sessions: HashMap<SessionId, (CheckoutRequest, Option<SessionStatus>)>,
    /// Idempotency key to the session it created.
    by_key: HashMap<String, CheckoutSession>,
    /// Error returned by the next `create_session`.
    fail_next_create: Option<String>,
    /// Requests in arrival order, including repeats.
    requests: Vec<CheckoutRequest>,
}

/// In-memory processor with scriptable outcomes.
#[derive(Debug, Clone)]
pub struct MockPaymentProcessor {
    base_url: String,
    state: Arc<RwLock<MockState>>,
}

impl MockPaymentProcessor {
    /// A mock whose checkout URLs live under `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Arc::default(),
        }
    }

    /// Script the outcome reported for `session`.
    pub async fn set_outcome(&self, session: &SessionId, status: SessionStatus) {
        let mut state = self.state.write().await;
        if let Some((_, outcome)) = state.sessions.get_mut(session) {
            *outcome = Some(status);
        }
    }

    /// Make the next `create_session` fail with a processor error.
    pub async fn fail_next_create(&self, message: impl Into<String>) {
        self.state.write().await.fail_next_create = Some(message.into());
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<CheckoutRequest> {
        self.state.read().await.requests.clone()
    }

    /// Number of distinct sessions opened.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut state = self.state.write().await;
        state.requests.push(request.clone());

        if let Some(message) = state.fail_next_create.take() {
            return Err(PaymentError::Api {
                status: 400,
                message,
            });
        }

        let key = request.idempotency_key();
        if let Some(existing) = state.by_key.get(&key) {
            return Ok(existing.clone());
        }

        let session_id = SessionId::new(format!("cs_mock_{}", uuid::Uuid::new_v4().simple()));
        let session = CheckoutSession {
            url: format!("{}/mock-checkout/{}", self.base_url, session_id),
            session_id: session_id.clone(),
        };
        state
            .sessions
            .insert(session_id, (request.clone(), None));
        state.by_key.insert(key, session.clone());
        tracing::debug!(session = %session.session_id, "mock checkout session opened");
        Ok(session)
    }

    async fn session_status(&self, session: &SessionId) -> Result<SessionStatus, PaymentError> {
        let state = self.state.read().await;
        let (request, outcome) = state
            .sessions
            .get(session)
            .ok_or_else(|| PaymentError::SessionNotFound(session.to_string()))?;

        Ok(outcome.clone().unwrap_or_else(|| SessionStatus::Completed {
            response: format!(
                r#"{{"id":"{}","status":"complete","payment_status":"paid"}}"#,
                session
            ),
            user_principal: Some(request.user.to_string()),
            booking_id: Some(request.booking_id.to_string()),
        }))
    }
}
