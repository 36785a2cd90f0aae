//! HTTP route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;

use crate::booking::cancellation_notice;
use crate::domain::{
    BookingId, CompareSet, DomainError, MAX_COMPARED, Rating, RouteDraft, RouteId, Timestamp,
    UserId,
};
use crate::payment::SessionId;
use crate::pricing::quote_selection;

use super::dto::*;
use super::state::AppState;

/// Header carrying the authenticated caller's id.
///
/// Authentication happens upstream; the server trusts this header.
pub const USER_HEADER: &str = "x-user-id";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(whoami))
        .route("/api/routes", get(list_routes).post(create_route))
        .route(
            "/api/routes/:id",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route("/api/routes/:id/options", get(route_options))
        .route("/api/routes/:id/reviews", get(route_reviews))
        .route("/api/quote", post(quote))
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/:id", get(get_booking))
        .route("/api/bookings/:id/cancel", post(cancel_booking))
        .route("/api/bookings/:id/complete", post(complete_booking))
        .route("/api/bookings/:id/checkout", post(start_checkout))
        .route("/api/bookings/:id/review", post(submit_review))
        .route(
            "/api/bookings/:id/review/eligibility",
            get(review_eligibility),
        )
        .route("/api/checkout/:session_id", get(resolve_checkout))
        .route("/api/compare", get(get_compare).delete(clear_compare))
        .route(
            "/api/compare/:route_id",
            post(add_compare).delete(remove_compare),
        )
        .route("/api/payment/status", get(payment_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The caller named by [`USER_HEADER`].
fn caller(headers: &HeaderMap) -> Result<UserId, AppError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(UserId::new)
        .ok_or_else(|| AppError::Unauthorized {
            message: format!("missing {USER_HEADER} header"),
        })
}

/// Parse a JSON body, logging it on failure.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(body = %String::from_utf8_lossy(body), "rejected request body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Search routes. Every result carries its rating.
async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<RouteListResponse>, AppError> {
    let criteria = query
        .into_criteria()
        .map_err(|message| AppError::BadRequest { message })?;

    let routes = state.catalog.all().await?;
    let ids: Vec<RouteId> = routes.iter().map(|r| r.id().clone()).collect();
    let ratings = state.reviews.rating_index(&ids).await?;

    let routes = crate::catalog::search(&routes, &criteria, Some(&ratings))
        .into_iter()
        .map(|route| RouteView {
            rating: ratings.get(route.id()).copied().map(RatingView::from),
            route,
        })
        .collect();

    Ok(Json(RouteListResponse { routes }))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteView>, AppError> {
    let id = RouteId::new(id);
    let route = state.catalog.get(&id).await?;
    let rating = state.reviews.summary_for_route(&id).await?;
    Ok(Json(RouteView {
        route,
        rating: rating.map(RatingView::from),
    }))
}

async fn create_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let req: CreateRouteRequest = parse_json(&body)?;
    let route = state.catalog.add_route(&caller, req.id, req.draft).await?;
    Ok((StatusCode::CREATED, Json(route)).into_response())
}

async fn update_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let draft: RouteDraft = parse_json(&body)?;
    let route = state
        .catalog
        .update_route(&caller, &RouteId::new(id), draft)
        .await?;
    Ok(Json(route).into_response())
}

async fn delete_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let caller = caller(&headers)?;
    state
        .catalog
        .delete_route(&caller, &RouteId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Seat map or vehicle classes for a route.
async fn route_options(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SelectionOptions>, AppError> {
    let route = state.catalog.get(&RouteId::new(id)).await?;
    Ok(Json(SelectionOptions::for_route(&route)))
}

async fn route_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteReviewsResponse>, AppError> {
    let route_id = RouteId::new(id);
    state.catalog.get(&route_id).await?;
    let reviews = state.reviews.reviews_for_route(&route_id).await?;
    let rating = crate::reviews::average_rating(&reviews).map(RatingView::from);
    Ok(Json(RouteReviewsResponse {
        route_id,
        reviews,
        rating,
    }))
}

/// Price a selection without booking it.
async fn quote(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let req: QuoteRequest = parse_json(&body)?;
    let route = state.catalog.get(&req.route_id).await?;
    req.selection.validate_for(route.transport_type())?;

    let quote = quote_selection(&route, &req.selection);
    Ok(Json(QuoteResponse {
        route_id: req.route_id,
        per_unit: quote.per_unit(),
        incomplete: quote.is_incomplete(),
        quote,
    })
    .into_response())
}

async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let req: CreateBookingRequest = parse_json(&body)?;
    let booking = state
        .bookings
        .create_for_route(&caller, &req.route_id, &req.selection, req.quoted_total)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)).into_response())
}

/// The caller's bookings, newest first.
async fn list_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BookingListResponse>, AppError> {
    let caller = caller(&headers)?;
    let bookings = state.bookings.list_for_user(&caller).await?;
    Ok(Json(BookingListResponse { bookings }))
}

async fn get_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingDetailResponse>, AppError> {
    let caller = caller(&headers)?;
    let booking = state
        .bookings
        .get_owned(&BookingId::new(id), &caller)
        .await?;
    let cancellation = cancellation_notice(&booking, Timestamp::now());
    Ok(Json(BookingDetailResponse {
        booking,
        cancellation,
    }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let booking = state.bookings.cancel(&BookingId::new(id), &caller).await?;
    Ok(Json(booking).into_response())
}

/// Settle a trip. Admin only.
async fn complete_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    if !state.catalog.is_admin(&caller) {
        return Err(AppError::Forbidden {
            message: "completing a booking requires an admin".to_string(),
        });
    }
    let booking = state.bookings.mark_completed(&BookingId::new(id)).await?;
    Ok(Json(booking).into_response())
}

async fn start_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let session = state
        .payments
        .start_checkout_for(&BookingId::new(id), &caller)
        .await?;
    Ok(Json(session).into_response())
}

/// Report how a checkout session ended.
async fn resolve_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Query(query): Query<ResolveCheckoutQuery>,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let booking_id = query
        .booking_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest {
            message: "booking_id query parameter is required".to_string(),
        })?;

    let outcome = state
        .payments
        .resolve_session(
            &SessionId::new(session_id),
            &BookingId::new(booking_id),
            &caller,
        )
        .await?;
    Ok(Json(outcome).into_response())
}

/// Whether the caller may review a booking, with the reason if not.
async fn review_eligibility(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let caller = caller(&headers)?;
    match state
        .reviews
        .eligibility(&caller, &BookingId::new(id))
        .await
    {
        Ok(()) => Ok(Json(EligibilityResponse {
            eligible: true,
            reason: None,
        })),
        Err(
            e @ (DomainError::Forbidden(_)
            | DomainError::InvalidTransition(_)
            | DomainError::Validation(_)),
        ) => Ok(Json(EligibilityResponse {
            eligible: false,
            reason: Some(e.to_string()),
        })),
        Err(e) => Err(e.into()),
    }
}

async fn submit_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let caller = caller(&headers)?;
    let req: ReviewRequest = parse_json(&body)?;
    let rating = Rating::new(req.rating).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let review = state
        .reviews
        .submit(&caller, &BookingId::new(id), rating, req.review_text)
        .await?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

async fn get_compare(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CompareResponse>, AppError> {
    let caller = caller(&headers)?;
    let response = match state.compare.get(&caller).await {
        Some(set) => CompareResponse::from(&*set.lock().await),
        None => CompareResponse::from(&CompareSet::new()),
    };
    Ok(Json(response))
}

/// Add a route to the caller's comparison. Adding a compared route again
/// is a no-op.
async fn add_compare(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(route_id): Path<String>,
) -> Result<Json<CompareResponse>, AppError> {
    let caller = caller(&headers)?;
    let route = state.catalog.get(&RouteId::new(route_id)).await?;

    let set = state.compare.get_with(caller, async { Arc::default() }).await;
    let mut set = set.lock().await;
    if !set.contains(route.id()) && !set.add(route) {
        return Err(AppError::Conflict {
            message: format!("at most {MAX_COMPARED} routes can be compared"),
        });
    }
    Ok(Json(CompareResponse::from(&*set)))
}

async fn remove_compare(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(route_id): Path<String>,
) -> Result<Json<CompareResponse>, AppError> {
    let caller = caller(&headers)?;
    let response = match state.compare.get(&caller).await {
        Some(set) => {
            let mut set = set.lock().await;
            set.remove(&RouteId::new(route_id));
            CompareResponse::from(&*set)
        }
        None => CompareResponse::from(&CompareSet::new()),
    };
    Ok(Json(response))
}

async fn clear_compare(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let caller = caller(&headers)?;
    state.compare.invalidate(&caller).await;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's id and whether they may edit routes.
async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AppError> {
    let user = caller(&headers)?;
    let role = if state.catalog.is_admin(&user) {
        Role::Admin
    } else {
        Role::User
    };
    Ok(Json(MeResponse { user, role }))
}

async fn payment_status(State(state): State<AppState>) -> Json<PaymentStatusResponse> {
    let processor = if state.stripe_configured { "stripe" } else { "mock" };
    Json(PaymentStatusResponse {
        processor,
        stripe_configured: state.stripe_configured,
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Unauthorized { message: String },
    Forbidden { message: String },
    NotFound { message: String },
    Conflict { message: String },
    BadGateway { message: String },
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::Validation(_) => AppError::BadRequest { message },
            DomainError::NotFound { .. } => AppError::NotFound { message },
            DomainError::Forbidden(_) => AppError::Forbidden { message },
            DomainError::InvalidTransition(_) => AppError::Conflict { message },
            DomainError::Upstream(_) => AppError::BadGateway { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden { message } => (StatusCode::FORBIDDEN, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
        };

        if status.is_server_error() {
            tracing::error!(%status, %message, "request failed");
        } else {
            tracing::warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
