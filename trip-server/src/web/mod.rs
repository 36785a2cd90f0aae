//! Web layer for the trip booking server.
//!
//! JSON endpoints for route search, quotes, bookings, checkout, reviews
//! and route comparison. Callers identify themselves with the
//! `x-user-id` header.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, USER_HEADER, create_router};
pub use state::{AppState, Stores};
