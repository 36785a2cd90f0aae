//! Trip booking server.
//!
//! Search train, bus and taxi routes between cities, price a seat or
//! vehicle selection, book it, pay through a hosted checkout session and
//! review the trip once it is completed.

pub mod booking;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod payment;
pub mod pricing;
pub mod reviews;
pub mod store;
pub mod web;
