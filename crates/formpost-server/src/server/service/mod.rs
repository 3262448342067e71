//! HTTP intake.
//!
//! ## Structure
//!
//! - [`handler`] - axum routes and the shared submission handler.

pub mod handler;
