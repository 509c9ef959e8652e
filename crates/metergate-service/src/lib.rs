//! Metergate HTTP API Service.
//!
//! This crate provides the HTTP API for the metergate service, including:
//!
//! - Authorization of metered operations (`/v1/authorize`)
//! - Post-success usage recording (`/v1/usage/record`)
//! - Plan catalog and proration previews (`/v1/plans`)
//! - Expired-window maintenance (`/v1/admin/purge-windows`)
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Service API keys** - For service-to-service requests (the product
//!    backends consulting the gate)
//! 2. **Admin API keys** - For privileged maintenance endpoints

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async only for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
