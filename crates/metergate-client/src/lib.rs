//! Metergate Client SDK.
//!
//! This crate provides a client library for product backends to consult the
//! metergate enforcement service.
//!
//! # Example
//!
//! ```no_run
//! use metergate_client::{AuthorizeRequest, MetergateClient};
//! use metergate_core::Feature;
//!
//! # async fn example() -> Result<(), metergate_client::ClientError> {
//! let client = MetergateClient::new(
//!     "http://metergate.platform.svc:8080",
//!     "your-service-api-key",
//! );
//!
//! // Gate a metered operation
//! let decision = client
//!     .authorize(AuthorizeRequest {
//!         subject: None,
//!         user_id: "user-uuid".to_string(),
//!         plan_id: "professional".to_string(),
//!         feature: Feature::ContentGeneration,
//!     })
//!     .await?;
//!
//! if decision.allowed {
//!     // ... run the operation, then on success:
//!     client.record_usage("user-uuid", Feature::ContentGeneration, 1).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, MetergateClient};
pub use error::ClientError;
pub use types::*;
