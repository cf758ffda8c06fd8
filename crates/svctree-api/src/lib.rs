//! svctree-api — client for the monitoring platform's management API.
//!
//! The delegated-creation import variant does not write node rows itself;
//! it asks the platform to create and delete services through an
//! authenticated JSON-RPC endpoint. Calls are blocking round-trips with no
//! retries, matching the batch nature of the tool.

pub mod client;
pub mod factory;

use thiserror::Error;

pub use client::ManagementClient;
pub use factory::ApiFactory;

/// Errors raised by the management API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport error: {0}")]
    Http(String),

    #[error("management API error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("not authenticated — call authenticate() first")]
    NotAuthenticated,

    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}
