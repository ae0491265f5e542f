//! Export API access
//!
//! The pipeline talks to the API only through [`CodelistSource`], which
//! [`client::ApiClient`] implements over HTTP. Authentication happens once,
//! before the client exists, in [`auth`].

use crate::{Codelist, Domain, RdsId};
use async_trait::async_trait;
use reqwest::StatusCode;

pub mod auth;
pub mod client;
pub mod models;

pub use auth::AccessToken;
pub use client::ApiClient;
pub use models::{ExportRequest, RdsRecord};

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request timed out
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure or TLS handshake failure
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Other transport error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-200 response
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status
        status: StatusCode,
        /// Response body, for diagnostics
        body: String,
    },

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Export returned no content
    #[error("export of codelist {0} returned no content")]
    EmptyExport(String),

    /// Token request failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl ApiError {
    /// Map a transport error, keeping timeouts and connect failures apart
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_connect() {
            ApiError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            ApiError::ParseError(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }

    /// Response status, if the failure was an HTTP error response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Read access to domains, reference data sets and codelists
///
/// Every method issues exactly one request. Retrying is the caller's concern.
#[async_trait]
pub trait CodelistSource: Send + Sync {
    /// List the domains the operator can choose from
    async fn list_domains(&self) -> ApiResult<Vec<Domain>>;

    /// List every reference data set, across all domains
    async fn list_reference_data_sets(&self) -> ApiResult<Vec<RdsRecord>>;

    /// List the codelists of one reference data set
    async fn list_codelists(&self, rds: &RdsId) -> ApiResult<Vec<Codelist>>;

    /// Export the rows of one codelist as raw CSV text
    async fn export_codelist(&self, codelist: &Codelist) -> ApiResult<String>;
}
