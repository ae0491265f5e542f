//! Bounded recovery for per-item requests.
//!
//! Every RDS listing and codelist export runs through [`with_recovery`]: one
//! attempt, and on failure exactly one more after a short pause. The outcome
//! says which attempt succeeded, or carries the last error once both failed.
//! Failures are classified with [`FailureKind`] for log lines and for the
//! remediation hints in the final report; the classification never changes
//! the attempt budget.

use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::ApiError;

/// Attempts per item, including the first one
pub const MAX_ATTEMPTS: usize = 2;

/// Classification of a failed request for operator messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request timed out
    NetworkTimeout,
    /// Connection refused, DNS or TLS failure
    NetworkOffline,
    /// HTTP 429
    RateLimit,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 401/403
    AuthFailed(u16),
    /// Other HTTP 4xx, or an unexpected non-200 status
    ClientError(u16),
    /// Body could not be decoded
    InvalidResponse,
    /// Export succeeded but returned nothing
    EmptyExport,
    /// Anything else
    NetworkGeneric,
}

impl FailureKind {
    /// Classify an API error
    pub fn classify(err: &ApiError) -> Self {
        if let Some(status) = err.status() {
            let code = status.as_u16();
            return match code {
                429 => Self::RateLimit,
                401 | 403 => Self::AuthFailed(code),
                _ if status.is_server_error() => Self::ServerError(code),
                _ => Self::ClientError(code),
            };
        }

        match err {
            ApiError::Timeout(_) => Self::NetworkTimeout,
            ApiError::ConnectionFailed(_) => Self::NetworkOffline,
            ApiError::ParseError(_) => Self::InvalidResponse,
            ApiError::EmptyExport(_) => Self::EmptyExport,
            _ => Self::NetworkGeneric,
        }
    }

    /// Short description used in log lines
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::AuthFailed(_) => "not authorized",
            Self::ClientError(code) => match code {
                404 => "resource not found",
                _ => "client error",
            },
            Self::InvalidResponse => "invalid response",
            Self::EmptyExport => "empty export",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested manual follow-up
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Re-run later or export this item by hand from the web UI",
            Self::NetworkOffline => "Check VPN, proxy and certificate settings, then re-run",
            Self::RateLimit => "Wait for the API quota to reset, then re-run",
            Self::ServerError(_) => "API was failing for this item; retry it manually later",
            Self::AuthFailed(_) => "Check that the client has read access to this item",
            Self::ClientError(_) => "Check that the item still exists and is not archived",
            Self::InvalidResponse => "Inspect the item in the web UI; its listing may be malformed",
            Self::EmptyExport => "Check whether the codelist has any values",
            Self::NetworkGeneric => "Check network connectivity and re-run",
        }
    }
}

/// Result of running a request with recovery
#[derive(Debug)]
pub enum RecoveryOutcome<T> {
    /// First attempt succeeded
    FirstAttempt(T),
    /// First attempt failed, the retry succeeded
    Recovered(T),
    /// Both attempts failed; the last error
    Exhausted(ApiError),
}

impl<T> RecoveryOutcome<T> {
    /// Successful value, whichever attempt produced it
    pub fn ok(self) -> Option<T> {
        match self {
            Self::FirstAttempt(v) | Self::Recovered(v) => Some(v),
            Self::Exhausted(_) => None,
        }
    }

    /// Short status for progress lines
    pub fn status(&self) -> &'static str {
        match self {
            Self::FirstAttempt(_) => "fetched",
            Self::Recovered(_) => "recovered",
            Self::Exhausted(_) => "failed",
        }
    }
}

/// Context of one recovery pass, for log formatting
#[derive(Debug, Clone)]
pub struct RecoveryContext {
    /// What is being fetched, e.g. "RDS 42"
    pub item: String,
    /// Classification of the first failure
    pub kind: FailureKind,
    /// Message of the first failure
    pub error_message: String,
    /// Pause before the retry
    pub delay: Duration,
}

impl RecoveryContext {
    /// Context for an item whose first attempt failed with `err`
    pub fn new(item: impl Into<String>, err: &ApiError, delay: Duration) -> Self {
        Self {
            item: item.into(),
            kind: FailureKind::classify(err),
            error_message: err.to_string(),
            delay,
        }
    }

    /// Line logged before the retry
    pub fn format_entering(&self) -> String {
        format!(
            "Entering recovery mode for {} after {} ({}) - retrying in {:.1}s (attempt {}/{})",
            self.item,
            self.kind.description(),
            self.error_message,
            self.delay.as_secs_f64(),
            MAX_ATTEMPTS,
            MAX_ATTEMPTS
        )
    }

    /// Line logged when the retry succeeded
    pub fn format_recovered(&self) -> String {
        format!("Exiting recovery mode for {}: recovered", self.item)
    }

    /// Line logged when the retry failed too
    pub fn format_exhausted(&self, last: &ApiError) -> String {
        format!(
            "Exiting recovery mode for {}: failed after {} attempts ({}) - marked for manual follow-up",
            self.item, MAX_ATTEMPTS, last
        )
    }
}

/// Run `attempt`, retrying once after `delay` if it fails
///
/// `attempt` must issue the same request each time it is called.
pub async fn with_recovery<T, F, Fut>(item: &str, delay: Duration, mut attempt: F) -> RecoveryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let first_error = match attempt().await {
        Ok(value) => return RecoveryOutcome::FirstAttempt(value),
        Err(e) => e,
    };

    let context = RecoveryContext::new(item, &first_error, delay);
    warn!("{}", context.format_entering());

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match attempt().await {
        Ok(value) => {
            info!("{}", context.format_recovered());
            RecoveryOutcome::Recovered(value)
        }
        Err(last) => {
            warn!("{}", context.format_exhausted(&last));
            RecoveryOutcome::Exhausted(last)
        }
    }
}
