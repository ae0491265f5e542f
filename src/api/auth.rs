//! Client-credentials authentication
//!
//! The token is requested once per run and never refreshed. Any failure here
//! stops the run: nothing downstream can succeed without it.

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use super::models::TokenResponse;
use super::{ApiError, ApiResult};
use crate::config::EnvironmentProfile;

const GRANT_TYPE: &str = "client_credentials";

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the `Authorization` header
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Exchange the profile's client credentials for a bearer token
///
/// # Errors
/// Returns [`ApiError::AuthenticationFailed`] on transport errors, any status
/// other than 200, an undecodable body, or a body without `access_token`.
pub async fn fetch_access_token(
    http: &Client,
    profile: &EnvironmentProfile,
) -> ApiResult<AccessToken> {
    debug!("Requesting access token from {}", profile.token_url);

    let form = [
        ("grant_type", GRANT_TYPE),
        ("client_id", profile.client_id.as_str()),
        ("client_secret", profile.client_secret.as_str()),
    ];

    let response = http
        .post(&profile.token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| ApiError::AuthenticationFailed(format!("token request failed: {e}")))?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ApiError::AuthenticationFailed(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| ApiError::AuthenticationFailed(format!("invalid token response: {e}")))?
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::AuthenticationFailed("token response has no access_token".to_string())
        })?;

    info!("Access token obtained for client {}", profile.client_id);
    Ok(AccessToken(token))
}
