//! HTTP client for the export API
//!
//! Provides the single client used for every call after authentication:
//! - Bearer token on every request
//! - JSON decoding for listings
//! - Raw text for CSV exports
//!
//! Each call issues exactly one request. Recovery lives in the pipeline.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{Enumerations, ExportRequest, RdsRecord};
use super::{AccessToken, ApiError, ApiResult, CodelistSource};
use crate::{Codelist, Domain, RdsId};

/// Enumerations endpoint, holds the domain list
pub const ENUMERATIONS_ENDPOINT: &str = "enumerations";

/// Reference data set listing
pub const RDS_ENDPOINT: &str = "rds";

/// CSV export endpoint
pub const EXPORT_ENDPOINT: &str = "v3/export";

/// Authenticated client for the export API
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: AccessToken,
}

impl ApiClient {
    /// Create a client
    ///
    /// # Arguments
    /// * `client` - HTTP client, already configured with the trust anchor
    /// * `base_url` - API base path (e.g. "https://host/api/v1")
    /// * `token` - Bearer token from [`super::auth::fetch_access_token`]
    pub fn new(client: Client, base_url: impl Into<String>, token: AccessToken) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token,
        }
    }

    /// Base URL the client was created with
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join an endpoint path onto the base URL with exactly one slash
    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Execute GET and decode the JSON body
    async fn get_json<T>(&self, endpoint: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ParseError(format!("Failed to deserialize {url}: {e}")))
    }

    /// Execute POST with a JSON body and return the raw response text
    async fn post_for_text<B>(&self, endpoint: &str, body: &B) -> ApiResult<String>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        debug!("POST {}", url);

        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/octet-stream")
            .json(body);

        let response = self.send(request).await?;
        response.text().await.map_err(ApiError::from_transport)
    }

    /// Attach the bearer token, send, and reject anything but 200
    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .bearer_auth(self.token.secret())
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::HttpStatus { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl CodelistSource for ApiClient {
    async fn list_domains(&self) -> ApiResult<Vec<Domain>> {
        let enums: Enumerations = self.get_json(ENUMERATIONS_ENDPOINT).await?;
        Ok(enums.domain)
    }

    async fn list_reference_data_sets(&self) -> ApiResult<Vec<RdsRecord>> {
        self.get_json(RDS_ENDPOINT).await
    }

    async fn list_codelists(&self, rds: &RdsId) -> ApiResult<Vec<Codelist>> {
        self.get_json(&format!("{RDS_ENDPOINT}/{rds}/codelists"))
            .await
    }

    async fn export_codelist(&self, codelist: &Codelist) -> ApiResult<String> {
        let request = ExportRequest::for_codelist(&codelist.id, &codelist.name);
        let content = self.post_for_text(EXPORT_ENDPOINT, &request).await?;

        if content.is_empty() {
            return Err(ApiError::EmptyExport(codelist.id.clone()));
        }

        debug!(
            "Exported codelist {}: {} bytes",
            codelist.id,
            content.len()
        );
        Ok(content)
    }
}
