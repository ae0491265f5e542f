//! Export configuration file
//!
//! One TOML file holds a section per environment plus a few run-wide settings:
//!
//! ```toml
//! certificate = "API_Data/root.pem"
//! output_dir = "exports"
//! recovery_delay_ms = 1000
//!
//! [DEV]
//! client_id = "exporter"
//! client_secret = "secret"
//! api_base_url = "https://mdm.example.com/api/v1"
//! token_url = "https://mdm.example.com/oauth/token"
//! ```
//!
//! Only the section of the selected [`Environment`] is ever read.

use reqwest::{Certificate, Client};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::Environment;

/// Default location of the config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "API_Data/api_info.toml";

/// Pause before the single recovery attempt.
/// 1 second lets a rate-limit window or a flapping upstream settle without
/// noticeably slowing a run of a few hundred codelists.
pub const DEFAULT_RECOVERY_DELAY_MS: u64 = 1000;

/// Per-request timeout. Large codelist exports can take tens of seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {message}")]
    ReadError {
        /// File that was read
        path: PathBuf,
        /// Underlying IO error
        message: String,
    },

    /// Config file is not valid TOML or has the wrong shape
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// No section for the requested environment
    #[error("no [{0}] section in config")]
    MissingEnvironment(Environment),

    /// A required key is empty
    #[error("[{environment}] {key} must not be empty")]
    EmptyValue {
        /// Environment section
        environment: Environment,
        /// Offending key
        key: &'static str,
    },

    /// Trust anchor could not be loaded
    #[error("certificate error: {0}")]
    CertificateError(String),

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClientError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Credentials and endpoints for one environment
#[derive(Clone, Deserialize)]
pub struct EnvironmentProfile {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Base URL of the API (e.g. `https://host/api/v1`)
    pub api_base_url: String,
    /// Token endpoint for the client-credentials grant
    pub token_url: String,
}

impl std::fmt::Debug for EnvironmentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentProfile")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl EnvironmentProfile {
    fn validate(&self, environment: Environment) -> ConfigResult<()> {
        let fields = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("api_base_url", &self.api_base_url),
            ("token_url", &self.token_url),
        ];

        for (key, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyValue { environment, key });
            }
        }

        Ok(())
    }
}

/// Parsed config file
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// PEM trust anchor added to the HTTP client's root store
    #[serde(default)]
    pub certificate: Option<PathBuf>,

    /// Directory in which the output folder and archive are created
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Pause before the recovery attempt, in milliseconds
    #[serde(default)]
    pub recovery_delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(rename = "DEV", default)]
    dev: Option<EnvironmentProfile>,

    #[serde(rename = "UAT", default)]
    uat: Option<EnvironmentProfile>,

    #[serde(rename = "PROD", default)]
    prod: Option<EnvironmentProfile>,
}

impl ExportConfig {
    /// Load and parse a config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        info!("Loading config: path={}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::parse(&raw)
    }

    /// Parse config from TOML text
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Profile for the selected environment
    ///
    /// Reads only the section named after `environment`; the other sections are
    /// never inspected, so they may be absent or incomplete.
    pub fn profile(&self, environment: Environment) -> ConfigResult<&EnvironmentProfile> {
        let profile = match environment {
            Environment::Dev => self.dev.as_ref(),
            Environment::Uat => self.uat.as_ref(),
            Environment::Prod => self.prod.as_ref(),
        }
        .ok_or(ConfigError::MissingEnvironment(environment))?;

        profile.validate(environment)?;
        debug!("Using profile {}: {:?}", environment, profile);
        Ok(profile)
    }

    /// Output directory, defaulting to the working directory
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Pause before the recovery attempt
    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms.unwrap_or(DEFAULT_RECOVERY_DELAY_MS))
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Build the shared HTTP client, trusting the configured certificate if any
    pub fn http_client(&self) -> ConfigResult<Client> {
        let mut builder = Client::builder().timeout(self.request_timeout());

        if let Some(path) = &self.certificate {
            let pem = std::fs::read(path).map_err(|e| {
                ConfigError::CertificateError(format!(
                    "failed to read {}: {e}",
                    path.display()
                ))
            })?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                ConfigError::CertificateError(format!("invalid PEM {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
            debug!("Trust anchor loaded from {}", path.display());
        }

        builder
            .build()
            .map_err(|e| ConfigError::HttpClientError(e.to_string()))
    }
}
