//! # Codelist Exporter Library
//!
//! Exports reference-data codelists from a data-management API into one CSV file per
//! codelist, bundled into a dated ZIP archive.
//!
//! ## Features
//!
//! - **Per-environment profiles**: DEV, UAT and PROD credentials from one TOML file
//! - **Bounded recovery**: every RDS listing and codelist export gets exactly one retry
//! - **Failure isolation**: items that exhaust recovery are collected, not fatal
//! - **Archive output**: CSV files are zipped and the working folder removed
//!
//! ## Quick Start
//!
//! ```no_run
//! use codelist_exporter::api::{auth, client::ApiClient};
//! use codelist_exporter::config::ExportConfig;
//! use codelist_exporter::pipeline::{ExportPipeline, PipelineSettings, RunContext};
//! use codelist_exporter::output::OutputFolder;
//! use codelist_exporter::Environment;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::load("API_Data/api_info.toml")?;
//! let profile = config.profile(Environment::Dev)?;
//!
//! let http = config.http_client()?;
//! let token = auth::fetch_access_token(&http, profile).await?;
//! let api = ApiClient::new(http, &profile.api_base_url, token);
//!
//! let pipeline = ExportPipeline::new(&api, PipelineSettings::default());
//! let domains = pipeline.list_domains().await?;
//! let folder = OutputFolder::for_today(".", &domains[0].key, Environment::Dev);
//! let mut ctx = RunContext::new(folder);
//! let summary = pipeline.run(&domains[0], &mut ctx).await?;
//! println!("{}", ctx.failures.render_report());
//! # let _ = summary;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Config file loading and environment profiles
//! - [`api`] - Authentication and the HTTP client for the export API
//! - [`pipeline`] - Resolve, enumerate, export, persist, archive, report
//! - [`output`] - Output folder, CSV files and ZIP archive
//! - [`select`] - Operator selection (terminal menu, preset answers)
//! - [`cli`] - Command-line driver

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// HTTP access to the export API
pub mod api;

/// CLI command implementation
pub mod cli;

/// Configuration file and environment profiles
pub mod config;

/// Output folder, CSV files and archive
pub mod output;

/// Export pipeline stages
pub mod pipeline;

/// Operator selection capability
pub mod select;

/// Deployment environment selecting a credential profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Development
    Dev,
    /// User acceptance testing
    Uat,
    /// Production
    Prod,
}

impl Environment {
    /// All environments in menu order
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Uat, Environment::Prod];

    /// Config section name for this environment
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "DEV",
            Environment::Uat => "UAT",
            Environment::Prod => "PROD",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEV" | "1" => Ok(Environment::Dev),
            "UAT" | "2" => Ok(Environment::Uat),
            "PROD" | "3" => Ok(Environment::Prod),
            _ => Err(format!(
                "Invalid environment: {s}. Valid options: dev, uat, prod"
            )),
        }
    }
}

/// Category of reference data chosen by the operator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    /// Human-readable label
    pub label: String,
    /// Key matched against the `domain` field of reference data sets
    pub key: String,
}

/// Identifier of a reference data set (RDS)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RdsId(pub String);

impl<'de> Deserialize<'de> for RdsId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        string_or_number(deserializer).map(RdsId)
    }
}

impl std::fmt::Display for RdsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RdsId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Codelist as listed under a reference data set
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Codelist {
    /// Codelist identifier, used as the export container id
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Codelist name, used as the CSV file name
    pub name: String,
}

impl Codelist {
    /// Create a codelist from id and name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Codelist whose rows were exported successfully
///
/// Construction rejects empty content, so anything of this type is safe to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedCodelist {
    codelist: Codelist,
    content: String,
}

impl ExportedCodelist {
    /// Attach exported CSV text to a codelist, `None` if the text is empty
    pub fn new(codelist: Codelist, content: String) -> Option<Self> {
        if content.is_empty() {
            return None;
        }
        Some(Self { codelist, content })
    }

    /// The exported codelist
    pub fn codelist(&self) -> &Codelist {
        &self.codelist
    }

    /// Raw CSV text as returned by the export endpoint
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Accept ids sent either as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
