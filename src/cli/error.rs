//! CLI error types and conversions

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use crate::select::SelectionError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Authentication or other API error outside the pipeline
    #[error("API error: {0}")]
    ApiError(#[from] ApiError),

    /// Operator selection error
    #[error("selection error: {0}")]
    SelectionError(#[from] SelectionError),

    /// Fatal pipeline error
    #[error("export failed: {0}")]
    PipelineError(#[from] PipelineError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
