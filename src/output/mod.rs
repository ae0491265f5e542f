//! Output writers
//!
//! Exported codelists land as CSV files in a dated [`OutputFolder`], which is
//! then compressed into a ZIP next to it and removed.

use std::path::PathBuf;

pub mod archive;
pub mod folder;

pub use archive::archive_and_cleanup;
pub use folder::{sanitize_file_stem, OutputFolder};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// ZIP write error
    #[error("archive error: {0}")]
    ArchiveError(String),

    /// Output folder does not exist
    #[error("output folder {0} does not exist")]
    MissingFolder(PathBuf),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
