//! Dated output folder and CSV files
//!
//! The folder is named `{domain}-codelists-{environment}-{date}` and lives under
//! a configurable root:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use codelist_exporter::output::OutputFolder;
//! use codelist_exporter::Environment;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let folder = OutputFolder::new("exports", "tSt", Environment::Dev, date);
//!
//! assert_eq!(folder.name(), "tSt-codelists-DEV-2024-03-01");
//! assert!(folder.archive_path().ends_with("tSt-codelists-DEV-2024-03-01.zip"));
//! ```

use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{OutputError, OutputResult};
use crate::{Environment, ExportedCodelist};

/// Working folder for one export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFolder {
    root: PathBuf,
    name: String,
}

impl OutputFolder {
    /// Folder for a domain, environment and date under `root`
    pub fn new(
        root: impl Into<PathBuf>,
        domain: &str,
        environment: Environment,
        date: NaiveDate,
    ) -> Self {
        Self {
            root: root.into(),
            name: format!(
                "{}-codelists-{}-{}",
                sanitize_file_stem(domain),
                environment,
                date.format("%Y-%m-%d")
            ),
        }
    }

    /// Folder dated with today's local date
    pub fn for_today(root: impl Into<PathBuf>, domain: &str, environment: Environment) -> Self {
        Self::new(root, domain, environment, Local::now().date_naive())
    }

    /// Folder name without the root
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full folder path
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// Path of the ZIP produced from this folder
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(format!("{}.zip", self.name))
    }

    /// CSV path for a codelist name
    pub fn csv_path(&self, codelist_name: &str) -> PathBuf {
        self.path()
            .join(format!("{}.csv", sanitize_file_stem(codelist_name)))
    }

    /// Create the folder if missing
    pub fn ensure_exists(&self) -> OutputResult<()> {
        let path = self.path();
        if !path.is_dir() {
            std::fs::create_dir_all(&path).map_err(|e| {
                OutputError::IoError(format!("Failed to create {}: {e}", path.display()))
            })?;
            info!("Created output folder {}", path.display());
        }
        Ok(())
    }

    /// Append a codelist's content to `{folder}/{name}.csv`
    ///
    /// Creates the folder on first use. Returns the written path.
    pub fn write_csv(&self, exported: &ExportedCodelist) -> OutputResult<PathBuf> {
        self.ensure_exists()?;

        let path = self.csv_path(&exported.codelist().name);
        append(&path, exported.content().as_bytes())?;

        debug!(
            "Wrote {} bytes for codelist {} to {}",
            exported.content().len(),
            exported.codelist().id,
            path.display()
        );
        Ok(path)
    }

    /// Compress the folder into [`Self::archive_path`] and delete it
    pub fn archive_and_cleanup(&self) -> OutputResult<PathBuf> {
        super::archive::archive_and_cleanup(&self.path(), &self.archive_path())
    }
}

fn append(path: &Path, bytes: &[u8]) -> OutputResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| OutputError::IoError(format!("Failed to open {}: {e}", path.display())))?;

    file.write_all(bytes)
        .map_err(|e| OutputError::IoError(format!("Failed to write {}: {e}", path.display())))
}

/// Make a name safe to use as a single path component
///
/// Path separators and NUL become `_`; `.` and `..` are prefixed so they
/// cannot address a parent directory. Everything else is kept verbatim.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" => "_".to_string(),
        "." | ".." => format!("_{cleaned}"),
        _ => cleaned,
    }
}
