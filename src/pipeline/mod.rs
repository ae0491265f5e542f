//! Export pipeline
//!
//! Runs the export as a strictly sequential chain of stages:
//!
//! 1. **Resolve**: list domains, filter reference data sets (RDS) by domain
//! 2. **Enumerate**: list the codelists of every RDS
//! 3. **Export**: fetch the CSV rows of every codelist
//! 4. **Persist**: write one CSV file per exported codelist
//! 5. **Archive**: zip the output folder and remove it
//!
//! Failures come out of two separate channels. Per-item requests (stages 2 and 3)
//! go through [`recovery::with_recovery`]; items that still fail are recorded in
//! the [`RunContext`]'s [`FailureSet`] and the stage moves on. Everything else
//! that can stop the run is a [`PipelineError`] returned to the caller.
//!
//! # Quick Start
//!
//! ```no_run
//! use codelist_exporter::api::CodelistSource;
//! use codelist_exporter::output::OutputFolder;
//! use codelist_exporter::pipeline::{ExportPipeline, PipelineSettings, RunContext};
//! use codelist_exporter::Environment;
//!
//! # async fn example(api: &dyn CodelistSource) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ExportPipeline::new(api, PipelineSettings::default());
//! let domains = pipeline.list_domains().await?;
//!
//! let mut ctx = RunContext::new(OutputFolder::for_today(".", &domains[0].key, Environment::Dev));
//! let summary = pipeline.run(&domains[0], &mut ctx).await?;
//!
//! println!("archive: {}", summary.archive.display());
//! println!("{}", ctx.failures.render_report());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiError, CodelistSource};
use crate::config::DEFAULT_RECOVERY_DELAY_MS;
use crate::output::{OutputError, OutputFolder};
use crate::select::SelectionError;
use crate::{Domain, ExportedCodelist};

pub mod enumerate;
pub mod export;
pub mod recovery;
pub mod report;
pub mod resolve;

pub use recovery::{with_recovery, FailureKind, RecoveryOutcome, MAX_ATTEMPTS};
pub use report::{FailedCodelist, FailedRds, FailureSet};

/// Conditions that stop the run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Domain listing was empty
    #[error("the API returned no domains")]
    NoDomains,

    /// No RDS belongs to the chosen domain
    #[error("invalid domain '{0}': no reference data sets found")]
    InvalidDomain(String),

    /// Every RDS listing failed or returned nothing
    #[error("no codelists found for any reference data set")]
    NoCodelists,

    /// Every codelist export failed
    #[error("no codelist could be exported")]
    NoContent,

    /// Request on a non-recoverable path failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Writing or archiving failed
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Operator selection failed
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
}

/// Result type for pipeline stages
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Tunables for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Pause before the recovery attempt
    pub recovery_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            recovery_delay: Duration::from_millis(DEFAULT_RECOVERY_DELAY_MS),
        }
    }
}

/// Mutable state threaded through the stages
#[derive(Debug)]
pub struct RunContext {
    /// Items that exhausted recovery
    pub failures: FailureSet,
    /// Where CSV files are written
    pub folder: OutputFolder,
}

impl RunContext {
    /// Fresh context writing into `folder`
    pub fn new(folder: OutputFolder) -> Self {
        Self {
            failures: FailureSet::new(),
            folder,
        }
    }
}

/// Counts and location of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Reference data sets in the chosen domain
    pub rds_total: usize,
    /// Codelists listed across all RDS
    pub codelists_found: usize,
    /// Codelists exported and written
    pub codelists_exported: usize,
    /// The ZIP archive
    pub archive: PathBuf,
}

/// The export pipeline over a codelist source
pub struct ExportPipeline<'a> {
    source: &'a dyn CodelistSource,
    settings: PipelineSettings,
}

impl<'a> ExportPipeline<'a> {
    /// Pipeline reading from `source`
    pub fn new(source: &'a dyn CodelistSource, settings: PipelineSettings) -> Self {
        Self { source, settings }
    }

    /// Run every stage after domain selection
    ///
    /// Stops at the first [`PipelineError`]; `ctx.failures` keeps whatever was
    /// recorded up to that point.
    pub async fn run(&self, domain: &Domain, ctx: &mut RunContext) -> PipelineResult<ExportSummary> {
        info!("===> Export started for domain '{}' ({})", domain.label, domain.key);

        let rds_ids = self.resolve_rds(&domain.key).await?;
        info!("===> Fetching of RDS successful: {} found", rds_ids.len());

        let codelists = self.enumerate_codelists(&rds_ids, ctx).await?;
        info!("===> Fetching of codelists successful: {} found", codelists.len());

        let exported = self.export_codelists(&codelists, ctx).await?;
        info!("===> Fetching of code values successful: {} exported", exported.len());

        persist(&exported, ctx)?;
        info!("===> All CSV files generated");

        let archive = ctx.folder.archive_and_cleanup()?;
        info!("===> '{}' generated", archive.display());

        Ok(ExportSummary {
            rds_total: rds_ids.len(),
            codelists_found: codelists.len(),
            codelists_exported: exported.len(),
            archive,
        })
    }
}

/// Write one CSV per exported codelist into the context's folder
pub fn persist(exported: &[ExportedCodelist], ctx: &RunContext) -> PipelineResult<()> {
    let total = exported.len();
    for (i, item) in exported.iter().enumerate() {
        let path = ctx.folder.write_csv(item)?;
        info!("{} CSV file '{}' generated", progress(i, total), path.display());
    }
    Ok(())
}

/// `[i/total]` prefix for a zero-based index
pub fn progress(index: usize, total: usize) -> String {
    format!("[{}/{}]", index + 1, total)
}
