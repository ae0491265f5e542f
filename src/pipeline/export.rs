//! Codelist export

use tracing::{info, warn};

use super::recovery::{with_recovery, RecoveryOutcome};
use super::{progress, ExportPipeline, PipelineError, PipelineResult, RunContext};
use crate::api::ApiError;
use crate::{Codelist, ExportedCodelist};

impl ExportPipeline<'_> {
    /// Export every codelist, in enumeration order
    ///
    /// The recovery attempt re-issues the same export request. A codelist
    /// whose export fails twice goes to `ctx.failures` and is never written.
    ///
    /// # Errors
    /// [`PipelineError::NoContent`] when no codelist exported.
    pub async fn export_codelists(
        &self,
        codelists: &[Codelist],
        ctx: &mut RunContext,
    ) -> PipelineResult<Vec<ExportedCodelist>> {
        let total = codelists.len();
        let mut exported = Vec::with_capacity(total);

        for (i, codelist) in codelists.iter().enumerate() {
            let source = self.source;
            let outcome = with_recovery(
                &format!("codelist {} ({})", codelist.name, codelist.id),
                self.settings.recovery_delay,
                move || async move {
                    source.export_codelist(codelist).await.and_then(|content| {
                        ExportedCodelist::new(codelist.clone(), content)
                            .ok_or_else(|| ApiError::EmptyExport(codelist.id.clone()))
                    })
                },
            )
            .await;

            let status = outcome.status();
            match outcome {
                RecoveryOutcome::FirstAttempt(item) | RecoveryOutcome::Recovered(item) => {
                    info!(
                        "{} Code values for codelist {} {}",
                        progress(i, total),
                        codelist.id,
                        status
                    );
                    exported.push(item);
                }
                RecoveryOutcome::Exhausted(err) => {
                    warn!(
                        "{} Code values for codelist {} {}",
                        progress(i, total),
                        codelist.id,
                        status
                    );
                    ctx.failures.record_codelist(codelist.clone(), &err);
                }
            }
        }

        if exported.is_empty() {
            return Err(PipelineError::NoContent);
        }

        Ok(exported)
    }
}
