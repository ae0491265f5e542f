//! Codelist enumeration per RDS

use tracing::{info, warn};

use super::recovery::{with_recovery, RecoveryOutcome};
use super::{progress, ExportPipeline, PipelineError, PipelineResult, RunContext};
use crate::{Codelist, RdsId};

impl ExportPipeline<'_> {
    /// List the codelists of every RDS, in RDS order then listing order
    ///
    /// An RDS whose listing fails twice goes to `ctx.failures` and is skipped.
    ///
    /// # Errors
    /// [`PipelineError::NoCodelists`] when nothing was listed at all.
    pub async fn enumerate_codelists(
        &self,
        rds_ids: &[RdsId],
        ctx: &mut RunContext,
    ) -> PipelineResult<Vec<Codelist>> {
        let total = rds_ids.len();
        let mut codelists = Vec::new();

        for (i, rds) in rds_ids.iter().enumerate() {
            let source = self.source;
            let outcome = with_recovery(
                &format!("RDS {rds}"),
                self.settings.recovery_delay,
                move || source.list_codelists(rds),
            )
            .await;

            let status = outcome.status();
            match outcome {
                RecoveryOutcome::FirstAttempt(found) | RecoveryOutcome::Recovered(found) => {
                    info!(
                        "{} Codelists for RDS {} {}: {}",
                        progress(i, total),
                        rds,
                        status,
                        found.len()
                    );
                    codelists.extend(found);
                }
                RecoveryOutcome::Exhausted(err) => {
                    warn!("{} Codelists for RDS {} {}", progress(i, total), rds, status);
                    ctx.failures.record_rds(rds.clone(), &err);
                }
            }
        }

        if codelists.is_empty() {
            return Err(PipelineError::NoCodelists);
        }

        Ok(codelists)
    }
}
