//! Domain listing and RDS resolution
//!
//! Neither call is retried: an empty or failing listing here is a
//! configuration problem, not a transient fault.

use tracing::{debug, info};

use super::{ExportPipeline, PipelineError, PipelineResult};
use crate::select::{SelectionOption, SelectionProvider};
use crate::{Domain, RdsId};

impl ExportPipeline<'_> {
    /// Domains available for export, in API order
    pub async fn list_domains(&self) -> PipelineResult<Vec<Domain>> {
        let domains = self.source.list_domains().await?;
        if domains.is_empty() {
            return Err(PipelineError::NoDomains);
        }

        debug!("{} domain(s) available", domains.len());
        Ok(domains)
    }

    /// List domains and let `selector` pick one
    pub async fn choose_domain(
        &self,
        selector: &mut dyn SelectionProvider,
    ) -> PipelineResult<Domain> {
        let domains = self.list_domains().await?;
        let options: Vec<SelectionOption> = domains
            .iter()
            .map(|d| SelectionOption::new(&d.label, &d.key))
            .collect();

        let key = selector.select("Select a domain", &options)?;
        let domain = domains
            .into_iter()
            .find(|d| d.key == key)
            .ok_or(PipelineError::InvalidDomain(key))?;

        info!("Domain selected: {} ({})", domain.label, domain.key);
        Ok(domain)
    }

    /// IDs of every RDS whose `domain` equals `domain_key`, in API order
    ///
    /// # Errors
    /// [`PipelineError::InvalidDomain`] when no RDS matches.
    pub async fn resolve_rds(&self, domain_key: &str) -> PipelineResult<Vec<RdsId>> {
        let records = self.source.list_reference_data_sets().await?;
        let total = records.len();

        let ids: Vec<RdsId> = records
            .into_iter()
            .filter(|r| r.domain.as_deref() == Some(domain_key))
            .map(|r| r.id)
            .collect();

        if ids.is_empty() {
            return Err(PipelineError::InvalidDomain(domain_key.to_string()));
        }

        debug!(
            "{} of {} RDS belong to domain '{}'",
            ids.len(),
            total,
            domain_key
        );
        Ok(ids)
    }
}
