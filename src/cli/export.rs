//! Export command
//!
//! With no flags the operator is prompted for the environment and then the
//! domain. `--env` and `--domain` answer those prompts up front.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use super::CliError;
use crate::api::{auth, ApiClient};
use crate::config::{ExportConfig, DEFAULT_CONFIG_PATH};
use crate::output::OutputFolder;
use crate::pipeline::{ExportPipeline, ExportSummary, PipelineSettings, RunContext};
use crate::select::{PresetSelector, SelectionOption, SelectionProvider, TerminalSelector};
use crate::Environment;

/// Codelist Exporter CLI
#[derive(Parser, Debug)]
#[command(name = "codelist-exporter")]
#[command(about = "Export reference-data codelists to CSV files bundled in a ZIP archive", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file with per-environment credentials
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Environment (dev, uat or prod); prompted when omitted
    #[arg(long)]
    pub env: Option<Environment>,

    /// Domain key or label; prompted when omitted
    #[arg(long)]
    pub domain: Option<String>,

    /// Directory for the output folder and archive (overrides the config file)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// PEM trust anchor for the API (overrides the config file)
    #[arg(long)]
    pub certificate: Option<PathBuf>,
}

impl Cli {
    /// Run the export end to end
    ///
    /// The failure report is printed whenever the pipeline got far enough to
    /// record failures, including when it then stopped on a fatal error.
    pub async fn execute(&self) -> Result<ExportSummary, CliError> {
        let mut config = ExportConfig::load(&self.config)?;
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(cert) = &self.certificate {
            config.certificate = Some(cert.clone());
        }

        let environment = self.choose_environment()?;
        let profile = config.profile(environment)?;
        info!("===> Export started in {}", environment);

        let http = config.http_client()?;
        let token = auth::fetch_access_token(&http, profile).await?;
        let api = ApiClient::new(http, &profile.api_base_url, token);
        info!("===> Initial setup successful");

        let settings = PipelineSettings {
            recovery_delay: config.recovery_delay(),
        };
        let pipeline = ExportPipeline::new(&api, settings);

        let mut selector = selector_for(self.domain.as_deref());
        let domain = pipeline.choose_domain(selector.as_mut()).await?;

        let folder = OutputFolder::for_today(config.output_dir(), &domain.key, environment);
        let mut ctx = RunContext::new(folder);
        let result = pipeline.run(&domain, &mut ctx).await;

        match &result {
            Ok(summary) => {
                info!(
                    "===> Export completed: {}/{} codelists from {} RDS in {}",
                    summary.codelists_exported,
                    summary.codelists_found,
                    summary.rds_total,
                    summary.archive.display()
                );
                println!("\n{}", ctx.failures.render_report());
            }
            Err(_) if !ctx.failures.is_empty() => {
                warn!("Export stopped with {} failed item(s)", ctx.failures.len());
                println!("\n{}", ctx.failures.render_report());
            }
            Err(_) => {}
        }

        result.map_err(CliError::from)
    }

    fn choose_environment(&self) -> Result<Environment, CliError> {
        if let Some(env) = self.env {
            return Ok(env);
        }

        let options: Vec<SelectionOption> = Environment::ALL
            .iter()
            .map(|e| SelectionOption::new(e.as_str(), e.as_str()))
            .collect();

        let key = TerminalSelector::stdio().select("Select an environment", &options)?;
        Environment::from_str(&key).map_err(CliError::InvalidArgument)
    }
}

fn selector_for(answer: Option<&str>) -> Box<dyn SelectionProvider> {
    match answer {
        Some(answer) => Box::new(PresetSelector::new(answer)),
        None => Box::new(TerminalSelector::stdio()),
    }
}
