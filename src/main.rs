//! Main entry point for the codelist-exporter CLI

use clap::Parser;
use codelist_exporter::cli::Cli;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("codelist_exporter=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

// Requests are awaited one at a time; a single-threaded runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = cli.execute().await.map_err(|e| anyhow::anyhow!(e));

    if let Err(e) = result {
        error!("Export failed: {}", e);
        std::process::exit(1);
    }
}
