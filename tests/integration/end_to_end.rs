//! End-to-end export runs against a mock API
//!
//! These drive the real HTTP client, the pipeline and the archive writer, and
//! read the resulting ZIP back.

use clap::Parser;
use codelist_exporter::api::{auth, ApiClient};
use codelist_exporter::cli::{Cli, CliError};
use codelist_exporter::config::ExportConfig;
use codelist_exporter::output::{OutputError, OutputFolder};
use codelist_exporter::pipeline::{ExportPipeline, PipelineError, PipelineSettings, RunContext};
use codelist_exporter::{Domain, Environment, RdsId};
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::ZipArchive;

fn config_toml(server: &MockServer, output_dir: &Path) -> String {
    format!(
        r#"
output_dir = "{output}"
recovery_delay_ms = 0

[DEV]
client_id = "exporter"
client_secret = "s3cret"
api_base_url = "{base}/api/v1"
token_url = "{base}/oauth/token"
"#,
        output = output_dir.display().to_string().replace('\\', "/"),
        base = server.uri()
    )
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_domains(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/enumerations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domain": [{"label": "Test", "key": "tSt"}, {"label": "Other", "key": "oth"}]
        })))
        .mount(server)
        .await;
}

async fn mount_rds(server: &MockServer, rds: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/rds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rds))
        .mount(server)
        .await;
}

async fn mount_codelists(server: &MockServer, rds: &str, codelists: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/rds/{rds}/codelists")))
        .respond_with(ResponseTemplate::new(200).set_body_json(codelists))
        .mount(server)
        .await;
}

async fn mount_export(server: &MockServer, codelist_id: &str, csv: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/v3/export"))
        .and(body_partial_json(json!({"containerId": codelist_id})))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv))
        .mount(server)
        .await;
}

fn read_zip(path: &Path) -> Vec<(String, String)> {
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        entries.push((file.name().to_string(), content));
    }
    entries.sort();
    entries
}

async fn connect(server: &MockServer) -> ApiClient {
    let config = ExportConfig::parse(&config_toml(server, Path::new("."))).unwrap();
    let profile = config.profile(Environment::Dev).unwrap();
    let http = config.http_client().unwrap();
    let token = auth::fetch_access_token(&http, profile).await.unwrap();
    ApiClient::new(http, &profile.api_base_url, token)
}

fn test_domain() -> Domain {
    Domain {
        label: "Test".to_string(),
        key: "tSt".to_string(),
    }
}

fn no_delay() -> PipelineSettings {
    PipelineSettings {
        recovery_delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_all_codelists_exported_into_archive() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_rds(
        &server,
        json!([
            {"id": "r1", "domain": "tSt"},
            {"id": "x1", "domain": "oth"},
            {"id": "r2", "domain": "tSt"}
        ]),
    )
    .await;
    mount_codelists(
        &server,
        "r1",
        json!([{"id": "c1", "name": "Units"}, {"id": "c2", "name": "Scales"}]),
    )
    .await;
    mount_codelists(&server, "r2", json!([{"id": "c3", "name": "Countries"}])).await;
    mount_export(&server, "c1", "m,metre\n").await;
    mount_export(&server, "c2", "c,celsius\n").await;
    mount_export(&server, "c3", "FR,France\n").await;

    let tmp = TempDir::new().unwrap();
    let api = connect(&server).await;
    let pipeline = ExportPipeline::new(&api, no_delay());
    let mut ctx = RunContext::new(OutputFolder::for_today(
        tmp.path(),
        "tSt",
        Environment::Dev,
    ));

    let summary = pipeline.run(&test_domain(), &mut ctx).await.unwrap();

    assert_eq!(summary.rds_total, 2);
    assert_eq!(summary.codelists_found, 3);
    assert_eq!(summary.codelists_exported, 3);
    assert_eq!(summary.archive, ctx.folder.archive_path());
    assert!(!ctx.folder.path().exists());
    assert!(ctx.failures.is_empty());

    assert_eq!(
        read_zip(&summary.archive),
        vec![
            ("Countries.csv".to_string(), "FR,France\n".to_string()),
            ("Scales.csv".to_string(), "c,celsius\n".to_string()),
            ("Units.csv".to_string(), "m,metre\n".to_string()),
        ]
    );

    // Folder is gone, so a second cleanup must fail
    assert!(matches!(
        ctx.folder.archive_and_cleanup(),
        Err(OutputError::MissingFolder(_))
    ));
}

#[tokio::test]
async fn test_rds_failing_twice_is_reported_and_skipped() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_rds(
        &server,
        json!([
            {"id": "r1", "domain": "tSt"},
            {"id": "r2", "domain": "tSt"},
            {"id": "r3", "domain": "tSt"}
        ]),
    )
    .await;
    mount_codelists(&server, "r1", json!([{"id": "c1", "name": "Units"}])).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/rds/r2/codelists"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;
    mount_codelists(&server, "r3", json!([{"id": "c3", "name": "Countries"}])).await;
    mount_export(&server, "c1", "m,metre\n").await;
    mount_export(&server, "c3", "FR,France\n").await;

    let tmp = TempDir::new().unwrap();
    let api = connect(&server).await;
    let pipeline = ExportPipeline::new(&api, no_delay());
    let mut ctx = RunContext::new(OutputFolder::for_today(
        tmp.path(),
        "tSt",
        Environment::Dev,
    ));

    let summary = pipeline.run(&test_domain(), &mut ctx).await.unwrap();

    let names: Vec<String> = read_zip(&summary.archive)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["Countries.csv", "Units.csv"]);

    assert_eq!(ctx.failures.rds().len(), 1);
    assert_eq!(ctx.failures.rds()[0].id, RdsId::from("r2"));
    assert!(ctx.failures.codelists().is_empty());

    let report = ctx.failures.render_report();
    assert!(report.contains("RDS r2"), "report: {report}");
    assert!(report.contains("boom"), "report: {report}");
}

#[tokio::test]
async fn test_export_failing_once_is_recovered_with_same_post() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_rds(&server, json!([{"id": "r1", "domain": "tSt"}])).await;
    mount_codelists(&server, "r1", json!([{"id": "c1", "name": "Units"}])).await;

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    Mock::given(method("POST"))
        .and(path("/api/v1/v3/export"))
        .and(body_partial_json(json!({"containerId": "c1", "containerType": "codelist"})))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429)
            } else {
                ResponseTemplate::new(200).set_body_string("m,metre\n")
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let api = connect(&server).await;
    let pipeline = ExportPipeline::new(&api, no_delay());
    let mut ctx = RunContext::new(OutputFolder::for_today(
        tmp.path(),
        "tSt",
        Environment::Dev,
    ));

    let summary = pipeline.run(&test_domain(), &mut ctx).await.unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(summary.codelists_exported, 1);
    assert!(ctx.failures.is_empty());
    assert_eq!(
        read_zip(&summary.archive),
        vec![("Units.csv".to_string(), "m,metre\n".to_string())]
    );
}

#[tokio::test]
async fn test_cli_runs_non_interactively() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_domains(&server).await;
    mount_rds(&server, json!([{"id": 7, "domain": "tSt"}])).await;
    mount_codelists(&server, "7", json!([{"id": 70, "name": "Units"}])).await;
    mount_export(&server, "70", "m,metre\n").await;

    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("api_info.toml");
    std::fs::write(&config_path, config_toml(&server, tmp.path())).unwrap();

    let cli = Cli::try_parse_from([
        "codelist-exporter",
        "--config",
        config_path.to_str().unwrap(),
        "--env",
        "dev",
        "--domain",
        "Test",
    ])
    .unwrap();

    let summary = cli.execute().await.unwrap();

    let expected = OutputFolder::for_today(tmp.path(), "tSt", Environment::Dev);
    assert_eq!(summary.archive, expected.archive_path());
    assert!(!expected.path().exists());
    assert_eq!(
        read_zip(&summary.archive),
        vec![("Units.csv".to_string(), "m,metre\n".to_string())]
    );
}

#[tokio::test]
async fn test_cli_unknown_domain_is_fatal() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_domains(&server).await;
    mount_rds(&server, json!([{"id": "r1", "domain": "tSt"}])).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/rds/r1/codelists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("api_info.toml");
    std::fs::write(&config_path, config_toml(&server, tmp.path())).unwrap();

    // "oth" is a listed domain but owns no RDS
    let cli = Cli::try_parse_from([
        "codelist-exporter",
        "--config",
        config_path.to_str().unwrap(),
        "--env",
        "dev",
        "--domain",
        "oth",
    ])
    .unwrap();

    let err = cli.execute().await.unwrap_err();

    assert!(matches!(
        err,
        CliError::PipelineError(PipelineError::InvalidDomain(ref key)) if key == "oth"
    ));
}

#[tokio::test]
async fn test_cli_missing_environment_section_is_fatal() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("api_info.toml");
    std::fs::write(&config_path, config_toml(&server, tmp.path())).unwrap();

    let cli = Cli::try_parse_from([
        "codelist-exporter",
        "--config",
        config_path.to_str().unwrap(),
        "--env",
        "prod",
        "--domain",
        "tSt",
    ])
    .unwrap();

    let err = cli.execute().await.unwrap_err();

    assert!(matches!(err, CliError::ConfigError(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
