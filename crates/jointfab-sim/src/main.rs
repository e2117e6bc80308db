//! jointfab-sim binary: runs one joint trust verification scenario and
//! prints the JSON report to stdout.

use jointfab_sim::{load_config, run_scenario, Report};
use std::process::ExitCode;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("JOINTFAB_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("jointfab.toml"));

    let config = match load_config(selected_config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration: {error}");
            return ExitCode::from(2);
        }
    };

    // Logs go to stderr; stdout carries the report.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let trust = LocalSet::new().run_until(run_scenario(&config)).await;
    let report = Report::from(&trust);

    match serde_json::to_string_pretty(&report) {
        Ok(rendered) => println!("{rendered}"),
        Err(error) => {
            tracing::error!(%error, "failed to render report");
            return ExitCode::FAILURE;
        }
    }

    if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        tracing::warn!(result = report.result, "administrator is not trusted");
        ExitCode::FAILURE
    }
}
