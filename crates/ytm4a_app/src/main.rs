mod app;
mod cli;
mod config;
mod ui;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ytm4a_engine::{EngineConfig, JsonFileStore, QueueEngine, ReqwestProcessor};
use ytm4a_logging::{queue_info, queue_warn, LevelFilter, LogDestination};

use crate::cli::Cli;
use crate::config::{load_config, AppConfig, ResolvedSettings};
use crate::ui::prompt::{AssumeYes, StdinConfirm};
use crate::ui::render::Severity;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (config, config_error) = match load_config(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    let settings = ResolvedSettings::resolve(&cli, &config);

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let destination = match &settings.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    ytm4a_logging::initialize(destination, level);
    if let Some(err) = config_error {
        queue_warn!("Using default configuration: {}", err);
    }
    queue_info!(
        "store={:?} endpoint={}",
        settings.store_path,
        settings.processor.endpoint
    );

    let engine = QueueEngine::open(
        Arc::new(JsonFileStore::new(settings.store_path.clone())),
        Arc::new(ReqwestProcessor::new(settings.processor.clone())),
        EngineConfig::default(),
    )
    .await;

    let mut stdout = io::stdout().lock();
    let report = if cli.yes {
        app::run_command(&engine, cli.command, &mut AssumeYes, &mut stdout).await?
    } else {
        let mut prompt = StdinConfirm::new();
        app::run_command(&engine, cli.command, &mut prompt, &mut stdout).await?
    };

    Ok(match report.severity {
        Severity::Success => ExitCode::SUCCESS,
        Severity::Error => ExitCode::FAILURE,
    })
}
