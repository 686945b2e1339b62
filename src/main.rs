//! Skriv CLI entry point.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skriv::cli::{preflight, Cli};
use skriv::config::Settings;
use skriv::orchestrator::Orchestrator;
use skriv::transcription::{Transcriber, WhisperEngine};
use skriv::urls::read_urls_from_file;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("skriv={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load configuration: defaults <- config file <- env <- CLI flags
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut settings = Settings::load_from(config_path.as_ref())?;
    cli.apply_to(&mut settings);

    info!("Starting Skriv");
    preflight::check_tools().await;

    // Read URLs; missing or empty file is fatal before any job runs
    let urls = read_urls_from_file(&settings.urls_file())?;
    info!("Found {} URLs to process", urls.len());

    settings.create_directories()?;

    // Load the Whisper model once; it is shared across all jobs
    info!("Loading Whisper model ({})...", settings.whisper.model);
    let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperEngine::load(
        &settings.whisper.model_path(),
        &settings.whisper.language,
    )?);
    info!("Model loaded: {}", transcriber.model_name());

    let transcript_dir = settings.transcript_dir();
    let orchestrator = Orchestrator::new(settings, transcriber);

    info!("Starting processing...");
    let summary = orchestrator.run(&urls).await;

    info!("{}", "=".repeat(50));
    info!(
        "Complete! {} succeeded, {} failed.",
        summary.succeeded, summary.failed
    );
    info!("Transcripts saved to {}/", transcript_dir.display());

    Ok(if summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
