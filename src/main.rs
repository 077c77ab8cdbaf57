use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

mod cli;

use cli::Cli;
use digestr::audit::AuditLog;
use digestr::config::{self, AuditConfig, Config};
use digestr::delivery::TelegramClient;
use digestr::llm::AnthropicClient;
use digestr::probe::ShellExecutor;
use digestr::runner::DigestRunner;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = config::data_dir().join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("digestr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(config: &Config) -> Result<i32> {
    let audit = AuditLog::new(&config.audit.path);
    let executor = Arc::new(ShellExecutor::new());
    let delivery = Arc::new(
        audit
            .record_err(TelegramClient::new(&config.delivery))
            .context("Failed to create delivery client")?,
    );

    let runner = DigestRunner::new(config, executor, delivery).with_audit(audit);
    let outcome = runner
        .run(|api_key| AnthropicClient::with_api_key(api_key, &config.summarizer))
        .await;

    match &outcome.error {
        None => eprintln!("{}", "digest sent".green()),
        Some(error) => eprintln!("{} {}", "digest failed:".red(), error),
    }
    Ok(outcome.exit_code())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // no config yet, so failures go to the default audit path
    let startup_audit = AuditLog::new(AuditConfig::default().path);
    let config = startup_audit
        .record_err(Config::load(cli.config.as_ref()))
        .context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    let code = run_application(&config).await.context("Application failed")?;
    Ok(ExitCode::from(code as u8))
}
