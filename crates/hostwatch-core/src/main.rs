//! Hostwatch CLI
//!
//! Foreground watchdog that emails an alert when CPU or memory usage crosses
//! a threshold.

use anyhow::Context;
use clap::{Parser, Subcommand};
use hostwatch::alerting::{Notifier, SmtpNotifier};
use hostwatch::config::{LogFormat, LoggingConfig};
use hostwatch::models::{Breach, Reading, ThresholdConfig};
use hostwatch::monitor::Monitor;
use hostwatch::sampler::{host_name, SystemSampler};
use hostwatch::Config;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Hostwatch - CPU and memory watchdog
#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "HOSTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor until interrupted (default)
    Run,

    /// Take one reading and report whether it would alert
    Check,

    /// Send a test alert through the configured SMTP server
    TestAlert,

    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_monitor(config).await,
        Commands::Check => run_check(&config, cli.format).await,
        Commands::TestAlert => run_test_alert(config).await,
        Commands::Config => print_config(&config, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Console output plus an optional append-only log file.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process.
fn init_logging(config: &LoggingConfig, verbose: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    });

    let mut guard = None;
    if let Some(path) = &config.file {
        let (dir, file_name) = split_log_path(path)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name.to_string_lossy())
            .build(dir)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        layers.push(match config.format {
            LogFormat::Pretty => file_layer.boxed(),
            LogFormat::Json => file_layer.json().boxed(),
        });
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(guard)
}

fn split_log_path(path: &Path) -> anyhow::Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, file_name))
}

async fn run_monitor(config: Config) -> anyhow::Result<()> {
    let notifier = SmtpNotifier::new(config.smtp.clone());
    if let Err(e) = notifier.check_config() {
        error!(
            error = %e,
            "Email alerts cannot be delivered with the current configuration; monitoring continues"
        );
    }

    let mut monitor = build_monitor(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        match watch_interrupts(tokio::signal::ctrl_c, on_interrupt).await {
            Ok(()) => {
                warn!("Second interrupt received, exiting immediately");
                std::process::exit(FORCED_EXIT_CODE);
            }
            Err(e) => error!(error = %e, "Failed to listen for interrupt signal"),
        }
    });

    monitor.run_forever(cancel).await;
    Ok(())
}

/// Exit status when a second interrupt cuts shutdown short (128 + SIGINT)
const FORCED_EXIT_CODE: i32 = 130;

/// Cancel on the first interrupt, then return once a second one arrives.
///
/// The first interrupt lets the current iteration finish; the caller treats
/// the second as a request to stop without waiting for in-flight work.
async fn watch_interrupts<F, Fut>(
    mut interrupt: F,
    cancel: CancellationToken,
) -> std::io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    interrupt().await?;
    info!("Interrupt received, shutting down");
    cancel.cancel();

    interrupt().await
}

#[derive(Serialize)]
struct CheckReport {
    reading: Reading,
    thresholds: ThresholdConfig,
    breach: Breach,
}

async fn run_check(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let mut monitor = build_monitor(config);
    let (reading, breach) = monitor.check().await?;
    let thresholds = *monitor.thresholds();

    match format {
        OutputFormat::Json => {
            let report = CheckReport {
                reading,
                thresholds,
                breach,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "CPU:    {:5.1}% (limit {}%)",
                reading.cpu_percent, thresholds.cpu_threshold
            );
            println!(
                "Memory: {:5.1}% (limit {}%)",
                reading.memory_percent, thresholds.memory_threshold
            );
            let status = match (breach.cpu, breach.memory) {
                (false, false) => "OK",
                (true, false) => "ALERT (cpu)",
                (false, true) => "ALERT (memory)",
                (true, true) => "ALERT (cpu, memory)",
            };
            println!("Status: {status}");
        }
    }

    Ok(())
}

fn build_monitor(config: &Config) -> Monitor<SystemSampler, SmtpNotifier> {
    Monitor::new(
        config.thresholds(),
        SystemSampler::new(config.monitor.cpu_sample_window()),
        SmtpNotifier::new(config.smtp.clone()),
        host_name(),
    )
}

async fn run_test_alert(config: Config) -> anyhow::Result<()> {
    let mut monitor = build_monitor(&config);
    monitor
        .send_test_alert("Server Alert: Test Notification")
        .await
        .with_context(|| format!("test alert to {} failed", config.smtp.to))?;

    println!("Test alert sent to {}", config.smtp.to);
    Ok(())
}

fn print_config(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let redacted = config.redacted();
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&redacted)?,
        OutputFormat::Text => format!("{redacted:#?}"),
    };
    println!("{rendered}");
    Ok(())
}
