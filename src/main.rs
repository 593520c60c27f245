#![warn(clippy::all, rust_2018_idioms)]

use std::process::ExitCode;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_types::region::Region;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use healthreport::app::accounts::SdkAccountDirectory;
use healthreport::app::config::{Cli, ReportConfig};
use healthreport::app::credentials::StsCredentialResolver;
use healthreport::app::error::ReportError;
use healthreport::app::health::HEALTH_REGION;
use healthreport::app::report::{write_report, XlsxSink};
use healthreport::app::runner::ReportRunner;

const DEFAULT_LOG_FILTER: &str = "healthreport=info,aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn,rustls=warn";

fn open_log_file() -> Option<(std::fs::File, std::path::PathBuf)> {
    let proj_dirs = directories::ProjectDirs::from("com", "", "healthreport")?;
    let log_dir = proj_dirs.data_dir().join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;

    let log_path = log_dir.join("healthreport.log");
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .ok()?;

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(&log_path, std::fs::Permissions::from_mode(0o600)) {
            eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
        }
    }

    Some((file, log_path))
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    // Warnings and errors always reach the terminal; everything the filter
    // admits goes to the log file when one can be opened.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(LevelFilter::WARN);

    let log_file = open_log_file();
    let file_layer = log_file.as_ref().and_then(|(file, _)| {
        let file = file.try_clone().ok()?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_filter(filter),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    // Dependencies that log through the `log` crate
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize log-to-tracing bridge: {}", e);
    }

    if let Some((_, path)) = log_file {
        tracing::info!("Logging initialized to: {:?}", path);
    }
}

async fn run(config: ReportConfig) -> Result<ExitCode, ReportError> {
    let base_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(HEALTH_REGION))
        .load()
        .await;

    let runner = ReportRunner::new(
        Arc::new(SdkAccountDirectory::new(&base_config)),
        Arc::new(StsCredentialResolver::new(base_config)),
    );
    let outcome = runner.run(&config).await?;

    let mut sink = XlsxSink::new(&config.output);
    write_report(&outcome.report, &mut sink)?;
    let written_to = sink.path().to_path_buf();
    sink.save()?;

    tracing::info!(
        "Report with {} events written to {} ({} accounts skipped, {} failed)",
        outcome.report.events.len(),
        written_to.display(),
        outcome.skipped.len(),
        outcome.failed.len()
    );
    println!(
        "Wrote {} events to {}",
        outcome.report.events.len(),
        written_to.display()
    );

    if outcome.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "Report is incomplete: {} account(s) could not be harvested",
            outcome.failed.len()
        );
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    tracing::info!(
        "healthreport {} starting, args: {:?}",
        env!("CARGO_PKG_VERSION"),
        cli
    );

    // Validation happens before any network call
    let config = match cli.into_config(Utc::now()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("ERROR: Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Report run aborted: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
