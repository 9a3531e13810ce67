//! Scan Intake CLI
//!
//! Runs scan bundles through an in-memory pipeline and prints the outcomes as
//! JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scan_intake::adapters::{
    CompositeAuditSink, InMemoryAuditLog, InMemoryDigestLedger, InMemoryDriveRepository,
    LoggingAuditSink,
};
use scan_intake::{
    AssetId, BundleValidator, Canonicalizer, HardwareExtractor, IngestPipeline, PipelineConfig,
    ScanBundle,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Scan Intake - validate, deduplicate and reconcile hardware scan bundles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pipeline configuration file (YAML)
    #[arg(long, env = "SCAN_INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bundle size ceiling in bytes
    #[arg(long, env = "SCAN_INTAKE_MAX_BUNDLE_BYTES")]
    max_bundle_bytes: Option<usize>,

    /// Print Prometheus metrics after the command
    #[arg(long)]
    print_metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest bundles for one asset, in order
    Ingest {
        /// Asset the bundles are expected to describe
        #[arg(long)]
        asset: String,

        /// Who is uploading
        #[arg(long, default_value = "cli")]
        actor: String,

        /// Bundle files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Validate a bundle against its own asset id and print the hardware summary
    Extract {
        file: PathBuf,
    },

    /// Validate a bundle against its own asset id and print its content digest
    Digest {
        file: PathBuf,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = load_config(&args)?;

    match &args.command {
        Command::Ingest {
            asset,
            actor,
            files,
        } => ingest(config, asset, actor, files, args.print_metrics).await,
        Command::Extract { file } => extract(&config, file),
        Command::Digest { file } => digest(&config, file),
    }
}

fn load_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(limit) = args.max_bundle_bytes {
        config.max_bundle_bytes = limit;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Validate a bundle file against the asset it names, size ceiling first.
fn load_bundle(config: &PipelineConfig, file: &Path) -> anyhow::Result<ScanBundle> {
    let raw = read_file(file)?;
    BundleValidator::from_config(config)
        .validate_standalone(&raw)
        .with_context(|| format!("{} is not a valid bundle", file.display()))
}

/// Path as printed in JSON output; non-UTF-8 parts are replaced.
fn file_label(path: &Path) -> String {
    path.display().to_string()
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

async fn ingest(
    config: PipelineConfig,
    asset: &str,
    actor: &str,
    files: &[PathBuf],
    print_metrics: bool,
) -> anyhow::Result<()> {
    let asset_id = AssetId::new(asset);
    let audit_log = Arc::new(InMemoryAuditLog::new());
    let audit_sink = CompositeAuditSink::new()
        .with_sink(LoggingAuditSink::debug_level())
        .with_sink(audit_log.clone());

    let pipeline = IngestPipeline::new(
        config,
        Arc::new(InMemoryDigestLedger::new()),
        Arc::new(InMemoryDriveRepository::new()),
        Arc::new(audit_sink),
    )?;

    info!(asset_id = %asset_id, files = files.len(), "Ingesting bundles");

    let mut failures = 0usize;
    for path in files {
        let raw = read_file(path)?;
        let result = match pipeline.ingest(&asset_id, &raw, actor).await {
            Ok(outcome) => json!({ "file": file_label(path), "result": outcome }),
            Err(e) => {
                failures += 1;
                json!({
                    "file": file_label(path),
                    "error": {
                        "kind": e.kind(),
                        "category": e.category().to_string(),
                        "transient": e.is_transient(),
                        "message": e.to_string(),
                    }
                })
            }
        };
        print_json(&result)?;
    }

    let drives = pipeline.drives_for_asset(&asset_id).await?;
    print_json(&json!({
        "asset_id": asset_id,
        "drives": drives,
        "activity": audit_log.events_for_asset(&asset_id),
    }))?;

    if print_metrics {
        print!("{}", pipeline.metrics().encode_text()?);
    }

    if failures > 0 {
        bail!("{} of {} bundles rejected", failures, files.len());
    }
    Ok(())
}

fn extract(config: &PipelineConfig, file: &Path) -> anyhow::Result<()> {
    let bundle = load_bundle(config, file)?;
    let summary = HardwareExtractor::new(&config.extractor).extract_bundle(&bundle)?;
    print_json(&summary)
}

fn digest(config: &PipelineConfig, file: &Path) -> anyhow::Result<()> {
    let bundle = load_bundle(config, file)?;
    println!("{}", Canonicalizer::new().digest(&bundle)?);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
