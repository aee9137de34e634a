//! Relink CLI - Command-line tool for delivery-stream record relinking
//!
//! This binary provides command-line interfaces for:
//! - transform: publish `Request`/`Response` fields and rewrite an envelope
//! - inspect: decode an envelope and list its records without publishing

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use relink_io::{
    execute_transform, inspect_envelope, EnvelopeInspection, FsObjectStore, InputSource,
    LinkExpiry, MemoryObjectStore, ObjectStore, OutputSink, TransformOptions, TransformRequest,
    TransformSummary,
};
use std::error::Error;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relink")]
#[command(about = "Offload delivery-stream log fields to an object store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish Request/Response fields and print the rewritten envelope
    ///
    /// Examples:
    ///   relink transform testData.json
    ///   relink transform batch.json -o out.json --store fs --store-root ./objects
    Transform {
        /// Input envelope (JSON), or "-" for stdin
        input: PathBuf,
        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// TOML options file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Bucket to publish to (overrides config and RELINK_BUCKET)
        #[arg(long)]
        bucket: Option<String>,
        /// Object-store region (overrides config and RELINK_REGION)
        #[arg(long)]
        region: Option<String>,
        /// Link lifetime in days (overrides config and RELINK_EXPIRY_DAYS)
        #[arg(long)]
        expiry_days: Option<u32>,
        /// Object store backend
        #[arg(long, value_enum, default_value_t = StoreKind::Memory)]
        store: StoreKind,
        /// Root directory for the fs store
        #[arg(long)]
        store_root: Option<PathBuf>,
        /// Indent the output JSON
        #[arg(long)]
        pretty: bool,
        /// Show progress spinner while transforming
        #[arg(long)]
        progress: bool,
        /// Suppress the summary line on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },
    /// Decode an envelope and list its records without publishing
    ///
    /// Examples:
    ///   relink inspect testData.json
    ///   relink inspect testData.json --format json
    Inspect {
        /// Input envelope (JSON), or "-" for stdin
        input: PathBuf,
        /// Output format (table, json)
        #[arg(long, value_enum, default_value_t = InspectFormat::Table)]
        format: InspectFormat,
        /// TOML options file (only limits are used)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum StoreKind {
    Memory,
    Fs,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum InspectFormat {
    Table,
    Json,
}

/// Flags that override file and environment options.
#[derive(Debug, Default, Clone)]
struct OptionOverrides {
    bucket: Option<String>,
    region: Option<String>,
    expiry_days: Option<u32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            input,
            output,
            config,
            bucket,
            region,
            expiry_days,
            store,
            store_root,
            pretty,
            progress,
            quiet,
        } => {
            let overrides = OptionOverrides {
                bucket,
                region,
                expiry_days,
            };
            handle_transform(
                input,
                output,
                config.as_deref(),
                overrides,
                store,
                store_root,
                pretty,
                progress,
                quiet,
            )?;
        }
        Commands::Inspect {
            input,
            format,
            config,
        } => {
            handle_inspect(input, format, config.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries the envelope, so logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_options(
    config: Option<&Path>,
    overrides: OptionOverrides,
) -> Result<TransformOptions, Box<dyn Error>> {
    let options = match config {
        Some(path) => TransformOptions::from_toml_file(path)?,
        None => TransformOptions::default(),
    };
    let mut options = options.apply_env()?;

    if let Some(bucket) = overrides.bucket {
        options.bucket = bucket;
    }
    if let Some(region) = overrides.region {
        options.region = region;
    }
    if let Some(days) = overrides.expiry_days {
        options.link_expiry = LinkExpiry::Days(days);
    }

    options.validate()?;
    Ok(options)
}

fn open_store(
    kind: StoreKind,
    root: Option<PathBuf>,
) -> Result<Arc<dyn ObjectStore>, Box<dyn Error>> {
    match kind {
        StoreKind::Memory => {
            if root.is_some() {
                return Err("--store-root only applies to --store fs".into());
            }
            Ok(Arc::new(MemoryObjectStore::new()))
        }
        StoreKind::Fs => {
            let root = root.ok_or("--store-root is required with --store fs")?;
            Ok(Arc::new(FsObjectStore::open(root)?))
        }
    }
}

fn input_source(path: &Path) -> InputSource {
    if path == Path::new("-") {
        InputSource::Reader(Box::new(std::io::stdin()))
    } else {
        InputSource::Path(path.to_path_buf())
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_transform(
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<&Path>,
    overrides: OptionOverrides,
    store: StoreKind,
    store_root: Option<PathBuf>,
    pretty: bool,
    show_progress: bool,
    quiet: bool,
) -> Result<(), Box<dyn Error>> {
    let options = resolve_options(config, overrides)?;
    debug!(?options, "resolved transform options");
    let store = open_store(store, store_root)?;

    let sink = match &output {
        Some(path) => OutputSink::Path(path.clone()),
        None => OutputSink::Writer(Box::new(std::io::stdout())),
    };
    let request = TransformRequest {
        input: input_source(&input),
        output: sink,
        options,
        store,
        pretty,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut progress_bar = show_progress.then(|| create_spinner("Transforming records"));
    let summary = runtime.block_on(execute_transform(request));
    if let Some(pb) = progress_bar.take() {
        match &summary {
            Ok(summary) => pb.finish_with_message(format!(
                "Relinked {} records",
                summary.metrics.records_transformed
            )),
            Err(_) => pb.abandon_with_message("Transform failed"),
        }
    }
    let summary = summary?;

    if !quiet {
        report_transform_summary(&summary, output.as_deref())?;
    }
    Ok(())
}

fn report_transform_summary(
    summary: &TransformSummary,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let secs = summary.runtime.wall_time.as_secs_f64().max(f64::EPSILON);
    let rec_rate = summary.metrics.records_transformed as f64 / secs;
    let destination = output
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());

    let mut message = format!(
        "Transformed to {} (records: {}, objects published: {}, bytes uploaded: {}, elapsed: {:.2?}, {:.1} rec/s",
        destination,
        summary.metrics.records_transformed,
        summary.metrics.objects_published,
        summary.metrics.bytes_uploaded,
        summary.runtime.wall_time,
        rec_rate
    );
    if let Some(peak) = summary.runtime.peak_rss_bytes {
        message.push_str(&format!(
            ", peak RSS: {:.1} MiB",
            peak as f64 / (1024.0 * 1024.0)
        ));
    }
    message.push(')');

    let mut stderr = std::io::stderr().lock();
    writeln!(&mut stderr, "{}", message)?;
    Ok(())
}

fn handle_inspect(
    input: PathBuf,
    format: InspectFormat,
    config: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let options = match config {
        Some(path) => TransformOptions::from_toml_file(path)?,
        None => TransformOptions::default(),
    };

    let bytes = read_all(&input)?;
    let inspection = inspect_envelope(&bytes, &options.limits)?;

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    match format {
        InspectFormat::Table => print_inspect_table(&mut writer, &inspection)?,
        InspectFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &inspection)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn read_all(path: &Path) -> Result<Vec<u8>, Box<dyn Error>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read(path)?)
    }
}

fn print_inspect_table<W: Write>(
    writer: &mut W,
    inspection: &EnvelopeInspection,
) -> Result<(), Box<dyn Error>> {
    writeln!(
        writer,
        "Invocation: {}",
        inspection.invocation_id.as_deref().unwrap_or("-")
    )?;
    writeln!(
        writer,
        "Stream: {}",
        inspection.delivery_stream_arn.as_deref().unwrap_or("-")
    )?;
    writeln!(
        writer,
        "Region: {}",
        inspection.region.as_deref().unwrap_or("-")
    )?;
    writeln!(
        writer,
        "Records: {} (upload bytes: {})",
        inspection.records.len(),
        inspection.upload_bytes()
    )?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:<6} {:<40} {:<10} {:>10} {:>10} {:>10}",
        "Index", "Record", "Result", "Payload", "Request", "Response"
    )?;

    let size = |value: Option<usize>| value.map_or_else(|| "null".to_string(), |n| n.to_string());
    for record in &inspection.records {
        let result = if record.result.is_empty() {
            "-"
        } else {
            record.result.as_str()
        };
        writeln!(
            writer,
            "{:<6} {:<40} {:<10} {:>10} {:>10} {:>10}",
            record.index,
            truncate(&record.record_id, 40),
            result,
            record.payload_bytes,
            size(record.request_bytes),
            size(record.response_bytes)
        )?;
    }
    Ok(())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
