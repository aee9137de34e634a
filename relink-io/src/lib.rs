//! Relink I/O - Envelope transformation and high-level APIs
//!
//! This crate drives the relinking of delivery-stream envelopes:
//!
//! - [`Transformer`]: decode, publish fields, re-encode
//! - [`TransformOptions`]: layered configuration
//! - [`execute_transform`]: file/stream level entry point with metrics
//! - [`inspect_envelope`]: decode-only dry run

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod inspect;
mod runtime;
pub mod transformer;

// Re-export commonly used types
pub use config::TransformOptions;
pub use inspect::{inspect_envelope, EnvelopeInspection, RecordInspection};
pub use relink_format::{Envelope, Limits, LogEntry, Record, RelinkError, Result};
pub use relink_store::{FsObjectStore, LinkExpiry, MemoryObjectStore, ObjectStore};
pub use runtime::RuntimeStats;
pub use transformer::{TransformMetrics, Transformer};

use runtime::RuntimeMeasurement;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Where the input envelope comes from.
pub enum InputSource {
    /// Read the envelope from a file
    Path(PathBuf),
    /// Envelope already in memory
    Bytes(Vec<u8>),
    /// Read the envelope from an arbitrary reader (e.g. stdin)
    Reader(Box<dyn Read + Send>),
}

/// Where the transformed envelope goes.
pub enum OutputSink {
    /// Write to a file, replacing it
    Path(PathBuf),
    /// Write to an arbitrary writer (e.g. stdout)
    Writer(Box<dyn Write + Send>),
}

/// A complete transformation job.
pub struct TransformRequest {
    /// Input envelope
    pub input: InputSource,
    /// Output destination
    pub output: OutputSink,
    /// Transformer options
    pub options: TransformOptions,
    /// Store field objects are published to
    pub store: Arc<dyn ObjectStore>,
    /// Indent the output JSON
    pub pretty: bool,
}

/// Result of [`execute_transform`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformSummary {
    /// Counters for the processed envelope
    pub metrics: TransformMetrics,
    /// Timing and memory
    pub runtime: RuntimeStats,
}

/// Read, transform and write one envelope.
///
/// Nothing is written to the output unless the whole envelope transformed
/// successfully.
pub async fn execute_transform(request: TransformRequest) -> Result<TransformSummary> {
    let measurement = RuntimeMeasurement::begin();
    let transformer = Transformer::new(request.store, request.options)?;

    let input = read_input(request.input).await?;
    let mut metrics = TransformMetrics::default();
    let output = transformer
        .transform_bytes(&input, request.pretty, &mut metrics)
        .await?;

    write_output(request.output, &output).await?;

    Ok(TransformSummary {
        metrics,
        runtime: measurement.finish(),
    })
}

async fn read_input(source: InputSource) -> Result<Vec<u8>> {
    match source {
        InputSource::Path(path) => Ok(tokio::fs::read(path).await?),
        InputSource::Bytes(bytes) => Ok(bytes),
        InputSource::Reader(mut reader) => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

async fn write_output(sink: OutputSink, bytes: &[u8]) -> Result<()> {
    match sink {
        OutputSink::Path(path) => tokio::fs::write(path, bytes).await?,
        OutputSink::Writer(mut writer) => {
            writer.write_all(bytes)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(())
}
