//! Envelope transformer
//!
//! Records are processed strictly in order. Within a record the `Request`
//! and `Response` publishes run concurrently and are both awaited before the
//! record is re-encoded, even when one of them fails. A failure ends the
//! whole call; objects already published stay where they are.

use crate::config::TransformOptions;
use relink_format::constants::RESULT_OK;
use relink_format::{
    decode_envelope, encode_envelope, encode_envelope_pretty, Envelope, LinkedField, LogEntry,
    Record, RelinkError, Result,
};
use relink_store::{publish_and_link, ObjectStore, PublishTarget, PublishedLink};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters accumulated while transforming one envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformMetrics {
    /// Records rewritten
    pub records_transformed: u64,
    /// Objects written to the store
    pub objects_published: u64,
    /// Field bytes written to the store
    pub bytes_uploaded: u64,
    /// Size of the encoded input envelope
    pub input_bytes: u64,
    /// Size of the encoded output envelope
    pub output_bytes: u64,
}

/// Rewrites envelopes by offloading log entry fields to an object store.
#[derive(Clone)]
pub struct Transformer {
    store: Arc<dyn ObjectStore>,
    options: TransformOptions,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Transformer {
    /// Create a transformer publishing to `store`.
    pub fn new(store: Arc<dyn ObjectStore>, options: TransformOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { store, options })
    }

    /// Options in effect.
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transform an encoded envelope, returning the encoded result.
    pub async fn transform(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut metrics = TransformMetrics::default();
        self.transform_bytes(input, false, &mut metrics).await
    }

    /// Transform an already decoded envelope.
    pub async fn transform_envelope(&self, envelope: Envelope) -> Result<Envelope> {
        let mut metrics = TransformMetrics::default();
        self.run(envelope, &mut metrics).await
    }

    pub(crate) async fn transform_bytes(
        &self,
        input: &[u8],
        pretty: bool,
        metrics: &mut TransformMetrics,
    ) -> Result<Vec<u8>> {
        self.options.limits.check_envelope_len(input.len())?;
        metrics.input_bytes = input.len() as u64;

        let envelope = decode_envelope(input)?;
        let envelope = self.run(envelope, metrics).await?;

        let output = if pretty {
            encode_envelope_pretty(&envelope)?
        } else {
            encode_envelope(&envelope)?
        };
        metrics.output_bytes = output.len() as u64;
        Ok(output)
    }

    pub(crate) async fn run(
        &self,
        mut envelope: Envelope,
        metrics: &mut TransformMetrics,
    ) -> Result<Envelope> {
        self.options
            .limits
            .check_record_count(envelope.records.len())?;

        info!(
            invocation_id = envelope.invocation_id.as_deref().unwrap_or("-"),
            records = envelope.records.len(),
            bucket = %self.options.bucket,
            region = %self.options.region,
            "transforming envelope"
        );

        for (index, record) in envelope.records.iter_mut().enumerate() {
            self.relink_record(index, record, metrics).await?;
        }

        Ok(envelope)
    }

    async fn relink_record(
        &self,
        index: usize,
        record: &mut Record,
        metrics: &mut TransformMetrics,
    ) -> Result<()> {
        record.result = RESULT_OK.to_string();
        self.options
            .limits
            .check_payload_len(&record.record_id, record.data.len())?;

        let mut entry = record.decode_payload(index)?;

        let expires_at = self
            .options
            .link_expiry
            .from_now()
            .map_err(|err| RelinkError::Config(err.to_string()))?;
        let target = PublishTarget {
            bucket: &self.options.bucket,
            content_type: &self.options.content_type,
            expires_at,
        };

        let request = self.publish_field(index, record, &entry, target, LinkedField::Request);
        let response = self.publish_field(index, record, &entry, target, LinkedField::Response);
        // Both publishes run to completion before either error is reported.
        let (request, response) = tokio::join!(request, response);
        let (request, response) = (request?, response?);

        let links = [
            (LinkedField::Request, request),
            (LinkedField::Response, response),
        ];
        for (field, link) in links {
            metrics.objects_published += 1;
            metrics.bytes_uploaded += link.bytes as u64;
            entry.set_linked(field, link.url);
        }

        record.encode_payload(&entry)?;
        metrics.records_transformed += 1;

        debug!(index, record_id = %record.record_id, "record relinked");
        Ok(())
    }

    async fn publish_field(
        &self,
        index: usize,
        record: &Record,
        entry: &LogEntry,
        target: PublishTarget<'_>,
        field: LinkedField,
    ) -> Result<PublishedLink> {
        publish_and_link(self.store.as_ref(), target, entry.linked(field))
            .await
            .map_err(|err| RelinkError::Publish {
                index,
                record_id: record.record_id.clone(),
                field,
                source: Box::new(err),
            })
    }
}
