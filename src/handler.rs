//! The upload handler: one invocation per uploaded object.
//!
//! ```text
//! UploadEvent ─▶ input check ─▶ size gate ─┬─▶ Skipped
//!                                          └─▶ decode ▶ resize ▶ encode ─▶ write ─▶ Resized
//! ```
//!
//! Invocations are independent. The handler holds only immutable config and a
//! shared sink, so any number of them may run concurrently for different
//! objects. Every buffer and raster is owned by the call and dropped on all
//! exit paths, including the early gate return and every `?`.

use crate::config::ResizeConfig;
use crate::error::ResizeError;
use crate::output::{Dimensions, HandlerOutcome, ResizeReport};
use crate::pipeline::{decode, encode, gate, resize, write};
use crate::storage::{BlobSink, BlobSource};
use crate::template::PathTemplate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A single upload delivered by a trigger.
#[derive(Debug, Clone)]
pub struct UploadEvent {
    /// Object name as substituted into the path templates.
    pub object_name: String,
    /// The uploaded bytes. `None` when the trigger supplied no stream.
    pub input: Option<Vec<u8>>,
}

impl UploadEvent {
    pub fn new(object_name: impl Into<String>, input: Vec<u8>) -> Self {
        Self {
            object_name: object_name.into(),
            input: Some(input),
        }
    }

    /// An event whose input stream is absent.
    pub fn without_input(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            input: None,
        }
    }
}

/// Produces a medium-size copy of each oversized upload.
#[derive(Clone)]
pub struct ResizeHandler {
    config: Arc<ResizeConfig>,
    input_template: PathTemplate,
    output_template: PathTemplate,
    sink: Arc<dyn BlobSink>,
}

impl std::fmt::Debug for ResizeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeHandler")
            .field("config", &self.config)
            .field("sink", &"<dyn BlobSink>")
            .finish()
    }
}

impl ResizeHandler {
    /// Create a handler writing to `sink`. Validates `config`.
    pub fn new(config: ResizeConfig, sink: Arc<dyn BlobSink>) -> Result<Self, ResizeError> {
        config.validate()?;
        let input_template = PathTemplate::parse(&config.input_pattern)?;
        let output_template = PathTemplate::parse(&config.output_template())?;
        Ok(Self {
            config: Arc::new(config),
            input_template,
            output_template,
            sink,
        })
    }

    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    pub fn input_template(&self) -> &PathTemplate {
        &self.input_template
    }

    pub fn output_template(&self) -> &PathTemplate {
        &self.output_template
    }

    /// Source path of the upload named `name`.
    pub fn input_path(&self, name: &str) -> String {
        self.input_template.render(name)
    }

    /// Destination path of the resized copy of `name`.
    pub fn output_path(&self, name: &str) -> String {
        self.output_template.render(name)
    }

    /// Run one invocation.
    ///
    /// # Errors
    /// - [`ResizeError::MissingInput`] — the event carried no input
    /// - [`ResizeError::Decode`] — the bytes are not a recognised image
    /// - [`ResizeError::InvalidDimensions`] — a target side floors to zero
    /// - [`ResizeError::Encode`] — the output format could not be produced
    /// - [`ResizeError::Write`] — the sink rejected the copy
    ///
    /// Nothing is written unless every stage before `write` succeeded.
    pub async fn handle(&self, event: UploadEvent) -> Result<HandlerOutcome, ResizeError> {
        let start = Instant::now();
        let UploadEvent { object_name, input } = event;

        let bytes = input.ok_or_else(|| ResizeError::MissingInput {
            name: object_name.clone(),
        })?;
        let input_bytes = bytes.len() as u64;
        debug!("Upload '{}': {} bytes", object_name, input_bytes);

        if gate::check(input_bytes, self.config.threshold_bytes) == gate::GateDecision::Skip {
            debug!(
                "'{}' below {} bytes, nothing to do",
                object_name, self.config.threshold_bytes
            );
            return Ok(HandlerOutcome::Skipped {
                object_name,
                input_bytes,
                threshold_bytes: self.config.threshold_bytes,
            });
        }

        info!(
            "'{}' is {} bytes (≥ {}), creating resized copy...",
            object_name, input_bytes, self.config.threshold_bytes
        );

        let config = Arc::clone(&self.config);
        let name = object_name.clone();
        let (original, target, encoded) =
            tokio::task::spawn_blocking(move || transform(&name, bytes, &config))
                .await
                .map_err(|e| ResizeError::Internal(format!("Resize task panicked: {e}")))??;

        let output_path = self.output_path(&object_name);
        let output_bytes = write::write(self.sink.as_ref(), &output_path, &encoded).await?;

        let report = ResizeReport {
            object_name,
            output_path,
            original,
            target,
            input_bytes,
            output_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Resized '{}' {} → {} ({} → {} bytes) in {}ms",
            report.object_name,
            report.original,
            report.target,
            report.input_bytes,
            report.output_bytes,
            report.duration_ms
        );
        Ok(HandlerOutcome::Resized(report))
    }

    /// Run one invocation for the object stored at `path` on `source`.
    ///
    /// `path` must match the configured input pattern; the object name is
    /// taken from the `{name}` part.
    pub async fn handle_path(
        &self,
        source: &dyn BlobSource,
        path: &str,
    ) -> Result<HandlerOutcome, ResizeError> {
        let name = self
            .input_template
            .match_path(path)
            .ok_or_else(|| ResizeError::PathMismatch {
                path: path.to_string(),
                pattern: self.config.input_pattern.clone(),
            })?;

        let input = source
            .read(path)
            .await
            .map_err(|e| ResizeError::Read {
                path: path.to_string(),
                source: e,
            })?;

        self.handle(UploadEvent {
            object_name: name,
            input,
        })
        .await
    }

    /// Blocking wrapper around [`ResizeHandler::handle`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from async code.
    pub fn handle_sync(&self, event: UploadEvent) -> Result<HandlerOutcome, ResizeError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ResizeError::Internal(format!("Failed to create tokio runtime: {e}")))?
            .block_on(self.handle(event))
    }
}

/// Decode, resize and encode. CPU-bound; runs on the blocking pool.
fn transform(
    name: &str,
    bytes: Vec<u8>,
    config: &ResizeConfig,
) -> Result<(Dimensions, Dimensions, Vec<u8>), ResizeError> {
    let image = decode::decode(name, &bytes)?;
    drop(bytes);

    let original = decode::dimensions(&image);
    let scale = resize::compute_scale(original, config.target_width)?;
    let target = resize::target_dimensions(original, scale)?;
    debug!(
        "'{}': {} × {:.4} → {}",
        name,
        original,
        scale.as_f64(),
        target
    );

    let medium = resize::resample(&image, target);
    drop(image);

    let encoded = encode::encode(&medium, &config.output_mime, config.quality)?;
    Ok((original, target, encoded))
}
