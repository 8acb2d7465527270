//! Error types for the blob-medium-resize library.
//!
//! A single [`ResizeError`] covers every way an invocation can fail. None of
//! them are recovered inside the handler: they propagate to whoever delivered
//! the upload event (a hosting runtime, the [`crate::watch::Watcher`], or the
//! CLI), which decides whether to log, alert, retry or dead-letter.
//!
//! The size gate is *not* an error. An upload below the threshold completes
//! successfully with [`crate::output::HandlerOutcome::Skipped`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the blob-medium-resize library.
#[derive(Debug, Error)]
pub enum ResizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The trigger delivered no input stream for the object.
    #[error("No input data for '{name}': the upload event carried no stream")]
    MissingInput { name: String },

    /// The source store failed while reading the uploaded blob.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A trigger path does not fit the configured input pattern.
    #[error("Path '{path}' does not match input pattern '{pattern}'")]
    PathMismatch { path: String, pattern: String },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The uploaded bytes are not a recognised image.
    #[error("Cannot decode '{name}' as an image: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// The computed target size collapsed to zero on at least one axis.
    #[error(
        "Invalid target dimensions {target_width}x{target_height} \
         for a {width}x{height} source image"
    )]
    InvalidDimensions {
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    },

    /// No encoder for the output format, or the encoder itself failed.
    #[error("Failed to encode as '{format}': {detail}")]
    Encode { format: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output sink rejected or only partially accepted the write.
    #[error("Failed to write resized copy to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("Failed to read config file '{path}': {detail}")]
    ConfigFile { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResizeError {
    /// Short, stable identifier for the error kind, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ResizeError::MissingInput { .. } => "missing_input",
            ResizeError::Read { .. } => "read",
            ResizeError::PathMismatch { .. } => "path_mismatch",
            ResizeError::Decode { .. } => "decode",
            ResizeError::InvalidDimensions { .. } => "invalid_dimensions",
            ResizeError::Encode { .. } => "encode",
            ResizeError::Write { .. } => "write",
            ResizeError::InvalidConfig(_) => "invalid_config",
            ResizeError::ConfigFile { .. } => "config_file",
            ResizeError::Internal(_) => "internal",
        }
    }
}
