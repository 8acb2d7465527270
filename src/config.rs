//! Configuration types for the resize handler.
//!
//! Every path pattern and limit the handler uses lives in [`ResizeConfig`],
//! built via its [`ResizeConfigBuilder`] or loaded from a JSON file. Nothing
//! is hardcoded in the pipeline, so tests can run with a tiny threshold and
//! deployments can point at different containers without recompiling.
//!
//! The defaults reproduce the behaviour the handler was first deployed with:
//! uploads under `funkytown/Evidence/` of 2 MB or more get a PNG copy that
//! fits in a 500×500 box under `funkytown/MediumSize/`.

use crate::error::ResizeError;
use crate::pipeline::encode::OutputFormat;
use crate::template::{join_path, PathTemplate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_INPUT_PATTERN: &str = "funkytown/Evidence/{name}";
pub const DEFAULT_OUTPUT_DIR: &str = "funkytown/MediumSize/";
pub const DEFAULT_OUTPUT_FILENAME: &str = "{name}-medium.png";
pub const DEFAULT_THRESHOLD_BYTES: u64 = 2_000_000;
pub const DEFAULT_TARGET_WIDTH: u32 = 500;
pub const DEFAULT_OUTPUT_MIME: &str = "image/png";
pub const DEFAULT_QUALITY: u8 = 10;

/// Configuration for a [`crate::handler::ResizeHandler`].
///
/// # Example
/// ```rust
/// use blob_medium_resize::ResizeConfig;
///
/// let config = ResizeConfig::builder()
///     .threshold_bytes(1024)
///     .target_width(320)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_template(), "funkytown/MediumSize/{name}-medium.png");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Trigger path pattern, e.g. `funkytown/Evidence/{name}`.
    pub input_pattern: String,

    /// Directory-like prefix the resized copy is written under.
    pub output_dir: String,

    /// File name template for the resized copy, e.g. `{name}-medium.png`.
    pub output_filename: String,

    /// Uploads strictly smaller than this many bytes are left alone. Default: 2 000 000.
    pub threshold_bytes: u64,

    /// Side of the square box the resized copy is fitted into. Default: 500.
    ///
    /// Both axes are bounded by this value; there is no separate target height.
    pub target_width: u32,

    /// MIME type of the output encoding. Default: `image/png`.
    pub output_mime: String,

    /// Encoder quality hint (0–100). Default: 10.
    ///
    /// Only JPEG honours it. PNG is lossless and ignores the value.
    pub quality: u8,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            input_pattern: DEFAULT_INPUT_PATTERN.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            target_width: DEFAULT_TARGET_WIDTH,
            output_mime: DEFAULT_OUTPUT_MIME.to_string(),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ResizeConfig {
    /// Create a new builder for `ResizeConfig`.
    pub fn builder() -> ResizeConfigBuilder {
        ResizeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ResizeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ResizeError::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let config: ResizeConfig =
            serde_json::from_str(&text).map_err(|e| ResizeError::ConfigFile {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constraint [`ResizeConfigBuilder::build`] enforces.
    pub fn validate(&self) -> Result<(), ResizeError> {
        if self.target_width == 0 {
            return Err(ResizeError::InvalidConfig(
                "target width must be ≥ 1".into(),
            ));
        }
        if self.quality > 100 {
            return Err(ResizeError::InvalidConfig(format!(
                "quality must be 0–100, got {}",
                self.quality
            )));
        }
        PathTemplate::parse(&self.input_pattern)?;
        PathTemplate::parse(&self.output_template())?;
        OutputFormat::from_mime(&self.output_mime).ok_or_else(|| {
            ResizeError::InvalidConfig(format!(
                "no encoder for output format '{}'",
                self.output_mime
            ))
        })?;
        Ok(())
    }

    /// Full output template: `output_dir` joined with `output_filename`.
    ///
    /// Rendered per object by [`crate::handler::ResizeHandler::output_path`].
    pub fn output_template(&self) -> String {
        join_path(&self.output_dir, &self.output_filename)
    }
}

/// Builder for [`ResizeConfig`].
#[derive(Debug)]
pub struct ResizeConfigBuilder {
    config: ResizeConfig,
}

impl ResizeConfigBuilder {
    pub fn input_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.input_pattern = pattern.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn output_filename(mut self, filename: impl Into<String>) -> Self {
        self.config.output_filename = filename.into();
        self
    }

    pub fn threshold_bytes(mut self, bytes: u64) -> Self {
        self.config.threshold_bytes = bytes;
        self
    }

    pub fn target_width(mut self, px: u32) -> Self {
        self.config.target_width = px;
        self
    }

    pub fn output_mime(mut self, mime: impl Into<String>) -> Self {
        self.config.output_mime = mime.into();
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ResizeConfig, ResizeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
