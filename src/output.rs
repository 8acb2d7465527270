//! Result types returned by the handler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What a single invocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandlerOutcome {
    /// The upload was below the size threshold; nothing was written.
    Skipped {
        object_name: String,
        input_bytes: u64,
        threshold_bytes: u64,
    },
    /// A resized copy was written to the output sink.
    Resized(ResizeReport),
}

impl HandlerOutcome {
    pub fn object_name(&self) -> &str {
        match self {
            HandlerOutcome::Skipped { object_name, .. } => object_name,
            HandlerOutcome::Resized(r) => &r.object_name,
        }
    }

    pub fn is_resized(&self) -> bool {
        matches!(self, HandlerOutcome::Resized(_))
    }
}

/// Details of a written resized copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeReport {
    pub object_name: String,
    pub output_path: String,
    pub original: Dimensions,
    pub target: Dimensions,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub duration_ms: u64,
}
