//! # blob-medium-resize
//!
//! Storage-triggered handler that writes a downscaled "medium" copy of every
//! oversized uploaded image.
//!
//! Large originals are expensive to serve and to feed into downstream jobs.
//! When an upload is at least `threshold_bytes` long, the handler decodes it,
//! fits it into a `target_width × target_width` box and stores the result
//! next to the original under a name derived from the upload's.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Gate     byte length < threshold → done, nothing written
//!  ├─ 2. Decode   sniff format, decode to a raster     ┐
//!  ├─ 3. Resize   floor(side × target / longest side)  ├ spawn_blocking
//!  ├─ 4. Encode   PNG (default) or JPEG                ┘
//!  └─ 5. Write    one blob at {output_dir}/{name}-medium.png
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blob_medium_resize::{FsBlobStore, ResizeConfig, ResizeHandler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FsBlobStore::new("/var/blobs"));
//!     let handler = ResizeHandler::new(ResizeConfig::default(), store.clone())?;
//!     let outcome = handler
//!         .handle_path(store.as_ref(), "funkytown/Evidence/holiday.jpg")
//!         .await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `medium-resize` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod handler;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod template;
pub mod watch;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ResizeConfig, ResizeConfigBuilder};
pub use error::ResizeError;
pub use handler::{ResizeHandler, UploadEvent};
pub use output::{Dimensions, HandlerOutcome, ResizeReport};
pub use pipeline::encode::OutputFormat;
pub use storage::{BlobSink, BlobSource, FsBlobStore, ListedObject, MemoryBlobStore};
pub use template::PathTemplate;
pub use watch::{ObjectResult, WatchOptions, WatchSummary, Watcher};
