//! Pipeline stages for producing the medium-size copy.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! gate ──▶ decode ──▶ resize ──▶ encode ──▶ write
//! (len)    (bytes)    (raster)   (raster)   (bytes → sink)
//! ```
//!
//! 1. [`gate`]   — skip uploads below the byte-size threshold
//! 2. [`decode`] — sniff and decode the uploaded bytes
//! 3. [`resize`] — fit into a `target × target` box, bilinear resampling
//! 4. [`encode`] — serialise in the configured output format
//! 5. [`write`]  — the only stage with externally visible side effects
//!
//! Stages 2–4 are CPU-bound and run together on the blocking pool.

pub mod decode;
pub mod encode;
pub mod gate;
pub mod resize;
pub mod write;
