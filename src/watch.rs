//! Local trigger: poll a blob prefix and hand each new upload to the handler.
//!
//! Hosted deployments get their upload events from the platform. The
//! [`Watcher`] plays that role for a plain directory (or any other
//! [`BlobSource`]): it lists the input prefix on an interval and invokes
//! [`ResizeHandler::handle_path`] once per object version it has not seen
//! yet. Overwriting an upload produces a new version and a new invocation.
//!
//! Failures are logged and recorded, never retried. A failed version stays
//! in the seen-set until the object changes or disappears. Objects that
//! vanish from the listing are dropped from the set.

use crate::error::ResizeError;
use crate::handler::ResizeHandler;
use crate::output::HandlerOutcome;
use crate::storage::BlobSource;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

/// Polling behaviour of a [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Delay between listings. Default: 2 s.
    pub interval: Duration,
    /// Maximum uploads processed at once. Default: 4.
    pub concurrency: usize,
    /// Treat objects present at startup as already handled. Default: false.
    pub skip_existing: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            concurrency: 4,
            skip_existing: false,
        }
    }
}

/// Result of one invocation triggered by the watcher.
#[derive(Debug)]
pub struct ObjectResult {
    pub path: String,
    pub result: Result<HandlerOutcome, ResizeError>,
}

/// Running totals across scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WatchSummary {
    pub scans: u64,
    pub resized: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl WatchSummary {
    fn record(&mut self, results: &[ObjectResult]) {
        self.scans += 1;
        for r in results {
            match &r.result {
                Ok(HandlerOutcome::Resized(_)) => self.resized += 1,
                Ok(HandlerOutcome::Skipped { .. }) => self.skipped += 1,
                Err(_) => self.failed += 1,
            }
        }
    }
}

/// Polls a [`BlobSource`] and dispatches new uploads to a [`ResizeHandler`].
pub struct Watcher {
    handler: ResizeHandler,
    source: Arc<dyn BlobSource>,
    options: WatchOptions,
    /// Last version handled per path.
    seen: HashMap<String, String>,
    summary: WatchSummary,
}

impl Watcher {
    pub fn new(
        handler: ResizeHandler,
        source: Arc<dyn BlobSource>,
        options: WatchOptions,
    ) -> Result<Self, ResizeError> {
        if options.concurrency == 0 {
            return Err(ResizeError::InvalidConfig(
                "watch concurrency must be ≥ 1".into(),
            ));
        }
        Ok(Self {
            handler,
            source,
            options,
            seen: HashMap::new(),
            summary: WatchSummary::default(),
        })
    }

    pub fn summary(&self) -> &WatchSummary {
        &self.summary
    }

    /// Paths under the input prefix that the handler would accept and whose
    /// current version has not been seen.
    async fn new_paths(&mut self) -> Result<Vec<String>, ResizeError> {
        let prefix = self.handler.input_template().prefix().to_string();
        let listed = self
            .source
            .list(&prefix)
            .await
            .map_err(|e| ResizeError::Read {
                path: prefix.clone(),
                source: e,
            })?;

        let present: HashSet<&str> = listed.iter().map(|o| o.path.as_str()).collect();
        self.seen.retain(|path, _| present.contains(path.as_str()));

        let mut fresh = Vec::new();
        for object in &listed {
            if self.seen.get(&object.path) == Some(&object.version) {
                continue;
            }
            // Never feed our own output back in when the prefixes overlap.
            if self.handler.output_template().match_path(&object.path).is_some() {
                self.seen.insert(object.path.clone(), object.version.clone());
                continue;
            }
            if self.handler.input_template().match_path(&object.path).is_none() {
                continue;
            }
            self.seen.insert(object.path.clone(), object.version.clone());
            fresh.push(object.path.clone());
        }
        Ok(fresh)
    }

    /// Mark everything currently present as seen without processing it.
    pub async fn prime(&mut self) -> Result<usize, ResizeError> {
        let paths = self.new_paths().await?;
        debug!("Primed watcher with {} existing objects", paths.len());
        Ok(paths.len())
    }

    /// List once and process every new upload, up to `concurrency` at a time.
    pub async fn scan_once(&mut self) -> Result<Vec<ObjectResult>, ResizeError> {
        let paths = self.new_paths().await?;
        if paths.is_empty() {
            self.summary.scans += 1;
            return Ok(Vec::new());
        }
        info!("Found {} new upload(s)", paths.len());

        let handler = &self.handler;
        let source = self.source.as_ref();
        let results: Vec<ObjectResult> = stream::iter(paths.into_iter().map(|path| async move {
            let result = handler.handle_path(source, &path).await;
            match &result {
                Ok(HandlerOutcome::Resized(r)) => {
                    debug!("{} → {}", path, r.output_path)
                }
                Ok(HandlerOutcome::Skipped { input_bytes, .. }) => {
                    debug!("{} skipped ({} bytes)", path, input_bytes)
                }
                Err(e) => warn!("{} failed [{}]: {}", path, e.kind(), e),
            }
            ObjectResult { path, result }
        }))
        .buffer_unordered(self.options.concurrency)
        .collect()
        .await;

        self.summary.record(&results);
        Ok(results)
    }

    /// Poll until `shutdown` resolves. Listing failures are logged and retried
    /// on the next tick.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<WatchSummary, ResizeError>
    where
        F: Future<Output = ()>,
    {
        if self.options.skip_existing {
            self.prime().await?;
        }

        let mut interval = tokio::time::interval(self.options.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        info!(
            "Watching '{}' every {:?}",
            self.handler.input_template(),
            self.options.interval
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                tick = ticks.next() => {
                    if tick.is_none() {
                        break;
                    }
                    if let Err(e) = self.scan_once().await {
                        warn!("Scan failed: {}", e);
                    }
                }
            }
        }

        info!(
            "Watcher stopped after {} scans: {} resized, {} skipped, {} failed",
            self.summary.scans, self.summary.resized, self.summary.skipped, self.summary.failed
        );
        Ok(self.summary.clone())
    }
}
