//! CLI binary for blob-medium-resize.
//!
//! A thin shim over the library crate that maps CLI flags to `ResizeConfig`,
//! serves a local directory as the blob store, and prints outcomes.

use anyhow::{Context, Result};
use blob_medium_resize::{
    FsBlobStore, HandlerOutcome, ResizeConfig, ResizeHandler, WatchOptions, Watcher,
};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Resize one upload stored at ./blobs/funkytown/Evidence/cat.jpg
  medium-resize --root ./blobs handle cat.jpg

  # Watch the input prefix and resize new uploads as they land
  medium-resize --root ./blobs watch --interval-ms 1000

  # Process what is there now and exit
  medium-resize --root ./blobs watch --once --json

  # Small threshold, JPEG output
  medium-resize --root ./blobs --threshold 100000 --format image/jpeg \
      --output-filename '{name}-medium.jpg' --quality 80 handle cat.jpg

CONFIG FILE (--config):
  JSON object with any of: input_pattern, output_dir, output_filename,
  threshold_bytes, target_width, output_mime, quality. Command-line flags
  override values from the file.
"#;

/// Write a downscaled copy of every oversized uploaded image.
#[derive(Parser, Debug)]
#[command(
    name = "medium-resize",
    version,
    about = "Write a downscaled copy of every oversized uploaded image",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory that holds the blob store.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_ROOT", default_value = ".")]
    root: PathBuf,

    /// JSON config file; flags below override its values.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Uploads smaller than this many bytes are left alone.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_THRESHOLD")]
    threshold: Option<u64>,

    /// Side of the square box the copy is fitted into, in pixels.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_TARGET_WIDTH")]
    target_width: Option<u32>,

    /// Encoder quality hint (0–100). Only JPEG uses it.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_QUALITY",
          value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Output MIME type: image/png or image/jpeg.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_FORMAT")]
    format: Option<String>,

    /// Input path pattern, e.g. 'uploads/{name}'.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_INPUT_PATTERN")]
    input_pattern: Option<String>,

    /// Output directory prefix, e.g. 'medium/'.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_OUTPUT_DIR")]
    output_dir: Option<String>,

    /// Output file name template, e.g. '{name}-medium.png'.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_OUTPUT_FILENAME")]
    output_filename: Option<String>,

    /// Print outcomes as JSON.
    #[arg(long, global = true, env = "MEDIUM_RESIZE_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MEDIUM_RESIZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MEDIUM_RESIZE_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the handler once for the upload named NAME.
    Handle {
        /// Object name substituted into the input pattern.
        name: String,
    },
    /// Poll the input prefix and handle each new upload.
    Watch {
        /// Delay between listings in milliseconds.
        #[arg(long, env = "MEDIUM_RESIZE_INTERVAL_MS", default_value_t = 2000)]
        interval_ms: u64,

        /// Maximum uploads processed at once.
        #[arg(short, long, env = "MEDIUM_RESIZE_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Ignore objects already present at startup.
        #[arg(long)]
        skip_existing: bool,

        /// Scan once and exit instead of polling.
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build handler ────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let store = Arc::new(FsBlobStore::new(&cli.root));
    let handler =
        ResizeHandler::new(config, store.clone()).context("Invalid configuration")?;

    match cli.command {
        Command::Handle { ref name } => {
            let path = handler.input_path(name);
            let outcome = handler
                .handle_path(store.as_ref(), &path)
                .await
                .with_context(|| format!("Failed to handle '{path}'"))?;
            print_outcome(&cli, &outcome)?;
        }
        Command::Watch {
            interval_ms,
            concurrency,
            skip_existing,
            once,
        } => {
            let options = WatchOptions {
                interval: Duration::from_millis(interval_ms.max(1)),
                concurrency,
                skip_existing,
            };
            let mut watcher =
                Watcher::new(handler, store, options).context("Invalid watch options")?;

            if once {
                let results = watcher.scan_once().await.context("Scan failed")?;
                for r in &results {
                    match &r.result {
                        Ok(outcome) => print_outcome(&cli, outcome)?,
                        Err(e) if cli.json => println!(
                            "{}",
                            serde_json::json!({
                                "outcome": "failed",
                                "path": r.path,
                                "kind": e.kind(),
                                "error": e.to_string(),
                            })
                        ),
                        Err(e) => eprintln!("✗ {}: {}", r.path, e),
                    }
                }
                if results.iter().any(|r| r.result.is_err()) {
                    anyhow::bail!("one or more uploads failed");
                }
            } else {
                let summary = watcher
                    .run_until(async {
                        let _ = tokio::signal::ctrl_c().await;
                    })
                    .await
                    .context("Watcher failed")?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&summary)
                            .context("Failed to serialise summary")?
                    );
                }
            }
        }
    }

    Ok(())
}

/// Config file first, then flag overrides, then validation.
fn build_config(cli: &Cli) -> Result<ResizeConfig> {
    let base = match cli.config {
        Some(ref path) => ResizeConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ResizeConfig::default(),
    };

    let mut builder = ResizeConfig::builder()
        .input_pattern(cli.input_pattern.clone().unwrap_or(base.input_pattern))
        .output_dir(cli.output_dir.clone().unwrap_or(base.output_dir))
        .output_filename(cli.output_filename.clone().unwrap_or(base.output_filename))
        .output_mime(cli.format.clone().unwrap_or(base.output_mime))
        .threshold_bytes(cli.threshold.unwrap_or(base.threshold_bytes))
        .target_width(cli.target_width.unwrap_or(base.target_width))
        .quality(base.quality);

    if let Some(q) = cli.quality {
        builder = builder.quality(q);
    }

    builder.build().context("Invalid configuration")
}

fn print_outcome(cli: &Cli, outcome: &HandlerOutcome) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string(outcome).context("Failed to serialise outcome")?
        );
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }
    match outcome {
        HandlerOutcome::Skipped {
            object_name,
            input_bytes,
            threshold_bytes,
        } => println!(
            "- {object_name}: {input_bytes} bytes < {threshold_bytes}, nothing written"
        ),
        HandlerOutcome::Resized(r) => println!(
            "✓ {}: {} → {}  {} → {} bytes  →  {}",
            r.object_name, r.original, r.target, r.input_bytes, r.output_bytes, r.output_path
        ),
    }
    Ok(())
}
