//! Binary entrypoint for the slideshow.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use photo_slideshow::cache::PrefetchCache;
use photo_slideshow::config::Settings;
use photo_slideshow::order::PlaybackOrder;
use photo_slideshow::quarantine::Quarantine;
use photo_slideshow::source::{ImageSource, LocalSource, RemoteSource, ensure_ext};
use photo_slideshow::tasks::controller::SessionContext;
use photo_slideshow::tasks::{control, controller, loader, viewer};

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "photo-slideshow", about = "Randomized photo slideshow with prefetching")]
struct Cli {
    /// Photo list file (local mode) or session key (remote mode)
    #[arg(value_name = "PHOTOS", default_value = "photos.lst")]
    photos: String,

    /// Server URL for remote slideshow mode
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Path to YAML settings file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override per-image interval (ms)
    #[arg(long, value_name = "MILLIS")]
    interval_ms: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("photo_slideshow={}", level).parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut settings = Settings::from_yaml_file(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    if let Some(ms) = cli.interval_ms {
        settings.interval = Duration::from_millis(ms);
    }
    let settings = settings.validated().context("validating settings")?;

    let photos = ensure_ext(&cli.photos).context("photo list name is empty")?;
    let source = match &cli.server {
        Some(url) => ImageSource::Remote(
            RemoteSource::connect(url, &photos)
                .await
                .context("connecting to slideshow server")?,
        ),
        None => ImageSource::Local(LocalSource::open(Path::new(&photos))?),
    };
    info!(count = source.len(), "photo list ready");

    let order = Arc::new(PlaybackOrder::generate(source.len()));
    let source = Arc::new(source);
    let cache = Arc::new(PrefetchCache::new(settings.cache_capacity));
    let quarantine = Arc::new(Quarantine::new(&settings.quarantine_dir));
    let cancel = CancellationToken::new();

    let (prefetcher, queue) = loader::prefetch_channel(cache.clone(), loader::DEFAULT_QUEUE_DEPTH);
    let (command_tx, command_rx) = mpsc::channel(16);
    let (frame_tx, frame_rx) = mpsc::channel(16);

    let loader_task = tokio::spawn(loader::run(
        queue,
        source.clone(),
        order.clone(),
        cache.clone(),
        quarantine.clone(),
        cancel.clone(),
    ));
    let viewer_task = tokio::spawn(viewer::run(frame_rx, cancel.clone()));
    let control_task = tokio::spawn(control::run(command_tx, cancel.clone()));

    {
        // Ctrl-C ends the session cleanly.
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let ctx = SessionContext {
        order,
        source,
        cache,
        prefetcher,
        quarantine,
        interval: settings.interval,
        viewport: (settings.window_width, settings.window_height),
        fullscreen: settings.fullscreen,
    };
    let outcome = controller::run(ctx, command_rx, frame_tx, cancel.clone()).await;

    cancel.cancel();
    let _ = tokio::join!(loader_task, viewer_task, control_task);

    let stats = outcome?;
    info!(
        displayed = stats.displayed,
        cache_hits = stats.cache_hits,
        cache_misses = stats.cache_misses,
        failures = stats.failures,
        "slideshow ended"
    );
    Ok(())
}
