//! Playback state machine: ties timer ticks and user actions to cache
//! lookups, and owns the session's failure budget.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use image::RgbaImage;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::PrefetchCache;
use crate::events::{ControlEvent, FrameReady};
use crate::order::PlaybackOrder;
use crate::processing::layout;
use crate::quarantine::Quarantine;
use crate::source::ImageSource;
use crate::tasks::loader::{Prefetcher, fetch_decoded};

/// Consecutive load failures tolerated before the session dies.
pub const MAX_ERROR_COUNT: u32 = 5;

/// How long to linger on a failed slot before moving on.
const FAILURE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Counters owned by the controller and reported once at session end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub displayed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub failures: u64,
}

/// Everything the controller shares with the rest of the session.
pub struct SessionContext {
    pub order: Arc<PlaybackOrder>,
    pub source: Arc<ImageSource>,
    pub cache: Arc<PrefetchCache>,
    pub prefetcher: Prefetcher,
    pub quarantine: Arc<Quarantine>,
    pub interval: Duration,
    pub viewport: (u32, u32),
    pub fullscreen: bool,
}

struct Controller {
    ctx: SessionContext,
    to_viewer: Sender<FrameReady>,
    current: usize,
    paused: bool,
    fullscreen: bool,
    viewport: (u32, u32),
    /// Armed while a tick is pending; `None` cancels it.
    deadline: Option<Instant>,
    errors: u32,
    stats: SessionStats,
    shown: Option<(usize, Arc<RgbaImage>)>,
}

/// Drive the slideshow until cancellation (clean end, stats returned) or
/// until the error budget is exhausted (fatal error).
pub async fn run(
    ctx: SessionContext,
    mut commands: Receiver<ControlEvent>,
    to_viewer: Sender<FrameReady>,
    cancel: CancellationToken,
) -> Result<SessionStats> {
    let fullscreen = ctx.fullscreen;
    let viewport = ctx.viewport;
    let mut controller = Controller {
        ctx,
        to_viewer,
        current: 0,
        paused: false,
        fullscreen,
        viewport,
        deadline: None,
        errors: 0,
        stats: SessionStats::default(),
        shown: None,
    };

    // The first image is loaded synchronously before anything is displayed.
    controller.show_index(0).await?;

    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_cmd = commands.recv() => {
                let Some(cmd) = maybe_cmd else { break };
                controller.handle(cmd).await?;
            }
            _ = time::sleep_until(controller.deadline.unwrap_or_else(Instant::now)),
                if controller.deadline.is_some() =>
            {
                controller.deadline = None;
                controller.on_tick().await?;
            }
        }
    }

    let stats = controller.stats;
    info!(
        displayed = stats.displayed,
        cache_hits = stats.cache_hits,
        cache_misses = stats.cache_misses,
        failures = stats.failures,
        "session finished"
    );
    Ok(stats)
}

impl Controller {
    fn len(&self) -> usize {
        self.ctx.order.len()
    }

    fn name_of(&self, index: usize) -> &str {
        self.ctx
            .source
            .name_of(self.ctx.order.original_index_of(index))
    }

    async fn handle(&mut self, cmd: ControlEvent) -> Result<()> {
        debug!(?cmd, "control event");
        match cmd {
            ControlEvent::Next => {
                self.deadline = None;
                self.on_tick().await
            }
            ControlEvent::Previous => self.on_previous().await,
            ControlEvent::TogglePause => self.on_toggle_pause().await,
            ControlEvent::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                self.redraw();
                Ok(())
            }
            ControlEvent::Resize(w, h) => {
                self.viewport = (w, h);
                self.redraw();
                Ok(())
            }
        }
    }

    async fn on_tick(&mut self) -> Result<()> {
        let target = (self.current + 1) % self.len();
        self.show_index(target).await
    }

    /// Make `target` current: serve it from cache or load synchronously,
    /// emit the frame, re-arm the timer and queue the read-ahead prefetch.
    /// A tolerated load failure still advances to `target`, lingering only
    /// for the short retry delay so one bad image never stalls the show.
    async fn show_index(&mut self, target: usize) -> Result<()> {
        let Some(image) = self.lookup_or_load(target).await? else {
            self.current = target;
            self.ctx.cache.set_current(target);
            self.deadline = Some(Instant::now() + FAILURE_RETRY_DELAY);
            return Ok(());
        };
        self.current = target;
        self.ctx.cache.set_current(target);
        self.shown = Some((target, image));
        self.redraw();
        self.stats.displayed += 1;
        if !self.paused {
            self.deadline = Some(Instant::now() + self.ctx.interval);
        }
        self.ctx.prefetcher.enqueue((target + 1) % self.len());
        Ok(())
    }

    /// Cache lookup with synchronous fallback. `Ok(None)` is a tolerated,
    /// already-logged failure; `Err` means the budget is exhausted.
    async fn lookup_or_load(&mut self, index: usize) -> Result<Option<Arc<RgbaImage>>> {
        if let Some(image) = self.ctx.cache.get(index) {
            self.stats.cache_hits += 1;
            self.errors = 0;
            return Ok(Some(image));
        }
        self.stats.cache_misses += 1;
        self.sync_load(index).await
    }

    /// Blocking-from-the-show's-perspective load on the controller task.
    /// Degrades responsiveness on a miss, never correctness.
    async fn sync_load(&mut self, index: usize) -> Result<Option<Arc<RgbaImage>>> {
        match fetch_decoded(&self.ctx.source, &self.ctx.order, index).await {
            Ok(image) => {
                let image = Arc::new(image);
                self.ctx.cache.put(index, image.clone());
                self.errors = 0;
                Ok(Some(image))
            }
            Err(err) => {
                let name = self.name_of(index).to_string();
                warn!(index, name = %name, "load failed: {err}");
                self.ctx
                    .quarantine
                    .record(&format!("Error loading image {name}: {err}"));
                self.stats.failures += 1;
                self.errors += 1;
                if self.errors >= MAX_ERROR_COUNT {
                    bail!("aborting after {} consecutive load failures", self.errors);
                }
                Ok(None)
            }
        }
    }

    /// Two steps back, then a forward step, so the display ends up one
    /// image behind. A back-load failure instead advances the index first,
    /// landing the show two past the back target; kept to match the
    /// historical behavior.
    async fn on_previous(&mut self) -> Result<()> {
        self.deadline = None;
        let n = self.len();
        // saturating_sub keeps single- and two-image lists in range.
        let back = (self.current + n.saturating_sub(2)) % n;
        match self.lookup_or_load(back).await? {
            Some(_) => self.current = back,
            None => self.current = (back + 1) % n,
        }
        self.on_tick().await
    }

    async fn on_toggle_pause(&mut self) -> Result<()> {
        if self.paused {
            self.paused = false;
            info!("resumed");
            // Redisplay the current image for a fresh full interval rather
            // than skipping ahead.
            self.show_index(self.current).await
        } else {
            self.paused = true;
            self.deadline = None;
            info!("paused");
            Ok(())
        }
    }

    /// Emit (or re-emit) the current image, fitted to the viewport.
    fn redraw(&self) {
        let Some((index, image)) = &self.shown else {
            return;
        };
        let (iw, ih) = image.dimensions();
        let size = layout::fit_within(self.viewport.0, self.viewport.1, iw, ih);
        let frame = FrameReady {
            index: *index,
            name: self.name_of(*index).to_string(),
            image: image.clone(),
            size,
            fullscreen: self.fullscreen,
        };
        debug!(index = frame.index, name = %frame.name, w = size.0, h = size.1, "frame ready");
        if self.to_viewer.try_send(frame).is_err() {
            warn!("viewer channel full or closed; dropping frame");
        }
    }
}
