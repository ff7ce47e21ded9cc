//! Background prefetch: a single worker drains a bounded queue of playback
//! indexes into the cache.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use image::RgbaImage;
use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::PrefetchCache;
use crate::error::LoadError;
use crate::order::PlaybackOrder;
use crate::processing::orient::decode_oriented;
use crate::quarantine::Quarantine;
use crate::source::ImageSource;

pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Fetch and decode one image by playback index, normalizing orientation.
/// Shared by the worker and the controller's synchronous fallback.
pub async fn fetch_decoded(
    source: &ImageSource,
    order: &PlaybackOrder,
    index: usize,
) -> Result<RgbaImage, LoadError> {
    let original = order.original_index_of(index);
    let bytes = source.fetch(original).await?;
    tokio::task::spawn_blocking(move || decode_oriented(&bytes))
        .await
        .map_err(|err| LoadError::Io(std::io::Error::other(err)))?
}

/// Producer half of the prefetch queue, held by the controller.
#[derive(Clone)]
pub struct Prefetcher {
    tx: Sender<usize>,
    pending: Arc<Mutex<HashSet<usize>>>,
    cache: Arc<PrefetchCache>,
}

impl Prefetcher {
    /// Queue a speculative load. Idempotent: returns `false` without
    /// queueing when the index is already cached or already
    /// queued/in-flight. A full queue also drops the request — prefetch is
    /// best-effort and the synchronous fallback covers the miss.
    pub fn enqueue(&self, index: usize) -> bool {
        if self.cache.contains(index) {
            return false;
        }
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if !pending.insert(index) {
                return false;
            }
        }
        match self.tx.try_send(index) {
            Ok(()) => true,
            Err(err) => {
                self.pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&index);
                debug!(index, "prefetch queue rejected request: {err}");
                false
            }
        }
    }
}

/// Consumer half of the prefetch queue, owned by the worker.
pub struct PrefetchQueue {
    rx: Receiver<usize>,
    pending: Arc<Mutex<HashSet<usize>>>,
}

/// Create the prefetch queue pair over a bounded channel.
pub fn prefetch_channel(cache: Arc<PrefetchCache>, depth: usize) -> (Prefetcher, PrefetchQueue) {
    let (tx, rx) = mpsc::channel(depth);
    let pending = Arc::new(Mutex::new(HashSet::new()));
    (
        Prefetcher {
            tx,
            pending: pending.clone(),
            cache,
        },
        PrefetchQueue { rx, pending },
    )
}

/// Worker loop: dequeue, fetch, normalize, cache. Failures are quarantined
/// and dropped — the request is not retried, and the controller's error
/// budget is untouched (it only counts its own synchronous loads). Runs for
/// the process lifetime; cancellation ends it with the session.
pub async fn run(
    mut queue: PrefetchQueue,
    source: Arc<ImageSource>,
    order: Arc<PlaybackOrder>,
    cache: Arc<PrefetchCache>,
    quarantine: Arc<Quarantine>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_index = queue.rx.recv() => {
                let Some(index) = maybe_index else { break };
                if !cache.contains(index) {
                    let name = source.name_of(order.original_index_of(index));
                    match fetch_decoded(&source, &order, index).await {
                        Ok(image) => {
                            cache.put(index, Arc::new(image));
                            debug!(index, name, "preloaded");
                        }
                        Err(err) => {
                            warn!(index, name, "prefetch failed: {err}");
                            quarantine.record(&format!("Error preloading image {name}: {err}"));
                        }
                    }
                }
                // Clear pending only after the cache write so a racing
                // enqueue cannot queue the same index twice.
                queue
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&index);
            }
        }
    }
    Ok(())
}
