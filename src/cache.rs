//! Bounded prefetch cache shared between the controller and the loader.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use image::RgbaImage;

struct Entry {
    image: Arc<RgbaImage>,
    seq: u64,
}

struct Inner {
    entries: HashMap<usize, Entry>,
    seq: u64,
    current: usize,
}

/// Map from playback index to a decoded, orientation-corrected image.
///
/// Holds at most `capacity` entries. Eviction removes the entry with the
/// smallest insertion sequence number, never the pinned current index and
/// never the entry being inserted; when the only other entry is the pinned
/// one, the cache overflows by that single entry instead of evicting it.
///
/// One mutex guards all state: the controller reads and occasionally writes
/// (synchronous fallback), the loader writes. Critical sections only move an
/// `Arc` and never block on IO.
pub struct PrefetchCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl PrefetchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                seq: 0,
                current: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Arc<RgbaImage>> {
        self.lock().entries.get(&index).map(|e| e.image.clone())
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.lock().entries.contains_key(&index)
    }

    /// Pin `index`: it will not be evicted until another index is pinned.
    pub fn set_current(&self, index: usize) {
        self.lock().current = index;
    }

    /// Insert an entry, evicting the oldest unpinned entry when the cache
    /// would exceed its capacity.
    pub fn put(&self, index: usize, image: Arc<RgbaImage>) {
        let mut inner = self.lock();
        inner.seq += 1;
        let seq = inner.seq;
        inner.entries.insert(index, Entry { image, seq });
        if inner.entries.len() > self.capacity {
            let current = inner.current;
            let victim = inner
                .entries
                .iter()
                .filter(|(k, _)| **k != current && **k != index)
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| *k);
            if let Some(victim) = victim {
                inner.entries.remove(&victim);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
