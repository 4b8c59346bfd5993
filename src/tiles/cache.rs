use crate::{
    tiles::loader::{FetchOutcome, ImageFetcher},
    Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// A decoded RGBA8 icon bitmap
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl MarkerImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Decodes PNG/JPEG/... bytes into an RGBA bitmap
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self::new(width, height, decoded.into_raw()))
    }
}

/// Load state of one icon URL
#[derive(Debug, Clone)]
pub enum IconEntry {
    Loading,
    Ready(Arc<MarkerImage>),
    Failed,
}

/// Shared icon cache keyed by URL with LRU eviction.
///
/// Thousands of markers usually share a handful of icons; the first request
/// for a URL starts one fetch and every later marker reuses the result.
pub struct IconStore {
    cache: Arc<Mutex<LruCache<String, IconEntry>>>,
    fetcher: Arc<dyn ImageFetcher>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl IconStore {
    /// Create a new icon store with the given capacity
    pub fn new(fetcher: Arc<dyn ImageFetcher>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let (tx, rx) = unbounded();
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            fetcher,
            tx,
            rx,
        }
    }

    /// Starts loading `url` unless it is already cached or in flight
    pub fn request(&self, url: &str) {
        let Ok(mut cache) = self.cache.lock() else {
            return;
        };
        if cache.get(url).is_some() {
            return;
        }
        cache.put(url.to_string(), IconEntry::Loading);
        drop(cache);

        log::debug!("requesting marker icon {url}");
        self.fetcher.fetch(url.to_string(), self.tx.clone());
    }

    /// Applies finished downloads. Returns how many entries settled.
    pub fn poll(&self) -> usize {
        let mut settled = 0;
        while let Ok((url, outcome)) = self.rx.try_recv() {
            let entry = match outcome.and_then(|bytes| MarkerImage::decode(&bytes)) {
                Ok(image) => {
                    log::debug!("icon {url} ready ({}x{})", image.width, image.height);
                    IconEntry::Ready(Arc::new(image))
                }
                Err(e) => {
                    log::warn!("icon {url} failed to load: {e}");
                    IconEntry::Failed
                }
            };
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(url, entry);
            }
            settled += 1;
        }
        settled
    }

    /// Current state of `url`, if it was ever requested
    pub fn status(&self, url: &str) -> Option<IconEntry> {
        self.cache.lock().ok()?.get(url).cloned()
    }

    /// Forgets a URL so the next request fetches it again
    pub fn forget(&self, url: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(url);
        }
    }

    /// Get the current number of cached icons
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for IconStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconStore").field("len", &self.len()).finish()
    }
}
