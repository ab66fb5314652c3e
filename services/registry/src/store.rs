//! Content-addressed blob store

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::digest::Digest;

/// Shared handle to a content store.
pub type ArcStore = Arc<dyn ContentStore>;

/// Storage of payloads keyed by their digest.
///
/// Implementations must serialize mutations internally, so that concurrent
/// `put` calls never corrupt the mapping and `get` never sees a partially
/// written entry.
#[async_trait::async_trait]
pub trait ContentStore: std::fmt::Debug + Send + Sync {
    /// Name of the store, for logging.
    fn name(&self) -> &'static str;

    /// Store a payload under its digest and return the digest.
    ///
    /// Storing the same bytes twice is a no-op that returns the same digest.
    async fn put(&self, payload: Bytes) -> Digest;

    /// Fetch a payload, or `None` if nothing is stored under `digest`.
    async fn get(&self, digest: &Digest) -> Option<Bytes>;

    /// Check for a payload without fetching it.
    async fn contains(&self, digest: &Digest) -> bool {
        self.get(digest).await.is_some()
    }

    /// Number of distinct payloads stored.
    async fn len(&self) -> usize;

    /// True when nothing has been stored yet.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Content store that keeps every payload in memory for the lifetime of the
/// process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<Digest, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    #[tracing::instrument(skip_all, fields(store = self.name(), size = payload.len()))]
    async fn put(&self, payload: Bytes) -> Digest {
        let digest = Digest::from_bytes(&payload);

        let mut blobs = self.blobs.write().await;
        match blobs.entry(digest.clone()) {
            Entry::Vacant(entry) => {
                tracing::trace!(%digest, "stored new blob");
                entry.insert(payload);
            }
            Entry::Occupied(entry) => {
                // Only reachable on a hash collision.
                if entry.get() != &payload {
                    tracing::error!(%digest, "refusing to overwrite blob with different content");
                }
            }
        }

        digest
    }

    async fn get(&self, digest: &Digest) -> Option<Bytes> {
        let blobs = self.blobs.read().await;
        blobs.get(digest).cloned()
    }

    async fn contains(&self, digest: &Digest) -> bool {
        let blobs = self.blobs.read().await;
        blobs.contains_key(digest)
    }

    async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}
