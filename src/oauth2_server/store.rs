// ABOUTME: Generic expiring keyed store with single-use take semantics
// ABOUTME: Backs the authorization session and grant stores with TTL and background sweep
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Store entry with expiration
#[derive(Debug, Clone)]
struct StoreEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> StoreEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Configuration for an [`ExpiringStore`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of live entries; the oldest entry is evicted beyond
    /// this (the keyspace is attacker-writable, so growth must be bounded)
    pub max_entries: usize,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
    /// Whether to spawn the background sweep task
    pub enable_background_sweep: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            sweep_interval: Duration::from_secs(300),
            enable_background_sweep: true,
        }
    }
}

/// Keyed store whose entries expire at an absolute instant.
///
/// Expiry is enforced on every read: `get` and `take_once` never return an
/// entry past its deadline, whether or not the sweep has run. The sweep only
/// bounds memory growth. `take_once` removes the entry before returning it,
/// so concurrent redemptions of the same key yield exactly one winner.
///
/// Uses `Arc<RwLock<LruCache>>` shared between foreground operations and the
/// background sweep task; the sweep takes the same write lock as every other
/// mutation.
#[derive(Clone)]
pub struct ExpiringStore<V> {
    entries: Arc<RwLock<LruCache<String, StoreEntry<V>>>>,
    shutdown_tx: Option<Arc<tokio::sync::mpsc::Sender<()>>>,
}

impl<V> ExpiringStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Default capacity when config specifies zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a new store, spawning the sweep task if enabled.
    ///
    /// Must be called from within a tokio runtime when
    /// `enable_background_sweep` is set.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        let entries = Arc::new(RwLock::new(LruCache::new(capacity)));

        let shutdown_tx = if config.enable_background_sweep {
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
            let entries_clone = entries.clone();
            let sweep_interval = config.sweep_interval;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(sweep_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::sweep_entries(&entries_clone, Instant::now()).await;
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::debug!("expiring store sweep task received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            entries,
            shutdown_tx,
        }
    }

    /// Insert or overwrite the entry for `key`, expiring `ttl` from now.
    ///
    /// A second insert for the same key replaces the first; the store never
    /// holds two entries for one key.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = StoreEntry::new(value, ttl);
        self.entries.write().await.push(key.into(), entry);
    }

    /// Look up `key`, returning `None` for entries that never existed and
    /// entries past their expiry alike. Expired entries are removed on sight.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get(key) {
            if entry.is_expired_at(Instant::now()) {
                entries.pop(key);
                return None;
            }
            return Some(entry.value.clone());
        }

        None
    }

    /// Atomically remove and return the entry for `key`.
    ///
    /// The entry is gone before this returns, so a concurrent or retried
    /// `take_once` for the same key gets `None`. Expired entries are treated
    /// as absent.
    pub async fn take_once(&self, key: &str) -> Option<V> {
        let entry = self.entries.write().await.pop(key)?;
        if entry.is_expired_at(Instant::now()) {
            return None;
        }
        Some(entry.value)
    }

    /// Remove every entry whose expiry is at or before `now`, returning the
    /// number removed. Maintenance only: reads never depend on this.
    pub async fn sweep(&self, now: Instant) -> usize {
        Self::sweep_entries(&self.entries, now).await
    }

    /// Number of live (unswept) entries, counting any not yet evicted
    /// expired ones
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn sweep_entries(
        entries: &Arc<RwLock<LruCache<String, StoreEntry<V>>>>,
        now: Instant,
    ) -> usize {
        let mut guard = entries.write().await;

        // Collect expired keys first (can't modify while iterating)
        let expired_keys: Vec<String> = guard
            .iter()
            .filter_map(|(k, v)| {
                if v.is_expired_at(now) {
                    Some(k.clone())
                } else {
                    None
                }
            })
            .collect();

        for key in &expired_keys {
            guard.pop(key);
        }

        let removed = expired_keys.len();
        drop(guard);
        if removed > 0 {
            tracing::debug!("swept {} expired entries", removed);
        }
        removed
    }
}

impl<V> Drop for ExpiringStore<V> {
    fn drop(&mut self) {
        // Signal the sweep task to shut down; errors are expected if the
        // channel is already closed
        if let Some(tx) = &self.shutdown_tx {
            if let Err(e) = tx.try_send(()) {
                tracing::debug!(error = ?e, "store shutdown signal send failed (channel likely closed)");
            }
        }
    }
}
