//! TTL cache for bundled datasets
//!
//! Holds one `(payload, loaded_at)` entry. Expiry is passive: the first
//! `get()` after the TTL reloads. The loader is async and runs outside the
//! lock, so
//! concurrent callers racing an expired entry may each load; the last write
//! wins, which is harmless because the underlying file does not change
//! within a process lifetime.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::Result;

/// Default TTL: 5 minutes
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

type Loader<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

struct CacheEntry<T> {
    payload: Arc<T>,
    loaded_at: Instant,
}

pub struct TtlCache<T> {
    name: String,
    ttl: Duration,
    loader: Loader<T>,
    entry: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Send + Sync + 'static> TtlCache<T> {
    pub fn new<F, Fut>(name: impl Into<String>, ttl: Duration, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            name: name.into(),
            ttl,
            loader: Box::new(move || loader().boxed()),
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serve the cached payload, loading it when absent or expired
    pub async fn get(&self) -> Result<Arc<T>> {
        {
            let entry = self.entry.read().await;
            if let Some(e) = entry.as_ref() {
                if e.loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&e.payload));
                }
            }
        }

        let payload = Arc::new((self.loader)().await?);
        debug!(cache = %self.name, ttl_secs = self.ttl.as_secs(), "dataset loaded");

        let mut entry = self.entry.write().await;
        *entry = Some(CacheEntry {
            payload: Arc::clone(&payload),
            loaded_at: Instant::now(),
        });
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_cache(ttl: Duration) -> (TtlCache<usize>, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache = TtlCache::new("test", ttl, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(n) }
        });
        (cache, loads)
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_payload_within_ttl() {
        let (cache, loads) = counting_cache(DEFAULT_TTL);

        let first = cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reloads_after_expiry() {
        let (cache, loads) = counting_cache(DEFAULT_TTL);

        let first = cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        let second = cache.get().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 2);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_slow_loader_yields_to_other_tasks() {
        let cache = TtlCache::new("slow", DEFAULT_TTL, || async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(5u32)
        });
        let ticker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Instant::now()
        });

        let started = Instant::now();
        assert_eq!(*cache.get().await.unwrap(), 5);
        let ticked = ticker.await.unwrap();
        assert!(ticked - started < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let cache: TtlCache<u8> = TtlCache::new("flaky", DEFAULT_TTL, move || {
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if first {
                    Err(MetricsError::Dataset("missing file".into()))
                } else {
                    Ok(7)
                }
            }
        });

        assert!(cache.get().await.is_err());
        assert_eq!(*cache.get().await.unwrap(), 7);
    }
}
