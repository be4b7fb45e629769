//! Read-through cache over the [`TypeCatalog`] port.
//!
//! Entries are reloaded only when the catalog reports a new version. The
//! version itself is re-checked at most once per refresh interval, or
//! immediately after [`CatalogCache::invalidate`]. After a failed refresh the
//! catalog is left alone for [`FAILURE_BACKOFF`] (or the refresh interval, if
//! shorter) and readers get the cached entries meanwhile.
//!
//! Lookups never fail: a key with no entry, or a catalog that cannot be
//! reached before anything was cached, yields the generic display.

use crate::ports::type_catalog::{CatalogError, TypeCatalog};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};
use zeladoria_domain::{CatalogVersion, ProblemType, TypeDisplay, TypeKey};

/// Pause between refresh attempts while the catalog is failing.
pub const FAILURE_BACKOFF: Duration = Duration::from_secs(5);

struct CachedCatalog {
    version: CatalogVersion,
    ordered: Vec<ProblemType>,
    by_key: HashMap<TypeKey, usize>,
    checked_at: Instant,
    invalidated: bool,
}

impl CachedCatalog {
    fn new(version: CatalogVersion, ordered: Vec<ProblemType>) -> Self {
        let by_key = ordered
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.key.clone(), idx))
            .collect();
        Self {
            version,
            ordered,
            by_key,
            checked_at: Instant::now(),
            invalidated: false,
        }
    }

    fn is_fresh(&self, refresh_interval: Duration) -> bool {
        !self.invalidated && self.checked_at.elapsed() < refresh_interval
    }

    fn mark_checked(&mut self) {
        self.checked_at = Instant::now();
        self.invalidated = false;
    }

    fn get(&self, key: &TypeKey) -> Option<&ProblemType> {
        self.by_key.get(key).map(|&idx| &self.ordered[idx])
    }
}

struct Failure {
    error: CatalogError,
    retry_at: Instant,
}

#[derive(Default)]
struct CacheState {
    cached: Option<CachedCatalog>,
    failure: Option<Failure>,
}

impl CacheState {
    /// `None` when the catalog should be asked again.
    fn settled(&self, refresh_interval: Duration) -> Option<Result<(), CatalogError>> {
        if let Some(failure) = &self.failure
            && Instant::now() < failure.retry_at
        {
            return Some(match self.cached {
                Some(_) => Ok(()),
                None => Err(failure.error.clone()),
            });
        }
        match &self.cached {
            Some(cached) if cached.is_fresh(refresh_interval) => Some(Ok(())),
            _ => None,
        }
    }
}

pub struct CatalogCache {
    catalog: Arc<dyn TypeCatalog>,
    refresh_interval: Duration,
    state: RwLock<CacheState>,
}

impl CatalogCache {
    pub fn new(catalog: Arc<dyn TypeCatalog>, refresh_interval: Duration) -> Self {
        Self {
            catalog,
            refresh_interval,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Display data for a type key.
    pub async fn lookup(&self, key: &TypeKey) -> TypeDisplay {
        if let Err(e) = self.refresh_if_stale().await {
            warn!("Type catalog refresh failed, using cached entries: {}", e);
        }
        let state = self.state.read().await;
        state
            .cached
            .as_ref()
            .and_then(|cached| cached.get(key))
            .map(TypeDisplay::from)
            .unwrap_or_else(|| TypeDisplay::generic(key))
    }

    /// All entries in catalog order.
    ///
    /// Falls back to the last cached entries when the catalog is unreachable;
    /// fails only if nothing was ever loaded.
    pub async fn entries(&self) -> Result<Vec<ProblemType>, CatalogError> {
        let refreshed = self.refresh_if_stale().await;
        let state = self.state.read().await;
        match (state.cached.as_ref(), refreshed) {
            (Some(cached), _) => Ok(cached.ordered.clone()),
            (None, Err(e)) => Err(e),
            (None, Ok(())) => Ok(Vec::new()),
        }
    }

    /// Force the next read to re-check the catalog version.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.failure = None;
        if let Some(cached) = state.cached.as_mut() {
            cached.invalidated = true;
        }
    }

    /// Version currently held, if any.
    pub async fn cached_version(&self) -> Option<CatalogVersion> {
        self.state.read().await.cached.as_ref().map(|c| c.version)
    }

    async fn refresh_if_stale(&self) -> Result<(), CatalogError> {
        if let Some(settled) = self.state.read().await.settled(self.refresh_interval) {
            return settled;
        }

        let mut state = self.state.write().await;
        // Another reader may have refreshed while we waited for the write lock.
        if let Some(settled) = state.settled(self.refresh_interval) {
            return settled;
        }

        match self.reload(&mut state.cached).await {
            Ok(()) => {
                state.failure = None;
                Ok(())
            }
            Err(e) => {
                let backoff = self.refresh_interval.min(FAILURE_BACKOFF);
                debug!("Type catalog refresh failed, next attempt in {:?}", backoff);
                state.failure = Some(Failure {
                    error: e.clone(),
                    retry_at: Instant::now() + backoff,
                });
                Err(e)
            }
        }
    }

    async fn reload(&self, cached: &mut Option<CachedCatalog>) -> Result<(), CatalogError> {
        let version = self.catalog.version().await?;
        if let Some(current) = cached.as_mut()
            && current.version == version
        {
            current.mark_checked();
            return Ok(());
        }

        let entries = self.catalog.entries().await?;
        debug!(
            "Loaded type catalog version {} ({} entries)",
            version,
            entries.len()
        );
        *cached = Some(CachedCatalog::new(version, entries));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    struct MockCatalog {
        version: AtomicU64,
        entries: Mutex<Vec<ProblemType>>,
        entries_calls: AtomicUsize,
        version_calls: AtomicUsize,
        offline: AtomicBool,
    }

    impl MockCatalog {
        fn new(entries: Vec<ProblemType>) -> Self {
            Self {
                version: AtomicU64::new(1),
                entries: Mutex::new(entries),
                entries_calls: AtomicUsize::new(0),
                version_calls: AtomicUsize::new(0),
                offline: AtomicBool::new(false),
            }
        }

        fn publish(&self, entries: Vec<ProblemType>) {
            *self.entries.lock().unwrap() = entries;
            self.version.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TypeCatalog for MockCatalog {
        async fn version(&self) -> Result<CatalogVersion, CatalogError> {
            self.version_calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(CatalogError::Unavailable("offline".into()));
            }
            Ok(self.version.load(Ordering::SeqCst))
        }

        async fn entries(&self) -> Result<Vec<ProblemType>, CatalogError> {
            self.entries_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.entries.lock().unwrap().clone())
        }
    }

    fn key(k: &str) -> TypeKey {
        TypeKey::new(k).unwrap()
    }

    fn buraco(title: &str) -> ProblemType {
        ProblemType::new(key("buraco"), title, "Vias", "🕳️")
    }

    #[tokio::test]
    async fn test_lookup_known_and_unknown() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco na via")]));
        let cache = CatalogCache::new(catalog, Duration::from_secs(300));

        let known = cache.lookup(&key("buraco")).await;
        assert_eq!(known.title, "Buraco na via");
        assert_eq!(known.icon, "🕳️");

        let unknown = cache.lookup(&key("arvore_caida")).await;
        assert!(unknown.is_generic());
        assert_eq!(unknown.icon, "📍");
        assert_eq!(unknown.title, "arvore_caida");
    }

    #[tokio::test]
    async fn test_entries_loaded_once_per_version() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        let cache = CatalogCache::new(catalog.clone(), Duration::from_secs(300));

        for _ in 0..5 {
            cache.lookup(&key("buraco")).await;
        }
        assert_eq!(catalog.entries_calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.version_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached_version().await, Some(1));
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_new_version() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        let cache = CatalogCache::new(catalog.clone(), Duration::from_secs(300));
        assert_eq!(cache.lookup(&key("buraco")).await.title, "Buraco");

        catalog.publish(vec![buraco("Cratera")]);
        // Still fresh: the old entry is served.
        assert_eq!(cache.lookup(&key("buraco")).await.title, "Buraco");

        cache.invalidate().await;
        assert_eq!(cache.lookup(&key("buraco")).await.title, "Cratera");
        assert_eq!(cache.cached_version().await, Some(2));
    }

    #[tokio::test]
    async fn test_unchanged_version_skips_reload() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        let cache = CatalogCache::new(catalog.clone(), Duration::ZERO);

        cache.lookup(&key("buraco")).await;
        cache.lookup(&key("buraco")).await;
        cache.lookup(&key("buraco")).await;

        assert_eq!(catalog.version_calls.load(Ordering::SeqCst), 3);
        assert_eq!(catalog.entries_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_interval_expires() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        let cache = CatalogCache::new(catalog.clone(), Duration::from_secs(60));
        cache.lookup(&key("buraco")).await;

        catalog.publish(vec![buraco("Cratera")]);
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cache.lookup(&key("buraco")).await.title, "Cratera");
    }

    #[tokio::test]
    async fn test_offline_catalog_serves_stale_entries() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        let cache = CatalogCache::new(catalog.clone(), Duration::ZERO);
        cache.lookup(&key("buraco")).await;

        catalog.offline.store(true, Ordering::SeqCst);
        assert_eq!(cache.lookup(&key("buraco")).await.title, "Buraco");
        assert_eq!(cache.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_before_first_load() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        catalog.offline.store(true, Ordering::SeqCst);
        let cache = CatalogCache::new(catalog, Duration::from_secs(300));

        assert!(cache.lookup(&key("buraco")).await.is_generic());
        assert!(matches!(
            cache.entries().await,
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_backs_off() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        let cache = CatalogCache::new(catalog.clone(), Duration::from_secs(60));
        cache.lookup(&key("buraco")).await;

        catalog.offline.store(true, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(61)).await;
        for _ in 0..5 {
            assert_eq!(cache.lookup(&key("buraco")).await.title, "Buraco");
        }
        assert_eq!(catalog.version_calls.load(Ordering::SeqCst), 2);

        catalog.offline.store(false, Ordering::SeqCst);
        catalog.publish(vec![buraco("Cratera")]);
        tokio::time::advance(FAILURE_BACKOFF).await;
        assert_eq!(cache.lookup(&key("buraco")).await.title, "Cratera");
        assert_eq!(catalog.version_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_catalog_retried_after_backoff() {
        let catalog = Arc::new(MockCatalog::new(vec![buraco("Buraco")]));
        catalog.offline.store(true, Ordering::SeqCst);
        let cache = CatalogCache::new(catalog.clone(), Duration::from_secs(300));

        for _ in 0..3 {
            assert!(cache.lookup(&key("buraco")).await.is_generic());
        }
        assert!(cache.entries().await.is_err());
        assert_eq!(catalog.version_calls.load(Ordering::SeqCst), 1);

        catalog.offline.store(false, Ordering::SeqCst);
        cache.invalidate().await;
        assert_eq!(cache.lookup(&key("buraco")).await.title, "Buraco");
        assert_eq!(catalog.version_calls.load(Ordering::SeqCst), 2);
    }
}
