//! Report cache keyed by report id.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use health_report_models::ReportRecord;
use lru::LruCache;

/// Default maximum number of cached reports.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Storage for generated reports.
pub trait ReportCache: Send + Sync {
    /// Returns the cached report for `report_id`, if present and fresh.
    fn get(&self, report_id: &str) -> Option<Arc<ReportRecord>>;

    /// Stores `record` under its report id, replacing any previous entry.
    fn put(&self, record: Arc<ReportRecord>);

    /// Removes the entry for `report_id`, returning it if it existed.
    fn evict(&self, report_id: &str) -> Option<Arc<ReportRecord>>;

    /// Number of entries currently held.
    fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CacheEntry {
    record: Arc<ReportRecord>,
    inserted_at: Instant,
}

/// In-process [`ReportCache`] bounded by entry count and, optionally, age.
///
/// When full, the least recently used report is evicted. Expired entries
/// are dropped when they are next looked up.
pub struct MemoryReportCache {
    ttl: Option<Duration>,
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryReportCache {
    /// Creates a cache holding at most `capacity` reports (at least one),
    /// each for at most `ttl` when given.
    #[must_use]
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        // The cache is consistent after every operation, so a poisoned
        // lock is still usable.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}

impl Default for MemoryReportCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, None)
    }
}

impl ReportCache for MemoryReportCache {
    fn get(&self, report_id: &str) -> Option<Arc<ReportRecord>> {
        let mut entries = self.entries();
        let entry = entries.get(report_id)?;
        if !self.is_expired(entry) {
            return Some(Arc::clone(&entry.record));
        }

        log::debug!("Cached report {report_id} expired");
        entries.pop(report_id);
        None
    }

    fn put(&self, record: Arc<ReportRecord>) {
        let report_id = record.report_id.clone();
        let entry = CacheEntry {
            record,
            inserted_at: Instant::now(),
        };

        if let Some((evicted, _)) = self.entries().push(report_id.clone(), entry)
            && evicted != report_id
        {
            log::debug!("Evicted cached report {evicted}");
        }
    }

    fn evict(&self, report_id: &str) -> Option<Arc<ReportRecord>> {
        self.entries().pop(report_id).map(|entry| entry.record)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}
