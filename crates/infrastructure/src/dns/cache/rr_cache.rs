use super::clock::{Clock, SystemClock};
use super::key::CacheKey;
use super::metrics::CacheMetrics;
use super::rr_list::RrList;
use ferrous_sip_application::ports::CacheMetricsSnapshot;
use ferrous_sip_domain::{DnsRecord, DnsStatus, RecordType, TransportProtocol};
use lru::LruCache;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TTL_CEILING_MINUTES: u32 = 60;
pub const DEFAULT_MAX_ENTRIES: usize = 512;

/// A cache hit, possibly empty when blacklist or retry-after filtered every
/// record, or a remembered failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAnswer {
    pub records: Vec<DnsRecord>,
    pub status: DnsStatus,
    pub retry_after: u32,
}

/// LRU cache of record sets keyed by (domain, type).
///
/// Expiry is only checked when an entry is looked up; nothing runs in the
/// background. Owned by a single resolver loop, so there is no locking.
pub struct RrCache {
    entries: LruCache<CacheKey, RrList>,
    max_entries: usize,
    ttl_ceiling_secs: u32,
    clock: Arc<dyn Clock>,
    metrics: CacheMetrics,
}

impl Default for RrCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_CEILING_MINUTES)
    }
}

impl RrCache {
    pub fn new(max_entries: usize, ttl_ceiling_minutes: u32) -> Self {
        Self::with_clock(max_entries, ttl_ceiling_minutes, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, ttl_ceiling_minutes: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: LruCache::unbounded(),
            max_entries: max_entries.max(1),
            ttl_ceiling_secs: ttl_ceiling_minutes.saturating_mul(60),
            clock,
            metrics: CacheMetrics::default(),
        }
    }

    pub fn lookup(
        &mut self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
    ) -> Option<CachedAnswer> {
        self.fetch(target, record_type, protocol, true)
    }

    /// Same filtering as [`lookup`](Self::lookup) without touching the
    /// hit/miss counters; used to deliver an answer that was just stored.
    pub fn lookup_fresh(
        &mut self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
    ) -> Option<CachedAnswer> {
        self.fetch(target, record_type, protocol, false)
    }

    fn fetch(
        &mut self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        count: bool,
    ) -> Option<CachedAnswer> {
        let key = CacheKey::new(target, record_type);
        let now = self.clock.now_secs();

        let expired = match self.entries.peek(&key) {
            Some(list) => list.is_expired(now),
            None => {
                if count {
                    CacheMetrics::bump(&self.metrics.misses);
                }
                return None;
            }
        };

        if expired {
            self.entries.pop(&key);
            CacheMetrics::bump(&self.metrics.expirations);
            if count {
                CacheMetrics::bump(&self.metrics.misses);
            }
            debug!(key = %key, "Cached record set expired");
            return None;
        }

        // get_mut moves the entry to the most-recent end
        let list = self.entries.get_mut(&key)?;
        let outcome = list.records(protocol, now);
        let status = list.status();

        if outcome.all_blacklisted {
            self.entries.pop(&key);
            CacheMetrics::bump(&self.metrics.blacklist_purges);
            if count {
                CacheMetrics::bump(&self.metrics.misses);
            }
            debug!(key = %key, protocol = %protocol, "Every cached record blacklisted, dropping entry");
            return None;
        }

        if count {
            CacheMetrics::bump(&self.metrics.hits);
        }
        Some(CachedAnswer {
            records: outcome.records,
            status,
            retry_after: outcome.retry_after,
        })
    }

    /// Stores `records` under (domain, type): refreshes an existing entry in
    /// place, otherwise inserts and evicts least-recently-used entries past
    /// the bound.
    pub fn update_cache(&mut self, domain: &str, record_type: RecordType, records: Vec<DnsRecord>) {
        if records.is_empty() {
            return;
        }
        let key = CacheKey::new(domain, record_type);
        let now = self.clock.now_secs();

        if let Some(list) = self.entries.get_mut(&key) {
            list.update(records, self.ttl_ceiling_secs, now);
            return;
        }

        let list = RrList::new(key.clone(), records, self.ttl_ceiling_secs, now);
        self.entries.push(key, list);
        CacheMetrics::bump(&self.metrics.insertions);
        self.purge();
    }

    /// Remembers a failed lookup for the SOA-derived `negative_ttl`.
    /// Without a TTL (no SOA in the answer) nothing is cached.
    pub fn cache_ttl(
        &mut self,
        domain: &str,
        record_type: RecordType,
        status: DnsStatus,
        negative_ttl: Option<u32>,
    ) -> bool {
        let Some(ttl) = negative_ttl else {
            return false;
        };
        let key = CacheKey::new(domain, record_type);
        let now = self.clock.now_secs();
        let list = RrList::negative(key.clone(), status, ttl.min(self.ttl_ceiling_secs), now);

        debug!(key = %key, ttl = ttl, status = %status, "Caching negative answer");
        if self.entries.push(key, list).is_none() {
            CacheMetrics::bump(&self.metrics.insertions);
        }
        CacheMetrics::bump(&self.metrics.negative_insertions);
        self.purge();
        true
    }

    pub fn blacklist(
        &mut self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        targets: &[String],
    ) -> usize {
        let key = CacheKey::new(target, record_type);
        match self.entries.peek_mut(&key) {
            Some(list) => list.blacklist(protocol, targets),
            None => 0,
        }
    }

    pub fn retry_after(
        &mut self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        seconds: u32,
        targets: &[String],
    ) -> usize {
        let key = CacheKey::new(target, record_type);
        let now = self.clock.now_secs();
        match self.entries.peek_mut(&key) {
            Some(list) => list.retry_after(protocol, seconds, targets, now),
            None => 0,
        }
    }

    /// Canonical name cached for `domain`, if any, without touching recency.
    pub fn cname_target(&self, domain: &str) -> Option<String> {
        let key = CacheKey::new(domain, RecordType::CNAME);
        let list = self.entries.peek(&key)?;
        if list.is_expired(self.clock.now_secs()) {
            return None;
        }
        match list.record(0)? {
            DnsRecord::Cname(cname) => Some(cname.target.clone()),
            _ => None,
        }
    }

    fn purge(&mut self) {
        while self.entries.len() > self.max_entries {
            match self.entries.pop_lru() {
                Some((key, _)) => {
                    CacheMetrics::bump(&self.metrics.evictions);
                    debug!(key = %key, "Evicted least recently used entry");
                }
                None => break,
            }
        }
    }

    pub fn contains(&self, domain: &str, record_type: RecordType) -> bool {
        self.entries.contains(&CacheKey::new(domain, record_type))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One line per entry, most recently used first.
    pub fn dump(&self) -> Vec<String> {
        let now = self.clock.now_secs();
        self.entries.iter().map(|(_, list)| list.describe(now)).collect()
    }

    pub fn set_ttl_ceiling(&mut self, minutes: u32) {
        self.ttl_ceiling_secs = minutes.saturating_mul(60);
    }

    pub fn ttl_ceiling_secs(&self) -> u32 {
        self.ttl_ceiling_secs
    }

    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            total_entries: self.entries.len(),
            max_entries: self.max_entries,
            hits: CacheMetrics::load(&self.metrics.hits),
            misses: CacheMetrics::load(&self.metrics.misses),
            insertions: CacheMetrics::load(&self.metrics.insertions),
            evictions: CacheMetrics::load(&self.metrics.evictions),
            expirations: CacheMetrics::load(&self.metrics.expirations),
            blacklist_purges: CacheMetrics::load(&self.metrics.blacklist_purges),
            negative_insertions: CacheMetrics::load(&self.metrics.negative_insertions),
            hit_rate: self.metrics.hit_rate(),
        }
    }
}
