/// Snapshot of resolver cache metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetricsSnapshot {
    pub total_entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub blacklist_purges: u64,
    pub negative_insertions: u64,
    pub hit_rate: f64,
}
