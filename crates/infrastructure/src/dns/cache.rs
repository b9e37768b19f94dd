pub mod clock;
pub mod key;
pub mod metrics;
pub mod rr_cache;
pub mod rr_list;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::CacheKey;
pub use metrics::CacheMetrics;
pub use rr_cache::{CachedAnswer, RrCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_CEILING_MINUTES};
pub use rr_list::{RecordsOutcome, RrList};
