pub mod cache;
pub mod forwarding;
pub mod stub;
pub mod transport;

pub use cache::{CacheKey, CacheMetrics, CachedAnswer, Clock, ManualClock, RrCache, SystemClock};
pub use forwarding::{MessageBuilder, ParsedAnswer, ResponseParser};
pub use stub::{DnsCommand, DnsStub, DnsStubHandle, QueryState, MAX_REQUERIES};
pub use transport::UpstreamQuerier;
