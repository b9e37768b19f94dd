mod credential_provider;
mod dns_cache_port;
mod dns_result_sink;
mod raw_query_port;

pub use credential_provider::CredentialProvider;
pub use dns_cache_port::CacheMetricsSnapshot;
pub use dns_result_sink::{DnsResultSink, RecordingSink};
pub use raw_query_port::RawQueryPort;
