use async_trait::async_trait;
use ferrous_sip_domain::{DomainError, RecordType};

/// Submission side of the external DNS transport.
///
/// Returns the raw wire answer; parsing, caching and CNAME handling happen
/// in the stub that issued the query.
#[async_trait]
pub trait RawQueryPort: Send + Sync {
    async fn issue_query(&self, name: &str, record_type: RecordType)
        -> Result<Vec<u8>, DomainError>;
}
