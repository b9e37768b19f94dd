use std::fmt;

/// Outcome of one resolution, carried on every typed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsStatus {
    Success,
    FormatError,
    ServerFailure,
    /// NXDOMAIN.
    NotFound,
    NotImplemented,
    Refused,
    /// The name exists but holds no records of the requested type.
    NoData,
    Timeout,
    TransportError,
    BadResponse,
    /// The CNAME chain was longer than the requery bound.
    CnameLimitExceeded,
}

impl DnsStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DnsStatus::Success)
    }

    /// Numeric code; 0 is success, 1-5 mirror the DNS RCODE.
    pub fn code(&self) -> u16 {
        match self {
            DnsStatus::Success => 0,
            DnsStatus::FormatError => 1,
            DnsStatus::ServerFailure => 2,
            DnsStatus::NotFound => 3,
            DnsStatus::NotImplemented => 4,
            DnsStatus::Refused => 5,
            DnsStatus::NoData => 100,
            DnsStatus::Timeout => 101,
            DnsStatus::TransportError => 102,
            DnsStatus::BadResponse => 103,
            DnsStatus::CnameLimitExceeded => 104,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DnsStatus::Success => "",
            DnsStatus::FormatError => "format error",
            DnsStatus::ServerFailure => "server failure",
            DnsStatus::NotFound => "domain not found",
            DnsStatus::NotImplemented => "not implemented",
            DnsStatus::Refused => "query refused",
            DnsStatus::NoData => "no records of the requested type",
            DnsStatus::Timeout => "query timed out",
            DnsStatus::TransportError => "transport error",
            DnsStatus::BadResponse => "malformed response",
            DnsStatus::CnameLimitExceeded => "too many CNAME redirections",
        }
    }

    /// Statuses worth remembering in the negative cache.
    pub fn is_cacheable_failure(&self) -> bool {
        matches!(self, DnsStatus::NotFound | DnsStatus::NoData)
    }
}

impl fmt::Display for DnsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsStatus::Success => write!(f, "success"),
            other => write!(f, "{}", other.message()),
        }
    }
}

/// Typed result delivered to a resolution consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResult<T> {
    /// The domain the caller asked for, even when the answer came through a CNAME.
    pub domain: String,
    pub status: DnsStatus,
    pub message: String,
    /// Seconds until throttled targets become eligible again; 0 when none are.
    pub retry_after: u32,
    pub records: Vec<T>,
}

impl<T> DnsResult<T> {
    pub fn success(domain: impl Into<String>, records: Vec<T>, retry_after: u32) -> Self {
        Self {
            domain: domain.into(),
            status: DnsStatus::Success,
            message: String::new(),
            retry_after,
            records,
        }
    }

    pub fn failure(domain: impl Into<String>, status: DnsStatus, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            status,
            message: message.into(),
            retry_after: 0,
            records: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
