use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),

    #[error("Unknown transport protocol: {0}")]
    UnknownTransportProtocol(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Transport connection reset by {server}")]
    TransportConnectionReset { server: String },

    #[error("No upstream servers available")]
    TransportNoUpstreamServers,

    #[error("DNS stub is not running")]
    StubUnavailable,

    #[error("DNS command queue is full")]
    CommandQueueFull,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            DomainError::QueryTimeout | DomainError::TransportTimeout { .. }
        )
    }
}
