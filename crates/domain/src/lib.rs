//! Ferrous SIP Domain Layer
pub mod config;
pub mod credential;
pub mod dialog_id;
pub mod dns_protocol;
pub mod dns_record;
pub mod dns_result;
pub mod errors;
pub mod transport_protocol;

pub use config::{CliOverrides, Config, ConfigError, DnsConfig, LoggingConfig, SipConfig};
pub use credential::Credential;
pub use dialog_id::{DialogId, DialogSetId, DialogType};
pub use dns_protocol::DnsProtocol;
pub use dns_record::{
    AaaaRecord, CnameRecord, DnsRecord, HostRecord, NaptrRecord, RecordType, SrvRecord,
    TypedRecord,
};
pub use dns_result::{DnsResult, DnsStatus};
pub use errors::DomainError;
pub use transport_protocol::TransportProtocol;
