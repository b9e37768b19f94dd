mod record;
mod record_type;

pub use record::{
    AaaaRecord, CnameRecord, DnsRecord, HostRecord, NaptrRecord, SrvRecord, TypedRecord,
};
pub use record_type::RecordType;
