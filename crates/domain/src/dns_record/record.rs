use super::RecordType;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub name: String,
    pub addr: Ipv4Addr,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AaaaRecord {
    pub name: String,
    pub addr: Ipv6Addr,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub name: String,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaptrRecord {
    pub name: String,
    pub order: u16,
    pub preference: u16,
    pub flags: String,
    pub services: String,
    pub regexp: String,
    pub replacement: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnameRecord {
    pub name: String,
    pub target: String,
    pub ttl: u32,
}

/// A resolved resource record of one of the types used for SIP routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsRecord {
    Host(HostRecord),
    Aaaa(AaaaRecord),
    Srv(SrvRecord),
    Naptr(NaptrRecord),
    Cname(CnameRecord),
}

impl DnsRecord {
    pub fn name(&self) -> &str {
        match self {
            DnsRecord::Host(r) => &r.name,
            DnsRecord::Aaaa(r) => &r.name,
            DnsRecord::Srv(r) => &r.name,
            DnsRecord::Naptr(r) => &r.name,
            DnsRecord::Cname(r) => &r.name,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            DnsRecord::Host(r) => r.ttl,
            DnsRecord::Aaaa(r) => r.ttl,
            DnsRecord::Srv(r) => r.ttl,
            DnsRecord::Naptr(r) => r.ttl,
            DnsRecord::Cname(r) => r.ttl,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            DnsRecord::Host(_) => RecordType::A,
            DnsRecord::Aaaa(_) => RecordType::AAAA,
            DnsRecord::Srv(_) => RecordType::SRV,
            DnsRecord::Naptr(_) => RecordType::NAPTR,
            DnsRecord::Cname(_) => RecordType::CNAME,
        }
    }

    /// The value a blacklist or retry-after target is matched against:
    /// the address for A/AAAA, `target:port` for SRV, the replacement for
    /// NAPTR and the canonical name for CNAME.
    pub fn value(&self) -> String {
        match self {
            DnsRecord::Host(r) => r.addr.to_string(),
            DnsRecord::Aaaa(r) => r.addr.to_string(),
            DnsRecord::Srv(r) => format!("{}:{}", r.target, r.port),
            DnsRecord::Naptr(r) => r.replacement.clone(),
            DnsRecord::Cname(r) => r.target.clone(),
        }
    }

    pub fn is_same_value(&self, value: &str) -> bool {
        match self {
            DnsRecord::Host(r) => value
                .parse::<Ipv4Addr>()
                .map(|addr| addr == r.addr)
                .unwrap_or(false),
            DnsRecord::Aaaa(r) => value
                .parse::<Ipv6Addr>()
                .map(|addr| addr == r.addr)
                .unwrap_or(false),
            _ => self.value().eq_ignore_ascii_case(value.trim_end_matches('.')),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        let owner = match &mut self {
            DnsRecord::Host(r) => &mut r.name,
            DnsRecord::Aaaa(r) => &mut r.name,
            DnsRecord::Srv(r) => &mut r.name,
            DnsRecord::Naptr(r) => &mut r.name,
            DnsRecord::Cname(r) => &mut r.name,
        };
        *owner = name.to_string();
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        match &mut self {
            DnsRecord::Host(r) => r.ttl = ttl,
            DnsRecord::Aaaa(r) => r.ttl = ttl,
            DnsRecord::Srv(r) => r.ttl = ttl,
            DnsRecord::Naptr(r) => r.ttl = ttl,
            DnsRecord::Cname(r) => r.ttl = ttl,
        }
        self
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsRecord::Srv(r) => write!(
                f,
                "{} {} {} {}:{}",
                r.name, r.priority, r.weight, r.target, r.port
            ),
            DnsRecord::Naptr(r) => write!(
                f,
                "{} {} {} \"{}\" \"{}\" \"{}\" {}",
                r.name, r.order, r.preference, r.flags, r.services, r.regexp, r.replacement
            ),
            _ => write!(f, "{} {}", self.name(), self.value()),
        }
    }
}

/// Conversion from the generic record variant into one concrete record type.
pub trait TypedRecord: Sized + Clone + Send + 'static {
    const RECORD_TYPE: RecordType;

    fn from_record(record: DnsRecord) -> Option<Self>;
}

impl TypedRecord for HostRecord {
    const RECORD_TYPE: RecordType = RecordType::A;

    fn from_record(record: DnsRecord) -> Option<Self> {
        match record {
            DnsRecord::Host(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRecord for AaaaRecord {
    const RECORD_TYPE: RecordType = RecordType::AAAA;

    fn from_record(record: DnsRecord) -> Option<Self> {
        match record {
            DnsRecord::Aaaa(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRecord for SrvRecord {
    const RECORD_TYPE: RecordType = RecordType::SRV;

    fn from_record(record: DnsRecord) -> Option<Self> {
        match record {
            DnsRecord::Srv(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRecord for NaptrRecord {
    const RECORD_TYPE: RecordType = RecordType::NAPTR;

    fn from_record(record: DnsRecord) -> Option<Self> {
        match record {
            DnsRecord::Naptr(r) => Some(r),
            _ => None,
        }
    }
}

impl TypedRecord for CnameRecord {
    const RECORD_TYPE: RecordType = RecordType::CNAME;

    fn from_record(record: DnsRecord) -> Option<Self> {
        match record {
            DnsRecord::Cname(r) => Some(r),
            _ => None,
        }
    }
}
