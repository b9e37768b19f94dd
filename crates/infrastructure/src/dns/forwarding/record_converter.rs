use crate::dns::cache::key::normalize_domain;
use ferrous_sip_domain::{
    AaaaRecord, CnameRecord, DnsRecord, HostRecord, NaptrRecord, SrvRecord,
};
use hickory_proto::rr::{Name, RData, Record};

/// Turns wire resource records into the resolver's record variant.
pub struct RecordConverter;

impl RecordConverter {
    /// `None` for record data the resolver does not carry (SOA, MX, ...).
    pub fn convert(record: &Record) -> Option<DnsRecord> {
        let name = Self::name_to_string(record.name());
        let ttl = record.ttl();

        let converted = match record.data() {
            RData::A(a) => DnsRecord::Host(HostRecord {
                name,
                addr: a.0,
                ttl,
            }),
            RData::AAAA(aaaa) => DnsRecord::Aaaa(AaaaRecord {
                name,
                addr: aaaa.0,
                ttl,
            }),
            RData::CNAME(cname) => DnsRecord::Cname(CnameRecord {
                name,
                target: Self::name_to_string(&cname.0),
                ttl,
            }),
            RData::SRV(srv) => DnsRecord::Srv(SrvRecord {
                name,
                priority: srv.priority(),
                weight: srv.weight(),
                port: srv.port(),
                target: Self::name_to_string(srv.target()),
                ttl,
            }),
            RData::NAPTR(naptr) => DnsRecord::Naptr(NaptrRecord {
                name,
                order: naptr.order(),
                preference: naptr.preference(),
                flags: String::from_utf8_lossy(naptr.flags()).into_owned(),
                services: String::from_utf8_lossy(naptr.services()).into_owned(),
                regexp: String::from_utf8_lossy(naptr.regexp()).into_owned(),
                replacement: Self::name_to_string(naptr.replacement()),
                ttl,
            }),
            _ => return None,
        };
        Some(converted)
    }

    /// Lower-case, no trailing root dot.
    pub fn name_to_string(name: &Name) -> String {
        normalize_domain(&name.to_utf8()).into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::{A, NAPTR, SRV};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    #[test]
    fn test_convert_a() {
        let record = Record::from_rdata(
            Name::from_str("Example.COM.").unwrap(),
            60,
            RData::A(A(Ipv4Addr::new(192, 0, 2, 7))),
        );
        let converted = RecordConverter::convert(&record).unwrap();
        assert_eq!(converted.name(), "example.com");
        assert_eq!(converted.value(), "192.0.2.7");
        assert_eq!(converted.ttl(), 60);
    }

    #[test]
    fn test_convert_srv_normalizes_target() {
        let srv = SRV::new(10, 20, 5061, Name::from_str("SIP1.example.com.").unwrap());
        let record = Record::from_rdata(
            Name::from_str("_sips._tcp.example.com.").unwrap(),
            300,
            RData::SRV(srv),
        );
        let converted = RecordConverter::convert(&record).unwrap();
        assert_eq!(converted.value(), "sip1.example.com:5061");
    }

    #[test]
    fn test_convert_naptr() {
        let naptr = NAPTR::new(
            10,
            50,
            b"s".to_vec().into_boxed_slice(),
            b"SIP+D2T".to_vec().into_boxed_slice(),
            Vec::new().into_boxed_slice(),
            Name::from_str("_sip._tcp.example.com.").unwrap(),
        );
        let record = Record::from_rdata(Name::from_str("example.com.").unwrap(), 300, RData::NAPTR(naptr));

        match RecordConverter::convert(&record).unwrap() {
            DnsRecord::Naptr(r) => {
                assert_eq!(r.services, "SIP+D2T");
                assert_eq!(r.replacement, "_sip._tcp.example.com");
            }
            other => panic!("unexpected record {:?}", other),
        }
    }
}
