use ferrous_sip_application::ports::DnsResultSink;
use ferrous_sip_domain::{
    AaaaRecord, CnameRecord, DnsRecord, DnsResult, HostRecord, NaptrRecord, RecordType,
    SrvRecord, TypedRecord,
};
use tracing::warn;

/// Narrows a generic result to the sink method for `record_type`.
pub fn deliver(sink: &dyn DnsResultSink, record_type: RecordType, result: DnsResult<DnsRecord>) {
    match record_type {
        RecordType::A => sink.on_host(narrow::<HostRecord>(result)),
        RecordType::AAAA => sink.on_aaaa(narrow::<AaaaRecord>(result)),
        RecordType::SRV => sink.on_srv(narrow::<SrvRecord>(result)),
        RecordType::NAPTR => sink.on_naptr(narrow::<NaptrRecord>(result)),
        RecordType::CNAME => sink.on_cname(narrow::<CnameRecord>(result)),
        RecordType::SOA => {
            warn!(domain = %result.domain, "Dropping result for non-queryable SOA lookup");
        }
    }
}

fn narrow<T: TypedRecord>(result: DnsResult<DnsRecord>) -> DnsResult<T> {
    DnsResult {
        domain: result.domain,
        status: result.status,
        message: result.message,
        retry_after: result.retry_after,
        records: result.records.into_iter().filter_map(T::from_record).collect(),
    }
}
