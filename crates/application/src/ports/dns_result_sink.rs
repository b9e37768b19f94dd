use ferrous_sip_domain::{
    AaaaRecord, CnameRecord, DnsResult, HostRecord, NaptrRecord, SrvRecord,
};
use std::sync::Mutex;

/// Consumer of typed lookup results. Only the methods for the record types a
/// consumer actually asks for need overriding.
pub trait DnsResultSink: Send + Sync {
    fn on_host(&self, _result: DnsResult<HostRecord>) {}

    fn on_aaaa(&self, _result: DnsResult<AaaaRecord>) {}

    fn on_srv(&self, _result: DnsResult<SrvRecord>) {}

    fn on_naptr(&self, _result: DnsResult<NaptrRecord>) {}

    fn on_cname(&self, _result: DnsResult<CnameRecord>) {}
}

/// Sink that keeps every result it receives, in delivery order.
#[derive(Default)]
pub struct RecordingSink {
    pub hosts: Mutex<Vec<DnsResult<HostRecord>>>,
    pub aaaas: Mutex<Vec<DnsResult<AaaaRecord>>>,
    pub srvs: Mutex<Vec<DnsResult<SrvRecord>>>,
    pub naptrs: Mutex<Vec<DnsResult<NaptrRecord>>>,
    pub cnames: Mutex<Vec<DnsResult<CnameRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        len(&self.hosts) + len(&self.aaaas) + len(&self.srvs) + len(&self.naptrs) + len(&self.cnames)
    }
}

fn len<T>(results: &Mutex<Vec<T>>) -> usize {
    results.lock().map(|r| r.len()).unwrap_or(0)
}

fn record<T>(results: &Mutex<Vec<T>>, result: T) {
    if let Ok(mut guard) = results.lock() {
        guard.push(result);
    }
}

impl DnsResultSink for RecordingSink {
    fn on_host(&self, result: DnsResult<HostRecord>) {
        record(&self.hosts, result);
    }

    fn on_aaaa(&self, result: DnsResult<AaaaRecord>) {
        record(&self.aaaas, result);
    }

    fn on_srv(&self, result: DnsResult<SrvRecord>) {
        record(&self.srvs, result);
    }

    fn on_naptr(&self, result: DnsResult<NaptrRecord>) {
        record(&self.naptrs, result);
    }

    fn on_cname(&self, result: DnsResult<CnameRecord>) {
        record(&self.cnames, result);
    }
}
