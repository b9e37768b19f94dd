use ferrous_sip_application::ports::DnsResultSink;
use ferrous_sip_domain::{
    AaaaRecord, CnameRecord, DnsResult, HostRecord, NaptrRecord, SrvRecord,
};
use std::fmt::Display;
use tokio::sync::mpsc;

/// Renders each result as printable lines and hands them to the main task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<String>>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send<T>(&self, result: DnsResult<T>, render: impl Fn(&T) -> String) {
        let mut lines = Vec::with_capacity(result.records.len() + 1);
        let mut header = format!("{} status={}", result.domain, result.status.code());
        if !result.is_success() {
            header.push_str(&format!(" ({})", result.message));
        }
        if result.retry_after > 0 {
            header.push_str(&format!(" retry_after={}s", result.retry_after));
        }
        lines.push(header);
        lines.extend(result.records.iter().map(|r| format!("  {}", render(r))));
        // main task may already have stopped listening
        let _ = self.tx.send(lines);
    }
}

fn with_ttl(value: impl Display, ttl: u32) -> String {
    format!("{} ttl={}", value, ttl)
}

impl DnsResultSink for ChannelSink {
    fn on_host(&self, result: DnsResult<HostRecord>) {
        self.send(result, |r| with_ttl(r.addr, r.ttl));
    }

    fn on_aaaa(&self, result: DnsResult<AaaaRecord>) {
        self.send(result, |r| with_ttl(r.addr, r.ttl));
    }

    fn on_srv(&self, result: DnsResult<SrvRecord>) {
        self.send(result, |r| {
            with_ttl(
                format!("{} {} {} {}", r.priority, r.weight, r.port, r.target),
                r.ttl,
            )
        });
    }

    fn on_naptr(&self, result: DnsResult<NaptrRecord>) {
        self.send(result, |r| {
            with_ttl(
                format!(
                    "{} {} \"{}\" \"{}\" \"{}\" {}",
                    r.order, r.preference, r.flags, r.services, r.regexp, r.replacement
                ),
                r.ttl,
            )
        });
    }

    fn on_cname(&self, result: DnsResult<CnameRecord>) {
        self.send(result, |r| with_ttl(&r.target, r.ttl));
    }
}
