use ferrous_sip_application::ports::{CacheMetricsSnapshot, DnsResultSink};
use ferrous_sip_domain::{RecordType, TransportProtocol};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Work submitted to the stub from any task. Executed in submission order by
/// the single loop that owns the cache.
pub enum DnsCommand {
    Lookup {
        target: String,
        record_type: RecordType,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    },
    Blacklist {
        target: String,
        record_type: RecordType,
        protocol: TransportProtocol,
        targets: Vec<String>,
    },
    RetryAfter {
        target: String,
        record_type: RecordType,
        protocol: TransportProtocol,
        seconds: u32,
        targets: Vec<String>,
    },
    ClearCache,
    DumpCache {
        reply: oneshot::Sender<Vec<String>>,
    },
    Metrics {
        reply: oneshot::Sender<CacheMetricsSnapshot>,
    },
    SetTtlCeiling {
        minutes: u32,
    },
    SetMaxEntries {
        max_entries: usize,
    },
}

impl DnsCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DnsCommand::Lookup { .. } => "lookup",
            DnsCommand::Blacklist { .. } => "blacklist",
            DnsCommand::RetryAfter { .. } => "retry_after",
            DnsCommand::ClearCache => "clear_cache",
            DnsCommand::DumpCache { .. } => "dump_cache",
            DnsCommand::Metrics { .. } => "metrics",
            DnsCommand::SetTtlCeiling { .. } => "set_ttl_ceiling",
            DnsCommand::SetMaxEntries { .. } => "set_max_entries",
        }
    }
}

impl std::fmt::Debug for DnsCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsCommand::Lookup {
                target,
                record_type,
                protocol,
                ..
            } => f
                .debug_struct("Lookup")
                .field("target", target)
                .field("record_type", record_type)
                .field("protocol", protocol)
                .finish_non_exhaustive(),
            DnsCommand::Blacklist {
                target,
                record_type,
                protocol,
                targets,
            } => f
                .debug_struct("Blacklist")
                .field("target", target)
                .field("record_type", record_type)
                .field("protocol", protocol)
                .field("targets", targets)
                .finish(),
            DnsCommand::RetryAfter {
                target,
                record_type,
                protocol,
                seconds,
                targets,
            } => f
                .debug_struct("RetryAfter")
                .field("target", target)
                .field("record_type", record_type)
                .field("protocol", protocol)
                .field("seconds", seconds)
                .field("targets", targets)
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}
