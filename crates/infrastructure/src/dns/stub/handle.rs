use super::command::DnsCommand;
use ferrous_sip_application::ports::{CacheMetricsSnapshot, DnsResultSink};
use ferrous_sip_domain::{DomainError, RecordType, TransportProtocol};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Producer side of the stub's command queue. Cheap to clone and safe to use
/// from any task; every operation is queued and runs on the stub's loop.
#[derive(Clone)]
pub struct DnsStubHandle {
    tx: mpsc::Sender<DnsCommand>,
}

impl DnsStubHandle {
    pub(crate) fn new(tx: mpsc::Sender<DnsCommand>) -> Self {
        Self { tx }
    }

    /// Waits for queue space.
    pub async fn submit(&self, command: DnsCommand) -> Result<(), DomainError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| DomainError::StubUnavailable)
    }

    /// Fails immediately when the queue is full.
    pub fn try_submit(&self, command: DnsCommand) -> Result<(), DomainError> {
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DomainError::CommandQueueFull,
            mpsc::error::TrySendError::Closed(_) => DomainError::StubUnavailable,
        })
    }

    pub async fn lookup(
        &self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Result<(), DomainError> {
        if !record_type.is_queryable() {
            return Err(DomainError::UnsupportedRecordType(record_type.to_string()));
        }
        self.submit(DnsCommand::Lookup {
            target: target.to_string(),
            record_type,
            protocol,
            sink,
        })
        .await
    }

    pub async fn lookup_host(
        &self,
        target: &str,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Result<(), DomainError> {
        self.lookup(target, RecordType::A, protocol, sink).await
    }

    pub async fn lookup_aaaa(
        &self,
        target: &str,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Result<(), DomainError> {
        self.lookup(target, RecordType::AAAA, protocol, sink).await
    }

    pub async fn lookup_srv(
        &self,
        target: &str,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Result<(), DomainError> {
        self.lookup(target, RecordType::SRV, protocol, sink).await
    }

    pub async fn lookup_naptr(
        &self,
        target: &str,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Result<(), DomainError> {
        self.lookup(target, RecordType::NAPTR, protocol, sink).await
    }

    pub async fn lookup_cname(
        &self,
        target: &str,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Result<(), DomainError> {
        self.lookup(target, RecordType::CNAME, protocol, sink).await
    }

    pub async fn blacklist(
        &self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        targets: Vec<String>,
    ) -> Result<(), DomainError> {
        self.submit(DnsCommand::Blacklist {
            target: target.to_string(),
            record_type,
            protocol,
            targets,
        })
        .await
    }

    pub async fn retry_after(
        &self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        seconds: u32,
        targets: Vec<String>,
    ) -> Result<(), DomainError> {
        self.submit(DnsCommand::RetryAfter {
            target: target.to_string(),
            record_type,
            protocol,
            seconds,
            targets,
        })
        .await
    }

    pub async fn clear_cache(&self) -> Result<(), DomainError> {
        self.submit(DnsCommand::ClearCache).await
    }

    pub async fn set_ttl_ceiling(&self, minutes: u32) -> Result<(), DomainError> {
        self.submit(DnsCommand::SetTtlCeiling { minutes }).await
    }

    pub async fn set_max_entries(&self, max_entries: usize) -> Result<(), DomainError> {
        self.submit(DnsCommand::SetMaxEntries { max_entries }).await
    }

    pub async fn dump_cache(&self) -> Result<Vec<String>, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.submit(DnsCommand::DumpCache { reply }).await?;
        rx.await.map_err(|_| DomainError::StubUnavailable)
    }

    pub async fn metrics(&self) -> Result<CacheMetricsSnapshot, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.submit(DnsCommand::Metrics { reply }).await?;
        rx.await.map_err(|_| DomainError::StubUnavailable)
    }
}
