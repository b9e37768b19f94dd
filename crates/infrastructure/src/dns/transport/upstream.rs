use super::{create_transport, tcp::TcpTransport, DnsTransport, Transport};
use crate::dns::forwarding::MessageBuilder;
use async_trait::async_trait;
use ferrous_sip_application::ports::RawQueryPort;
use ferrous_sip_domain::{DnsConfig, DnsProtocol, DomainError, RecordType};
use hickory_proto::op::Message;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw query submission over the configured upstream resolvers, tried in order.
pub struct UpstreamQuerier {
    upstreams: Vec<DnsProtocol>,
    timeout: Duration,
    tcp_fallback: bool,
}

impl UpstreamQuerier {
    pub fn new(upstreams: Vec<DnsProtocol>, timeout: Duration, tcp_fallback: bool) -> Self {
        Self {
            upstreams,
            timeout,
            tcp_fallback,
        }
    }

    pub fn from_config(config: &DnsConfig) -> Result<Self, DomainError> {
        let upstreams = config.upstreams().map_err(DomainError::ConfigError)?;
        Ok(Self::new(
            upstreams,
            Duration::from_millis(config.query_timeout_ms),
            config.tcp_fallback,
        ))
    }

    async fn query_one(
        &self,
        upstream: &DnsProtocol,
        query_bytes: &[u8],
        query_id: u16,
    ) -> Result<Vec<u8>, DomainError> {
        let transport = create_transport(upstream);
        let response = transport.send(query_bytes, self.timeout).await?;
        let message = Message::from_vec(&response.bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        if message.id() != query_id {
            return Err(DomainError::InvalidDnsResponse(format!(
                "Response ID {} does not match query ID {}",
                message.id(),
                query_id
            )));
        }

        if message.truncated() && self.tcp_fallback && matches!(transport, Transport::Udp(_)) {
            debug!(server = %upstream, "Truncated UDP answer, retrying over TCP");
            let tcp = TcpTransport::new(upstream.socket_addr());
            return Ok(tcp.send(query_bytes, self.timeout).await?.bytes);
        }

        Ok(response.bytes)
    }
}

#[async_trait]
impl RawQueryPort for UpstreamQuerier {
    async fn issue_query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<u8>, DomainError> {
        let (query_id, query_bytes) = MessageBuilder::build_query(name, &record_type)?;
        let mut last_error = DomainError::TransportNoUpstreamServers;

        for upstream in &self.upstreams {
            match self.query_one(upstream, &query_bytes, query_id).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!(
                        server = %upstream,
                        domain = %name,
                        record_type = %record_type,
                        error = %e,
                        "Upstream query failed"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
