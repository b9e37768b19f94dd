use ferrous_sip_domain::Config;
use ferrous_sip_infrastructure::dns::{DnsStub, DnsStubHandle, UpstreamQuerier};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct DnsServices {
    pub handle: DnsStubHandle,
    pub runner: JoinHandle<()>,
}

impl DnsServices {
    /// Builds the upstream querier and the stub, and starts the stub loop.
    /// The loop ends once every clone of `handle` is dropped.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let querier = Arc::new(UpstreamQuerier::from_config(&config.dns)?);
        let (mut stub, handle) = DnsStub::from_config(&config.dns, querier);

        info!(
            upstreams = config.dns.upstream_servers.len(),
            max_entries = config.dns.max_cache_entries,
            ttl_ceiling_minutes = config.dns.ttl_ceiling_minutes,
            "DNS stub configured"
        );

        let runner = tokio::spawn(async move {
            stub.run().await;
        });

        Ok(Self { handle, runner })
    }
}
