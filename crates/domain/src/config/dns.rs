use serde::{Deserialize, Serialize};

use crate::DnsProtocol;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_upstream_servers")]
    pub upstream_servers: Vec<String>,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Ceiling applied to every cached record TTL, in minutes.
    #[serde(default = "default_ttl_ceiling_minutes")]
    pub ttl_ceiling_minutes: u32,

    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,

    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,

    /// Retry over TCP when a UDP answer comes back truncated.
    #[serde(default = "default_true")]
    pub tcp_fallback: bool,
}

impl DnsConfig {
    pub fn upstreams(&self) -> Result<Vec<DnsProtocol>, String> {
        self.upstream_servers.iter().map(|s| s.parse()).collect()
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_servers: default_upstream_servers(),
            query_timeout_ms: default_query_timeout_ms(),
            ttl_ceiling_minutes: default_ttl_ceiling_minutes(),
            max_cache_entries: default_max_cache_entries(),
            command_queue_capacity: default_command_queue_capacity(),
            tcp_fallback: true,
        }
    }
}

fn default_upstream_servers() -> Vec<String> {
    vec!["udp://8.8.8.8:53".to_string(), "udp://1.1.1.1:53".to_string()]
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_ttl_ceiling_minutes() -> u32 {
    60
}

fn default_max_cache_entries() -> usize {
    512
}

fn default_command_queue_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}
