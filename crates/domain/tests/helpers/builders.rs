#![allow(dead_code)]
use ferrous_sip_domain::{DnsRecord, HostRecord, NaptrRecord, SrvRecord};
use std::net::Ipv4Addr;

pub struct SrvRecordBuilder {
    name: String,
    priority: u16,
    weight: u16,
    port: u16,
    target: String,
    ttl: u32,
}

impl SrvRecordBuilder {
    pub fn new() -> Self {
        Self {
            name: "_sip._udp.example.com".to_string(),
            priority: 10,
            weight: 50,
            port: 5060,
            target: "sip1.example.com".to_string(),
            ttl: 300,
        }
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn build(self) -> DnsRecord {
        DnsRecord::Srv(SrvRecord {
            name: self.name,
            priority: self.priority,
            weight: self.weight,
            port: self.port,
            target: self.target,
            ttl: self.ttl,
        })
    }
}

pub fn host(name: &str, addr: [u8; 4], ttl: u32) -> DnsRecord {
    DnsRecord::Host(HostRecord {
        name: name.to_string(),
        addr: Ipv4Addr::from(addr),
        ttl,
    })
}

pub fn naptr(name: &str, replacement: &str) -> DnsRecord {
    DnsRecord::Naptr(NaptrRecord {
        name: name.to_string(),
        order: 10,
        preference: 100,
        flags: "S".to_string(),
        services: "SIP+D2U".to_string(),
        regexp: String::new(),
        replacement: replacement.to_string(),
        ttl: 300,
    })
}
