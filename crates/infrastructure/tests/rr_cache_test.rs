use ferrous_sip_domain::{
    DnsRecord, DnsStatus, HostRecord, RecordType, SrvRecord, TransportProtocol,
};
use ferrous_sip_infrastructure::dns::cache::{ManualClock, RrCache};
use std::net::Ipv4Addr;
use std::sync::Arc;

fn host(name: &str, last: u8, ttl: u32) -> DnsRecord {
    DnsRecord::Host(HostRecord {
        name: name.to_string(),
        addr: Ipv4Addr::new(192, 0, 2, last),
        ttl,
    })
}

fn srv(name: &str, target: &str, port: u16, ttl: u32) -> DnsRecord {
    DnsRecord::Srv(SrvRecord {
        name: name.to_string(),
        priority: 10,
        weight: 5,
        port,
        target: target.to_string(),
        ttl,
    })
}

fn cache_at(start: u64, max_entries: usize) -> (RrCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    (RrCache::with_clock(max_entries, 60, clock.clone()), clock)
}

#[test]
fn test_bound_never_exceeded_and_lru_evicted() {
    let (mut cache, _clock) = cache_at(1_000, 3);

    cache.update_cache("a.example.com", RecordType::A, vec![host("a.example.com", 1, 300)]);
    cache.update_cache("b.example.com", RecordType::A, vec![host("b.example.com", 2, 300)]);
    cache.update_cache("c.example.com", RecordType::A, vec![host("c.example.com", 3, 300)]);

    // touch a so b becomes least recently used
    assert!(cache
        .lookup("a.example.com", RecordType::A, TransportProtocol::Udp)
        .is_some());

    cache.update_cache("d.example.com", RecordType::A, vec![host("d.example.com", 4, 300)]);
    assert_eq!(cache.len(), 3);
    assert!(!cache.contains("b.example.com", RecordType::A));
    assert!(cache.contains("a.example.com", RecordType::A));
    assert!(cache.contains("c.example.com", RecordType::A));
    assert!(cache.contains("d.example.com", RecordType::A));

    for i in 0..20u8 {
        let name = format!("bulk{}.example.com", i);
        cache.update_cache(&name, RecordType::A, vec![host(&name, i, 300)]);
        assert!(cache.len() <= 3);
    }
    assert_eq!(cache.metrics_snapshot().evictions, 21);
}

#[test]
fn test_update_in_place_does_not_grow() {
    let (mut cache, _clock) = cache_at(1_000, 2);
    cache.update_cache("a.example.com", RecordType::A, vec![host("a.example.com", 1, 300)]);
    cache.update_cache("a.example.com", RecordType::A, vec![host("a.example.com", 9, 300)]);

    assert_eq!(cache.len(), 1);
    let hit = cache
        .lookup("a.example.com", RecordType::A, TransportProtocol::Udp)
        .unwrap();
    assert_eq!(hit.records, vec![host("a.example.com", 9, 300)]);
}

#[test]
fn test_record_gone_after_ttl() {
    let (mut cache, clock) = cache_at(1_000, 16);
    cache.update_cache("example.com", RecordType::A, vec![host("example.com", 1, 60)]);

    clock.advance(59);
    assert!(cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_some());

    clock.advance(2);
    assert!(cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_none());
    assert!(cache.is_empty());
    assert_eq!(cache.metrics_snapshot().expirations, 1);
}

#[test]
fn test_ttl_ceiling_clamps_long_ttls() {
    let (mut cache, clock) = cache_at(0, 16);
    cache.set_ttl_ceiling(1);
    cache.update_cache("example.com", RecordType::A, vec![host("example.com", 1, 86_400)]);

    clock.advance(60);
    assert!(cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_none());
}

#[test]
fn test_lookup_is_case_insensitive() {
    let (mut cache, _clock) = cache_at(0, 16);
    cache.update_cache("Example.COM.", RecordType::A, vec![host("example.com", 1, 60)]);
    assert!(cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_some());
}

#[test]
fn test_blacklist_scoped_to_protocol() {
    let (mut cache, _clock) = cache_at(0, 16);
    let name = "_sip._udp.example.com";
    cache.update_cache(
        name,
        RecordType::SRV,
        vec![
            srv(name, "sip1.example.com", 5060, 300),
            srv(name, "sip2.example.com", 5060, 300),
        ],
    );

    let marked = cache.blacklist(
        name,
        RecordType::SRV,
        TransportProtocol::Udp,
        &["sip1.example.com:5060".to_string()],
    );
    assert_eq!(marked, 1);

    let udp = cache
        .lookup(name, RecordType::SRV, TransportProtocol::Udp)
        .unwrap();
    assert_eq!(udp.records, vec![srv(name, "sip2.example.com", 5060, 300)]);

    let tcp = cache
        .lookup(name, RecordType::SRV, TransportProtocol::Tcp)
        .unwrap();
    assert_eq!(tcp.records.len(), 2);
}

#[test]
fn test_all_blacklisted_entry_is_evicted() {
    let (mut cache, _clock) = cache_at(0, 16);
    cache.update_cache("example.com", RecordType::A, vec![host("example.com", 1, 300)]);
    cache.blacklist(
        "example.com",
        RecordType::A,
        TransportProtocol::Udp,
        &["192.0.2.1".to_string()],
    );

    assert!(cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_none());
    assert!(!cache.contains("example.com", RecordType::A));
    assert!(cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_none());
    assert_eq!(cache.metrics_snapshot().blacklist_purges, 1);
}

#[test]
fn test_retry_after_excludes_then_restores() {
    let (mut cache, clock) = cache_at(1_000, 16);
    cache.update_cache(
        "example.com",
        RecordType::A,
        vec![host("example.com", 1, 600)],
    );
    cache.retry_after(
        "example.com",
        RecordType::A,
        TransportProtocol::Udp,
        5,
        &["192.0.2.1".to_string()],
    );

    clock.advance(2);
    let waiting = cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .unwrap();
    assert!(waiting.records.is_empty());
    assert!(waiting.retry_after > 0);
    assert!(cache.contains("example.com", RecordType::A));

    // other protocols are unaffected
    let tcp = cache
        .lookup("example.com", RecordType::A, TransportProtocol::Tcp)
        .unwrap();
    assert_eq!(tcp.records.len(), 1);

    clock.advance(3);
    let open = cache
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .unwrap();
    assert_eq!(open.records, vec![host("example.com", 1, 600)]);
    assert_eq!(open.retry_after, 0);
}

#[test]
fn test_negative_entry_needs_soa_ttl() {
    let (mut cache, clock) = cache_at(0, 16);

    assert!(!cache.cache_ttl("gone.example.com", RecordType::A, DnsStatus::NotFound, None));
    assert!(cache.is_empty());

    assert!(cache.cache_ttl(
        "gone.example.com",
        RecordType::A,
        DnsStatus::NotFound,
        Some(30)
    ));
    let hit = cache
        .lookup("gone.example.com", RecordType::A, TransportProtocol::Udp)
        .unwrap();
    assert_eq!(hit.status, DnsStatus::NotFound);
    assert!(hit.records.is_empty());

    clock.advance(30);
    assert!(cache
        .lookup("gone.example.com", RecordType::A, TransportProtocol::Udp)
        .is_none());
}

#[test]
fn test_shrinking_bound_applies_on_next_insert() {
    let (mut cache, _clock) = cache_at(0, 8);
    for i in 0..6u8 {
        let name = format!("h{}.example.com", i);
        cache.update_cache(&name, RecordType::A, vec![host(&name, i, 300)]);
    }
    cache.set_max_entries(2);
    assert_eq!(cache.len(), 6);

    cache.update_cache("new.example.com", RecordType::A, vec![host("new.example.com", 99, 300)]);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("new.example.com", RecordType::A));
    assert!(cache.contains("h5.example.com", RecordType::A));
}

#[test]
fn test_dump_lists_most_recent_first() {
    let (mut cache, _clock) = cache_at(0, 8);
    cache.update_cache("a.example.com", RecordType::A, vec![host("a.example.com", 1, 300)]);
    cache.update_cache("b.example.com", RecordType::A, vec![host("b.example.com", 2, 300)]);

    let lines = cache.dump();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("b.example.com"));
    assert!(lines[1].contains("192.0.2.1"));
}
