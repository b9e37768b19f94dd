mod helpers;

use ferrous_sip_application::ports::RecordingSink;
use ferrous_sip_domain::{DnsStatus, DomainError, RecordType, TransportProtocol};
use ferrous_sip_infrastructure::dns::cache::{ManualClock, RrCache};
use ferrous_sip_infrastructure::dns::{DnsCommand, DnsStub, DnsStubHandle};
use helpers::answers;
use helpers::scripted_port::ScriptedPort;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType as WireType;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

fn stub_with(port: Arc<ScriptedPort>) -> (DnsStub, DnsStubHandle, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(10_000));
    let cache = RrCache::with_clock(64, 60, clock.clone());
    let (stub, handle) = DnsStub::new(port, cache, 32);
    (stub, handle, clock)
}

fn cname_chain(len: usize) -> Vec<hickory_proto::rr::Record> {
    let mut records: Vec<_> = (0..len)
        .map(|i| {
            answers::cname(
                &format!("c{}.example.com", i),
                &format!("c{}.example.com", i + 1),
                300,
            )
        })
        .collect();
    records.push(answers::a(
        &format!("c{}.example.com", len),
        Ipv4Addr::new(198, 51, 100, 7),
        300,
    ));
    records
}

#[tokio::test]
async fn test_a_lookup_then_expiry() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "example.com",
        RecordType::A,
        answers::answer(
            "example.com",
            WireType::A,
            vec![answers::a("example.com", Ipv4Addr::new(192, 0, 2, 10), 60)],
        ),
    );
    let (mut stub, handle, clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    {
        let hosts = sink.hosts.lock().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].status.code(), 0);
        assert_eq!(hosts[0].domain, "example.com");
        assert_eq!(hosts[0].records.len(), 1);
        assert_eq!(hosts[0].records[0].addr, Ipv4Addr::new(192, 0, 2, 10));
    }

    // second lookup is served from the cache
    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;
    assert_eq!(port.call_count(), 1);
    assert_eq!(sink.hosts.lock().unwrap().len(), 2);

    clock.advance(61);
    assert!(stub
        .cache_mut()
        .lookup("example.com", RecordType::A, TransportProtocol::Udp)
        .is_none());

    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;
    assert_eq!(port.call_count(), 2);
}

#[tokio::test]
async fn test_mixed_case_and_trailing_dot_targets_resolve() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "example.com",
        RecordType::A,
        answers::answer(
            "example.com",
            WireType::A,
            vec![answers::a("example.com", Ipv4Addr::new(192, 0, 2, 10), 60)],
        ),
    );
    let (mut stub, handle, _clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("Example.COM.", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    assert_eq!(port.calls(), vec![("example.com".to_string(), RecordType::A)]);
    {
        let hosts = sink.hosts.lock().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].status, DnsStatus::Success);
        assert_eq!(hosts[0].domain, "Example.COM.");
        assert_eq!(hosts[0].records.len(), 1);
    }

    // every spelling shares the one cache entry
    for target in ["example.com.", "EXAMPLE.com"] {
        handle
            .lookup_host(target, TransportProtocol::Udp, sink.clone())
            .await
            .unwrap();
        stub.run_until_idle().await;
    }
    assert_eq!(port.call_count(), 1);
    let hosts = sink.hosts.lock().unwrap();
    assert_eq!(hosts.len(), 3);
    assert!(hosts.iter().all(|r| r.status == DnsStatus::Success && r.records.len() == 1));
}

#[tokio::test]
async fn test_network_answer_is_not_counted_as_cache_hit() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "example.com",
        RecordType::A,
        answers::answer(
            "example.com",
            WireType::A,
            vec![answers::a("example.com", Ipv4Addr::new(192, 0, 2, 10), 60)],
        ),
    );
    let (mut stub, handle, _clock) = stub_with(port);
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let metrics = stub.cache().metrics_snapshot();
    assert_eq!(metrics.hits, 0);
    assert_eq!(metrics.misses, 1);

    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let metrics = stub.cache().metrics_snapshot();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 1);
    assert_eq!(sink.hosts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_srv_through_cname_keeps_original_domain() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "_sip._udp.example.com",
        RecordType::SRV,
        answers::answer(
            "_sip._udp.example.com",
            WireType::SRV,
            vec![answers::cname("_sip._udp.example.com", "sip.example.com", 300)],
        ),
    );
    port.on(
        "sip.example.com",
        RecordType::SRV,
        answers::answer(
            "sip.example.com",
            WireType::SRV,
            vec![
                answers::srv("sip.example.com", 10, 60, 5060, "proxy1.example.com", 300),
                answers::srv("sip.example.com", 20, 40, 5060, "proxy2.example.com", 300),
            ],
        ),
    );
    let (mut stub, handle, _clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_srv("_sip._udp.example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let srvs = sink.srvs.lock().unwrap();
    assert_eq!(srvs.len(), 1);
    assert!(srvs[0].is_success());
    assert_eq!(srvs[0].domain, "_sip._udp.example.com");
    let targets: Vec<_> = srvs[0].records.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["proxy1.example.com", "proxy2.example.com"]);
    assert_eq!(
        port.calls(),
        vec![
            ("_sip._udp.example.com".to_string(), RecordType::SRV),
            ("sip.example.com".to_string(), RecordType::SRV),
        ]
    );
}

#[tokio::test]
async fn test_cname_chain_at_limit_resolves() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "c0.example.com",
        RecordType::A,
        answers::answer("c0.example.com", WireType::A, cname_chain(5)),
    );
    let (mut stub, handle, _clock) = stub_with(port);
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("c0.example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let hosts = sink.hosts.lock().unwrap();
    assert_eq!(hosts.len(), 1);
    assert!(hosts[0].is_success());
    assert_eq!(hosts[0].domain, "c0.example.com");
    assert_eq!(hosts[0].records[0].addr, Ipv4Addr::new(198, 51, 100, 7));
}

#[tokio::test]
async fn test_cname_chain_past_limit_fails() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "c0.example.com",
        RecordType::A,
        answers::answer("c0.example.com", WireType::A, cname_chain(6)),
    );
    let (mut stub, handle, _clock) = stub_with(port);
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("c0.example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let hosts = sink.hosts.lock().unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].status, DnsStatus::CnameLimitExceeded);
    assert!(hosts[0].records.is_empty());
    assert_eq!(stub.in_flight(), 0);
}

#[tokio::test]
async fn test_cname_requeries_are_bounded() {
    // every answer carries a single CNAME, so each hop costs a re-query
    let port = Arc::new(ScriptedPort::new());
    for i in 0..10 {
        let owner = format!("loop{}.example.com", i);
        let next = format!("loop{}.example.com", i + 1);
        port.on(
            &owner,
            RecordType::A,
            answers::answer(&owner, WireType::A, vec![answers::cname(&owner, &next, 300)]),
        );
    }
    let (mut stub, handle, _clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("loop0.example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let hosts = sink.hosts.lock().unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].status, DnsStatus::CnameLimitExceeded);
    assert_eq!(port.call_count(), 6);
}

#[tokio::test]
async fn test_nxdomain_with_soa_is_cached() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "missing.example.com",
        RecordType::A,
        answers::failure(
            "missing.example.com",
            WireType::A,
            ResponseCode::NXDomain,
            Some(answers::soa("example.com", 300, 600)),
        ),
    );
    let (mut stub, handle, clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    for _ in 0..2 {
        handle
            .lookup_host("missing.example.com", TransportProtocol::Udp, sink.clone())
            .await
            .unwrap();
        stub.run_until_idle().await;
    }

    {
        let hosts = sink.hosts.lock().unwrap();
        assert_eq!(hosts.len(), 2);
        assert!(hosts.iter().all(|r| r.status == DnsStatus::NotFound));
    }
    assert_eq!(port.call_count(), 1);

    clock.advance(300);
    handle
        .lookup_host("missing.example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;
    assert_eq!(port.call_count(), 2);
}

#[tokio::test]
async fn test_nxdomain_without_soa_is_not_cached() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "missing.example.com",
        RecordType::A,
        answers::failure("missing.example.com", WireType::A, ResponseCode::NXDomain, None),
    );
    let (mut stub, handle, _clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    for _ in 0..2 {
        handle
            .lookup_host("missing.example.com", TransportProtocol::Udp, sink.clone())
            .await
            .unwrap();
        stub.run_until_idle().await;
    }
    assert_eq!(port.call_count(), 2);
    assert!(stub.cache().is_empty());
}

#[tokio::test]
async fn test_timeout_reported_and_not_cached() {
    let port = Arc::new(ScriptedPort::new());
    let (mut stub, handle, _clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_naptr("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let naptrs = sink.naptrs.lock().unwrap();
    assert_eq!(naptrs.len(), 1);
    assert_eq!(naptrs[0].status, DnsStatus::Timeout);
    assert_eq!(naptrs[0].domain, "example.com");
    assert!(stub.cache().is_empty());
}

#[tokio::test]
async fn test_transport_error_status() {
    let port = Arc::new(ScriptedPort::new());
    port.fail(
        "example.com",
        RecordType::AAAA,
        DomainError::TransportConnectionRefused {
            server: "192.0.2.53:53".to_string(),
        },
    );
    let (mut stub, handle, _clock) = stub_with(port);
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_aaaa("example.com", TransportProtocol::Tcp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let aaaas = sink.aaaas.lock().unwrap();
    assert_eq!(aaaas[0].status, DnsStatus::TransportError);
}

#[tokio::test]
async fn test_garbage_answer_is_bad_response() {
    let port = Arc::new(ScriptedPort::new());
    port.on("example.com", RecordType::A, vec![0x12, 0x34, 0x01]);
    let (mut stub, handle, _clock) = stub_with(port);
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    assert_eq!(sink.hosts.lock().unwrap()[0].status, DnsStatus::BadResponse);
}

#[tokio::test]
async fn test_blacklist_through_handle() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "_sip._tcp.example.com",
        RecordType::SRV,
        answers::answer(
            "_sip._tcp.example.com",
            WireType::SRV,
            vec![
                answers::srv("_sip._tcp.example.com", 10, 50, 5060, "a.example.com", 300),
                answers::srv("_sip._tcp.example.com", 10, 50, 5060, "b.example.com", 300),
            ],
        ),
    );
    let (mut stub, handle, _clock) = stub_with(port.clone());
    let sink = Arc::new(RecordingSink::new());

    handle
        .lookup_srv("_sip._tcp.example.com", TransportProtocol::Tcp, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    handle
        .blacklist(
            "_sip._tcp.example.com",
            RecordType::SRV,
            TransportProtocol::Tcp,
            vec!["a.example.com:5060".to_string()],
        )
        .await
        .unwrap();
    handle
        .lookup_srv("_sip._tcp.example.com", TransportProtocol::Tcp, sink.clone())
        .await
        .unwrap();
    handle
        .lookup_srv("_sip._tcp.example.com", TransportProtocol::Tls, sink.clone())
        .await
        .unwrap();
    stub.run_until_idle().await;

    let srvs = sink.srvs.lock().unwrap();
    assert_eq!(srvs.len(), 3);
    assert_eq!(srvs[0].records.len(), 2);
    assert_eq!(srvs[1].records.len(), 1);
    assert_eq!(srvs[1].records[0].target, "b.example.com");
    assert_eq!(srvs[2].records.len(), 2);
    assert_eq!(port.call_count(), 1);
}

#[tokio::test]
async fn test_unsupported_type_rejected_at_handle() {
    let port = Arc::new(ScriptedPort::new());
    let (_stub, handle, _clock) = stub_with(port);
    let sink = Arc::new(RecordingSink::new());

    let err = handle
        .lookup("example.com", RecordType::SOA, TransportProtocol::Udp, sink)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UnsupportedRecordType(_)));
}

#[tokio::test]
async fn test_full_queue_and_stopped_stub() {
    let port = Arc::new(ScriptedPort::new());
    let clock = Arc::new(ManualClock::new(0));
    let (stub, handle) = DnsStub::new(port, RrCache::with_clock(8, 60, clock), 1);

    handle.try_submit(DnsCommand::ClearCache).unwrap();
    assert!(matches!(
        handle.try_submit(DnsCommand::ClearCache),
        Err(DomainError::CommandQueueFull)
    ));

    drop(stub);
    assert!(matches!(
        handle.clear_cache().await,
        Err(DomainError::StubUnavailable)
    ));
}

#[tokio::test]
async fn test_running_stub_reports_metrics_and_dump() {
    let port = Arc::new(ScriptedPort::new());
    port.on(
        "example.com",
        RecordType::A,
        answers::answer(
            "example.com",
            WireType::A,
            vec![answers::a("example.com", Ipv4Addr::new(192, 0, 2, 1), 120)],
        ),
    );
    let (mut stub, handle, _clock) = stub_with(port);
    let runner = tokio::spawn(async move {
        stub.run().await;
        stub
    });

    let sink = Arc::new(RecordingSink::new());
    handle
        .lookup_host("example.com", TransportProtocol::Udp, sink.clone())
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while sink.total() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let metrics = handle.metrics().await.unwrap();
    assert_eq!(metrics.total_entries, 1);
    assert_eq!(metrics.insertions, 1);
    assert_eq!(metrics.max_entries, 64);

    let dump = handle.dump_cache().await.unwrap();
    assert_eq!(dump.len(), 1);
    assert!(dump[0].starts_with("example.com A"));

    handle.set_max_entries(4).await.unwrap();
    handle.clear_cache().await.unwrap();
    assert_eq!(handle.metrics().await.unwrap().total_entries, 0);

    drop(handle);
    let stub = runner.await.unwrap();
    assert_eq!(stub.cache().max_entries(), 4);
    assert_eq!(stub.in_flight(), 0);
}
