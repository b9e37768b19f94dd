use ferrous_sip_domain::{DnsProtocol, TransportProtocol};
use std::net::SocketAddr;

#[test]
fn test_parse_udp() {
    let protocol: DnsProtocol = "udp://8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
}

#[test]
fn test_parse_udp_default() {
    let protocol: DnsProtocol = "8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
}

#[test]
fn test_parse_bare_ip_uses_port_53() {
    let protocol: DnsProtocol = "9.9.9.9".parse().unwrap();
    let expected: SocketAddr = "9.9.9.9:53".parse().unwrap();
    assert_eq!(protocol.socket_addr(), expected);
}

#[test]
fn test_parse_tcp_ipv6() {
    let protocol: DnsProtocol = "tcp://[2001:4860:4860::8888]:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Tcp { .. }));
    assert_eq!(protocol.protocol_name(), "TCP");
}

#[test]
fn test_parse_rejects_unsupported_scheme() {
    let result: Result<DnsProtocol, _> = "https://1.1.1.1/dns-query".parse();
    assert!(result.is_err());
}

#[test]
fn test_display_round_trip() {
    let protocol: DnsProtocol = "tcp://1.1.1.1:53".parse().unwrap();
    let reparsed: DnsProtocol = protocol.to_string().parse().unwrap();
    assert_eq!(protocol, reparsed);
}

#[test]
fn test_transport_protocol_parse() {
    assert_eq!("udp".parse::<TransportProtocol>().unwrap(), TransportProtocol::Udp);
    assert_eq!("TLS".parse::<TransportProtocol>().unwrap(), TransportProtocol::Tls);
    assert!("quic".parse::<TransportProtocol>().is_err());
    assert_eq!(TransportProtocol::Wss.to_string(), "WSS");
}
