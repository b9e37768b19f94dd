use std::fmt;
use std::str::FromStr;

/// SIP transport a resolved target will be contacted over.
///
/// Blacklisting and retry-after throttling in the resolver cache are scoped
/// to one of these: a host unreachable over UDP may still be usable over TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransportProtocol {
    Udp,
    Tcp,
    Tls,
    Sctp,
    Ws,
    Wss,
}

impl TransportProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::Udp => "UDP",
            TransportProtocol::Tcp => "TCP",
            TransportProtocol::Tls => "TLS",
            TransportProtocol::Sctp => "SCTP",
            TransportProtocol::Ws => "WS",
            TransportProtocol::Wss => "WSS",
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UDP" => Ok(TransportProtocol::Udp),
            "TCP" => Ok(TransportProtocol::Tcp),
            "TLS" => Ok(TransportProtocol::Tls),
            "SCTP" => Ok(TransportProtocol::Sctp),
            "WS" => Ok(TransportProtocol::Ws),
            "WSS" => Ok(TransportProtocol::Wss),
            _ => Err(format!("Unknown transport protocol: {}", s)),
        }
    }
}
