use super::record_converter::RecordConverter;
use ferrous_sip_domain::{DnsRecord, DnsStatus, DomainError};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{RData, Record};
use tracing::debug;

/// A raw answer reduced to what the resolver acts on.
#[derive(Debug, Clone)]
pub struct ParsedAnswer {
    pub status: DnsStatus,
    pub truncated: bool,
    /// Answer-section records of supported types, in wire order.
    pub answers: Vec<DnsRecord>,
    /// RFC 2308 negative TTL from the authority SOA, when one is present.
    pub negative_ttl: Option<u32>,
}

impl ParsedAnswer {
    /// Answer records owned by `name` of the given kind.
    pub fn records_for<'a>(
        &'a self,
        name: &'a str,
        record_type: ferrous_sip_domain::RecordType,
    ) -> impl Iterator<Item = &'a DnsRecord> + 'a {
        self.answers
            .iter()
            .filter(move |r| r.record_type() == record_type && r.name() == name)
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<ParsedAnswer, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = message.response_code();
        let truncated = message.truncated();

        let answers: Vec<DnsRecord> = message
            .answers()
            .iter()
            .filter_map(RecordConverter::convert)
            .collect();

        let negative_ttl = Self::extract_negative_ttl(message.name_servers());

        debug!(
            rcode = ?rcode,
            answers = answers.len(),
            truncated = truncated,
            negative_ttl = ?negative_ttl,
            "DNS response parsed"
        );

        Ok(ParsedAnswer {
            status: Self::rcode_to_status(rcode),
            truncated,
            answers,
            negative_ttl,
        })
    }

    pub fn extract_negative_ttl(authority_records: &[Record]) -> Option<u32> {
        authority_records.iter().find_map(|r| {
            if let RData::SOA(soa) = r.data() {
                Some(soa.minimum().min(r.ttl()))
            } else {
                None
            }
        })
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> DnsStatus {
        match rcode {
            ResponseCode::NoError => DnsStatus::Success,
            ResponseCode::FormErr => DnsStatus::FormatError,
            ResponseCode::ServFail => DnsStatus::ServerFailure,
            ResponseCode::NXDomain => DnsStatus::NotFound,
            ResponseCode::NotImp => DnsStatus::NotImplemented,
            ResponseCode::Refused => DnsStatus::Refused,
            _ => DnsStatus::ServerFailure,
        }
    }

    /// Status reported for a query the transport could not complete.
    pub fn transport_error_status(error: &DomainError) -> DnsStatus {
        if error.is_timeout() {
            DnsStatus::Timeout
        } else if matches!(error, DomainError::InvalidDnsResponse(_)) {
            DnsStatus::BadResponse
        } else {
            DnsStatus::TransportError
        }
    }
}
