//! Mapping between `ferrous_sip_domain::RecordType` and `hickory_proto::rr::RecordType`

use ferrous_sip_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        match record_type {
            RecordType::A => HickoryRecordType::A,
            RecordType::AAAA => HickoryRecordType::AAAA,
            RecordType::CNAME => HickoryRecordType::CNAME,
            RecordType::SRV => HickoryRecordType::SRV,
            RecordType::NAPTR => HickoryRecordType::NAPTR,
            RecordType::SOA => HickoryRecordType::SOA,
        }
    }

    /// Returns `None` for types the resolver does not deal in.
    pub fn from_hickory(hickory_type: HickoryRecordType) -> Option<RecordType> {
        match hickory_type {
            HickoryRecordType::A => Some(RecordType::A),
            HickoryRecordType::AAAA => Some(RecordType::AAAA),
            HickoryRecordType::CNAME => Some(RecordType::CNAME),
            HickoryRecordType::SRV => Some(RecordType::SRV),
            HickoryRecordType::NAPTR => Some(RecordType::NAPTR),
            HickoryRecordType::SOA => Some(RecordType::SOA),
            _ => None,
        }
    }
}
