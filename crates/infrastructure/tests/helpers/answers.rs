use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, CNAME, SOA, SRV};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use std::net::Ipv4Addr;
use std::str::FromStr;

pub fn name(s: &str) -> Name {
    Name::from_str(&format!("{}.", s.trim_end_matches('.'))).unwrap()
}

pub fn a(owner: &str, ip: Ipv4Addr, ttl: u32) -> Record {
    Record::from_rdata(name(owner), ttl, RData::A(A(ip)))
}

pub fn cname(owner: &str, target: &str, ttl: u32) -> Record {
    Record::from_rdata(name(owner), ttl, RData::CNAME(CNAME(name(target))))
}

pub fn srv(owner: &str, priority: u16, weight: u16, port: u16, target: &str, ttl: u32) -> Record {
    Record::from_rdata(
        name(owner),
        ttl,
        RData::SRV(SRV::new(priority, weight, port, name(target))),
    )
}

pub fn soa(zone: &str, minimum: u32, ttl: u32) -> Record {
    let soa = SOA::new(
        name(&format!("ns1.{}", zone)),
        name(&format!("hostmaster.{}", zone)),
        1,
        3600,
        900,
        604800,
        minimum,
    );
    Record::from_rdata(name(zone), ttl, RData::SOA(soa))
}

fn message(question: &str, record_type: RecordType, rcode: ResponseCode) -> Message {
    let mut msg = Message::new();
    msg.set_id(4242)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .set_response_code(rcode);
    msg.add_query(Query::query(name(question), record_type));
    msg
}

/// NOERROR answer carrying `records` in the answer section.
pub fn answer(question: &str, record_type: RecordType, records: Vec<Record>) -> Vec<u8> {
    let mut msg = message(question, record_type, ResponseCode::NoError);
    msg.add_answers(records);
    msg.to_vec().unwrap()
}

/// Failure answer with an optional SOA in the authority section.
pub fn failure(
    question: &str,
    record_type: RecordType,
    rcode: ResponseCode,
    authority: Option<Record>,
) -> Vec<u8> {
    let mut msg = message(question, record_type, rcode);
    if let Some(soa) = authority {
        msg.add_name_server(soa);
    }
    msg.to_vec().unwrap()
}
