#![allow(dead_code)]

pub mod mocks;
pub mod upstream;

pub use mocks::{MockDnsResolver, RecordingEventSink};
pub use upstream::{MockUpstream, UpstreamBehavior};

use dnsfront_application::ports::DnsResolution;
use dnsfront_application::use_cases::HandleDnsQueryUseCase;
use dnsfront_infrastructure::dns::DnsServerHandler;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

pub fn handler_with(resolver: &MockDnsResolver, events: &RecordingEventSink) -> DnsServerHandler {
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver.clone()), Arc::new(events.clone()));
    DnsServerHandler::new(Arc::new(use_case))
}

pub fn query_message(id: u16, name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

pub fn query_bytes(id: u16, name: &str, record_type: RecordType) -> Vec<u8> {
    query_message(id, name, record_type).to_vec().unwrap()
}

pub fn a_record(name: &str, ip: Ipv4Addr) -> Record {
    Record::from_rdata(Name::from_str(name).unwrap(), 300, RData::A(A(ip)))
}

pub fn a_resolution(name: &str, ip: Ipv4Addr) -> DnsResolution {
    DnsResolution::new(vec![a_record(name, ip)])
}

/// A loopback port that was free for both UDP and TCP a moment ago.
pub fn free_port() -> u16 {
    loop {
        let tcp = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = tcp.local_addr().unwrap().port();
        if std::net::UdpSocket::bind(("127.0.0.1", port)).is_ok() {
            return port;
        }
    }
}

pub fn loopback(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}
