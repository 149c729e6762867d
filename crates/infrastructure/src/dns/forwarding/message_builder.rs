//! Upstream query construction.
//!
//! Builds the wire-format query the forwarding resolver sends upstream.

use super::record_type_map::RecordTypeMapper;
use dnsfront_domain::{DnsQuery, DomainError};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name};
use std::str::FromStr;

/// EDNS payload size advertised to upstreams.
pub const UPSTREAM_EDNS_PAYLOAD: u16 = 4096;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Build an upstream query and return its id with the wire bytes.
    ///
    /// The query has:
    /// - a random id for response matching
    /// - RD set, so the upstream recurses
    /// - AD set, asking the upstream to report its validation result (RFC 6840 §5.7)
    /// - an EDNS(0) OPT record advertising [`UPSTREAM_EDNS_PAYLOAD`]
    pub fn build_query(query: &DnsQuery) -> Result<(u16, Vec<u8>), DomainError> {
        let name = Name::from_str(&query.domain).map_err(|e| {
            DomainError::InvalidQuery(format!("Invalid domain '{}': {}", query.domain, e))
        })?;

        let mut question = Query::query(name, RecordTypeMapper::to_hickory(&query.record_type));
        question.set_query_class(DNSClass::from(query.class));

        let mut edns = Edns::new();
        edns.set_max_payload(UPSTREAM_EDNS_PAYLOAD);

        let id = fastrand::u16(..);
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .set_authentic_data(true)
            .add_query(question);
        message.set_edns(edns);

        let bytes = message.to_vec().map_err(|e| {
            DomainError::Other(format!("Failed to serialize DNS message: {}", e))
        })?;
        Ok((id, bytes))
    }
}
