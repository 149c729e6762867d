//! Reply assembly.
//!
//! Every reply is derived from the request: same id and opcode, the first
//! question echoed, recursion-available set. Names are always compressed.

use dnsfront_application::ports::DnsResolution;
use dnsfront_domain::DomainError;
use hickory_proto::error::ProtoError;
use hickory_proto::op::{Header, Message, MessageType, OpCode, ResponseCode};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder, EncodeMode};

/// Length of the fixed DNS header.
pub const HEADER_LEN: usize = 12;

/// Protocol response code for a resolver failure.
pub fn response_code_for(error: &DomainError) -> ResponseCode {
    match error {
        DomainError::NoResult | DomainError::NoData => ResponseCode::NXDomain,
        DomainError::InvalidQuery(_) => ResponseCode::FormErr,
        DomainError::DnssecValidationFailed(_) => ResponseCode::ServFail,
        DomainError::Other(_) => ResponseCode::ServFail,
    }
}

/// Empty NOERROR reply to `request`.
pub fn reply_to(request: &Message) -> Message {
    let mut reply = Message::new();
    reply
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_available(true)
        .set_response_code(ResponseCode::NoError);

    if request.op_code() == OpCode::Query {
        reply
            .set_recursion_desired(request.recursion_desired())
            .set_checking_disabled(request.checking_disabled());
    }

    if let Some(question) = request.queries().first() {
        reply.add_query(question.clone());
    }

    reply
}

/// Reply carrying only `code`, with empty answer/authority/additional sections.
pub fn error_reply(request: &Message, code: ResponseCode) -> Message {
    let mut reply = reply_to(request);
    reply.set_response_code(code);
    reply
}

/// Copies a successful outcome onto `reply`.
pub fn apply_resolution(reply: &mut Message, resolution: DnsResolution) {
    reply
        .set_response_code(resolution.response_code)
        .set_authentic_data(resolution.authentic_data)
        .set_checking_disabled(resolution.checking_disabled);
    reply.add_answers(resolution.answers);
    reply.add_name_servers(resolution.authority);
    reply.add_additionals(resolution.additionals);
}

/// FORMERR-style reply for bytes that carry a header but no decodable body.
///
/// Returns `None` when even the header is incomplete, or when the header
/// says the message is itself a response.
pub fn header_error_reply(bytes: &[u8], code: ResponseCode) -> Option<Message> {
    let header = Header::from_bytes(bytes.get(..HEADER_LEN)?).ok()?;
    if header.message_type() == MessageType::Response {
        return None;
    }

    let mut reply = Message::new();
    reply
        .set_id(header.id())
        .set_message_type(MessageType::Response)
        .set_op_code(header.op_code())
        .set_recursion_desired(header.recursion_desired())
        .set_recursion_available(true)
        .set_response_code(code);
    Some(reply)
}

/// Serializes `message` with name compression.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtoError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::with_mode(&mut buf, EncodeMode::Normal);
    message.emit(&mut encoder)?;
    Ok(buf)
}
