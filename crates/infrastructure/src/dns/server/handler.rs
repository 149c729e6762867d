use super::reply;
use crate::dns::forwarding::RecordTypeMapper;
use dnsfront_application::ports::QueryEventSink;
use dnsfront_application::use_cases::HandleDnsQueryUseCase;
use dnsfront_domain::{DnsQuery, DnsRequest, QueryEvent, Transport, QUESTIONS_ANSWERED};
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Turns one inbound wire message into one reply.
///
/// Shared by both listeners; holds no per-request state, so a single
/// instance serves any number of concurrent requests.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    events: Arc<dyn QueryEventSink>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        let events = Arc::clone(use_case.events());
        Self { use_case, events }
    }

    pub fn events(&self) -> &Arc<dyn QueryEventSink> {
        &self.events
    }

    /// Handles raw request bytes and returns the encoded reply.
    ///
    /// `None` means nothing should be sent: the input was not a request, or
    /// the reply could not be encoded (already recorded as `ReplyFailed`).
    pub async fn handle_raw(
        &self,
        bytes: &[u8],
        transport: Transport,
        client: SocketAddr,
    ) -> Option<Vec<u8>> {
        let reply = self.handle_message(bytes, transport, client).await?;

        match reply::encode(&reply) {
            Ok(wire) => Some(wire),
            Err(e) => {
                self.events.record(QueryEvent::ReplyFailed {
                    transport,
                    client,
                    reason: format!("failed to encode reply: {}", e),
                });
                None
            }
        }
    }

    /// Same as [`handle_raw`](Self::handle_raw) but stops before encoding.
    pub async fn handle_message(
        &self,
        bytes: &[u8],
        transport: Transport,
        client: SocketAddr,
    ) -> Option<Message> {
        let request = match Message::from_vec(bytes) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, client = %client, %transport, "Undecodable DNS message");
                return self.reject_undecodable(bytes, transport);
            }
        };

        if request.message_type() == MessageType::Response {
            self.events.record(QueryEvent::Dropped {
                transport,
                reason: "message is a response",
            });
            return None;
        }

        if request.op_code() != OpCode::Query {
            self.events.record(QueryEvent::Rejected {
                transport,
                response_status: "NOTIMP",
                reason: "unsupported opcode",
            });
            return Some(reply::error_reply(&request, ResponseCode::NotImp));
        }

        let Some(question) = request.queries().first() else {
            self.events.record(QueryEvent::Rejected {
                transport,
                response_status: "FORMERR",
                reason: "no question",
            });
            return Some(reply::error_reply(&request, ResponseCode::FormErr));
        };

        let ignored = request.queries().len().saturating_sub(QUESTIONS_ANSWERED);
        if ignored > 0 {
            debug!(ignored, client = %client, "Ignoring additional questions");
        }

        let query = DnsQuery::new(
            question.name().to_string(),
            RecordTypeMapper::from_hickory(question.query_type()),
        )
        .with_class(u16::from(question.query_class()));
        let dns_request = DnsRequest::new(query, client.ip(), transport);

        let mut reply = reply::reply_to(&request);
        match self.use_case.execute(&dns_request).await {
            Ok(resolution) => reply::apply_resolution(&mut reply, resolution),
            Err(e) => {
                reply.set_response_code(reply::response_code_for(&e));
            }
        }

        Some(reply)
    }

    /// Records a reply that could not be written back to the client.
    pub fn report_send_failure(&self, transport: Transport, client: SocketAddr, error: &io::Error) {
        self.events.record(QueryEvent::ReplyFailed {
            transport,
            client,
            reason: error.to_string(),
        });
    }

    fn reject_undecodable(&self, bytes: &[u8], transport: Transport) -> Option<Message> {
        match reply::header_error_reply(bytes, ResponseCode::FormErr) {
            Some(reply) => {
                self.events.record(QueryEvent::Rejected {
                    transport,
                    response_status: "FORMERR",
                    reason: "undecodable message",
                });
                Some(reply)
            }
            None => {
                self.events.record(QueryEvent::Dropped {
                    transport,
                    reason: "no usable header",
                });
                None
            }
        }
    }
}
