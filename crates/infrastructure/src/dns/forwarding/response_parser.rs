use dnsfront_application::ports::DnsResolution;
use dnsfront_domain::DomainError;
use hickory_proto::op::{Message, ResponseCode};
use tracing::debug;

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<Message, DomainError> {
        Message::from_vec(response_bytes)
            .map_err(|e| DomainError::Other(format!("Failed to parse DNS response: {}", e)))
    }

    /// Turns an upstream answer into a resolution or the matching domain error.
    ///
    /// NOERROR passes through with every section, empty or not.
    pub fn into_resolution(mut message: Message) -> Result<DnsResolution, DomainError> {
        let rcode = message.response_code();

        debug!(
            rcode = ?rcode,
            answers = message.answer_count(),
            authority = message.name_server_count(),
            truncated = message.truncated(),
            "DNS response parsed"
        );

        match rcode {
            ResponseCode::NoError => {
                let authentic_data = message.authentic_data();
                let checking_disabled = message.checking_disabled();
                Ok(DnsResolution::new(message.take_answers())
                    .with_authority(message.take_name_servers())
                    .with_additionals(message.take_additionals())
                    .with_dnssec_flags(authentic_data, checking_disabled))
            }
            ResponseCode::NXDomain => Err(DomainError::NoResult),
            ResponseCode::FormErr => Err(DomainError::InvalidQuery(
                "Upstream rejected the query as malformed".to_string(),
            )),
            other => Err(DomainError::Other(format!(
                "Upstream answered {}",
                Self::rcode_to_status(other)
            ))),
        }
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> &'static str {
        match rcode {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::FormErr => "FORMERR",
            _ => "UNKNOWN",
        }
    }
}
