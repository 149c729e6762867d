use async_trait::async_trait;
use dnsfront_domain::{DnsQuery, DomainError};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Record;

/// A successful outcome from the resolving engine.
///
/// Sections are kept in the order the engine produced them and are copied
/// verbatim into the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DnsResolution {
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additionals: Vec<Record>,
    pub response_code: ResponseCode,
    /// AD bit: the engine validated the answer.
    pub authentic_data: bool,
    /// CD bit: validation was not performed on the client's behalf.
    pub checking_disabled: bool,
}

impl DnsResolution {
    pub fn new(answers: Vec<Record>) -> Self {
        Self {
            answers,
            authority: vec![],
            additionals: vec![],
            response_code: ResponseCode::NoError,
            authentic_data: false,
            checking_disabled: false,
        }
    }

    pub fn with_authority(mut self, authority: Vec<Record>) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_additionals(mut self, additionals: Vec<Record>) -> Self {
        self.additionals = additionals;
        self
    }

    pub fn with_response_code(mut self, response_code: ResponseCode) -> Self {
        self.response_code = response_code;
        self
    }

    pub fn with_dnssec_flags(mut self, authentic_data: bool, checking_disabled: bool) -> Self {
        self.authentic_data = authentic_data;
        self.checking_disabled = checking_disabled;
        self
    }
}

/// The resolving engine.
///
/// Called concurrently from many requests; implementations must not rely on
/// callers serialising access.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, query: &DnsQuery) -> Result<DnsResolution, DomainError>;
}
