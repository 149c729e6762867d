use super::{RecordType, Transport};
use std::net::IpAddr;
use std::sync::Arc;

/// Number of question entries answered per inbound message.
///
/// The protocol allows several questions per message; only the first one is
/// resolved and echoed back, later entries are ignored.
pub const QUESTIONS_ANSWERED: usize = 1;

/// Class code for the Internet class.
pub const CLASS_IN: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub class: u16,
}

impl DnsQuery {
    pub fn new(domain: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            record_type,
            class: CLASS_IN,
        }
    }

    pub fn with_class(mut self, class: u16) -> Self {
        self.class = class;
        self
    }
}

/// A query together with where it came from.
#[derive(Debug, Clone)]
pub struct DnsRequest {
    pub query: DnsQuery,
    pub client_ip: IpAddr,
    pub transport: Transport,
}

impl DnsRequest {
    pub fn new(query: DnsQuery, client_ip: IpAddr, transport: Transport) -> Self {
        Self {
            query,
            client_ip,
            transport,
        }
    }
}
