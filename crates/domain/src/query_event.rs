use super::{DomainError, RecordType};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Udp,
    Tcp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Udp => "udp",
            Transport::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something worth observing about request handling or listener health.
///
/// Every inbound message produces exactly one of `Received`, `Rejected` or
/// `Dropped`. `ResolutionFailed` and `ReplyFailed` follow it when the
/// resolver or the reply write fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    Received {
        domain: Arc<str>,
        record_type: RecordType,
        client_ip: IpAddr,
        transport: Transport,
    },

    /// Answered locally with an error code, without consulting the resolver.
    Rejected {
        transport: Transport,
        response_status: &'static str,
        reason: &'static str,
    },

    /// Not answered at all.
    Dropped {
        transport: Transport,
        reason: &'static str,
    },

    ResolutionFailed {
        domain: Arc<str>,
        record_type: RecordType,
        error: DomainError,
    },

    ReplyFailed {
        transport: Transport,
        client: SocketAddr,
        reason: String,
    },

    ListenerStarted {
        transport: Transport,
        addr: SocketAddr,
    },

    ListenerFailed {
        transport: Transport,
        addr: SocketAddr,
        reason: String,
    },

    ListenerStopped {
        transport: Transport,
        addr: SocketAddr,
    },
}
