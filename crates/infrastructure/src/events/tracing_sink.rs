use dnsfront_application::ports::QueryEventSink;
use dnsfront_domain::{DomainError, QueryEvent};
use tracing::{debug, error, info, warn};

/// Writes every [`QueryEvent`] as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl QueryEventSink for TracingEventSink {
    fn record(&self, event: QueryEvent) {
        match event {
            QueryEvent::Received {
                domain,
                record_type,
                client_ip,
                transport,
            } => {
                debug!(domain = %domain, record_type = %record_type, client = %client_ip, transport = %transport, "DNS query received");
            }
            QueryEvent::Rejected {
                transport,
                response_status,
                reason,
            } => {
                debug!(transport = %transport, response_status, reason, "DNS query rejected");
            }
            QueryEvent::Dropped { transport, reason } => {
                debug!(transport = %transport, reason, "DNS message dropped");
            }
            QueryEvent::ResolutionFailed {
                domain,
                record_type,
                error,
            } => match error {
                // Negative answers are ordinary traffic.
                DomainError::NoResult | DomainError::NoData => {
                    debug!(domain = %domain, record_type = %record_type, status = error.status(), "No answer for query");
                }
                _ => {
                    warn!(domain = %domain, record_type = %record_type, status = error.status(), error = %error, "DNS resolution failed");
                }
            },
            QueryEvent::ReplyFailed {
                transport,
                client,
                reason,
            } => {
                warn!(transport = %transport, client = %client, reason = %reason, "Failed to send DNS reply");
            }
            QueryEvent::ListenerStarted { transport, addr } => {
                info!(transport = %transport, bind_address = %addr, "DNS listener started");
            }
            QueryEvent::ListenerFailed {
                transport,
                addr,
                reason,
            } => {
                error!(transport = %transport, bind_address = %addr, reason = %reason, "DNS listener failed");
            }
            QueryEvent::ListenerStopped { transport, addr } => {
                info!(transport = %transport, bind_address = %addr, "DNS listener stopped");
            }
        }
    }
}
