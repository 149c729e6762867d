mod dns_resolver;
mod query_event_sink;

pub use dns_resolver::{DnsResolution, DnsResolver};
pub use query_event_sink::{NoopEventSink, QueryEventSink};

// Re-export for convenience
pub use dnsfront_domain::{DnsQuery, DomainError, QueryEvent};
