use dnsfront_application::ports::{DnsResolver, QueryEventSink};
use dnsfront_application::use_cases::HandleDnsQueryUseCase;
use dnsfront_domain::Config;
use dnsfront_infrastructure::dns::{DnsServerHandler, ForwardingResolver};
use dnsfront_infrastructure::events::TracingEventSink;
use std::sync::Arc;
use tracing::info;

pub struct DnsServices {
    pub handler: DnsServerHandler,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let resolver = ForwardingResolver::from_config(&config.dns)?;
        info!(
            upstreams = ?resolver.upstreams(),
            query_timeout_ms = config.dns.query_timeout_ms,
            "Forwarding resolver configured"
        );

        let resolver: Arc<dyn DnsResolver> = Arc::new(resolver);
        let events: Arc<dyn QueryEventSink> = Arc::new(TracingEventSink::new());
        let use_case = Arc::new(HandleDnsQueryUseCase::new(resolver, events));

        Ok(Self {
            handler: DnsServerHandler::new(use_case),
        })
    }
}
