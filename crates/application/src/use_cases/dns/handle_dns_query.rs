use crate::ports::{DnsResolution, DnsResolver, QueryEventSink};
use dnsfront_domain::{DnsRequest, DomainError, QueryEvent};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub struct HandleDnsQueryUseCase {
    resolver: Arc<dyn DnsResolver>,
    events: Arc<dyn QueryEventSink>,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<dyn DnsResolver>, events: Arc<dyn QueryEventSink>) -> Self {
        Self { resolver, events }
    }

    pub fn events(&self) -> &Arc<dyn QueryEventSink> {
        &self.events
    }

    /// Records the query, asks the resolver, and records the failure if any.
    ///
    /// No retry and no timeout: a stalled resolver stalls this request only.
    pub async fn execute(&self, request: &DnsRequest) -> Result<DnsResolution, DomainError> {
        let query = &request.query;

        self.events.record(QueryEvent::Received {
            domain: Arc::clone(&query.domain),
            record_type: query.record_type,
            client_ip: request.client_ip,
            transport: request.transport,
        });

        let start = Instant::now();
        let result = self.resolver.resolve(query).await;
        let elapsed_micros = start.elapsed().as_micros() as u64;

        match &result {
            Ok(resolution) => {
                debug!(
                    domain = %query.domain,
                    record_type = %query.record_type,
                    answers = resolution.answers.len(),
                    rcode = %resolution.response_code,
                    elapsed_micros,
                    "Resolution succeeded"
                );
            }
            Err(e) => {
                self.events.record(QueryEvent::ResolutionFailed {
                    domain: Arc::clone(&query.domain),
                    record_type: query.record_type,
                    error: e.clone(),
                });
            }
        }

        result
    }
}
