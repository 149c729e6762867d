#![allow(dead_code)]

use async_trait::async_trait;
use dnsfront_application::ports::{DnsResolution, DnsResolver, QueryEventSink};
use dnsfront_domain::{DnsQuery, DomainError, QueryEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MockDnsResolver {
    responses: Arc<RwLock<HashMap<String, DnsResolution>>>,
    error_responses: Arc<RwLock<HashMap<String, DomainError>>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<DnsQuery>>>,
}

impl MockDnsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, domain: &str, resolution: DnsResolution) {
        self.responses
            .write()
            .await
            .insert(domain.to_string(), resolution);
    }

    pub async fn set_response_error(&self, domain: &str, error: DomainError) {
        self.error_responses
            .write()
            .await
            .insert(domain.to_string(), error);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_queries(&self) -> Vec<DnsQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn resolve(&self, query: &DnsQuery) -> Result<DnsResolution, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.clone());

        if let Some(err) = self.error_responses.read().await.get(query.domain.as_ref()) {
            return Err(err.clone());
        }

        self.responses
            .read()
            .await
            .get(query.domain.as_ref())
            .cloned()
            .ok_or_else(|| DomainError::Other(format!("No mock response for {}", query.domain)))
    }
}

#[derive(Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<QueryEvent>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<QueryEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl QueryEventSink for RecordingEventSink {
    fn record(&self, event: QueryEvent) {
        self.events.lock().unwrap().push(event);
    }
}
