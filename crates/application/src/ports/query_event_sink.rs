use dnsfront_domain::QueryEvent;

/// Observability port handed to the dispatcher and the listeners.
///
/// `record` is called on the request path and must not block.
pub trait QueryEventSink: Send + Sync {
    fn record(&self, event: QueryEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl QueryEventSink for NoopEventSink {
    fn record(&self, _event: QueryEvent) {}
}
