mod mocks;

pub use mocks::{MockDnsResolver, RecordingEventSink};
