//! dnsfront domain layer: queries, resolver failure kinds, observability
//! events and configuration. Free of any wire-format dependency.
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod query_event;

pub use config::{CliOverrides, Config, ConfigError};
pub use dns_query::{DnsQuery, DnsRequest, QUESTIONS_ANSWERED};
pub use dns_record::RecordType;
pub use errors::DomainError;
pub use query_event::{QueryEvent, Transport};
