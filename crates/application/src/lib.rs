//! dnsfront application layer: the ports the dispatcher depends on and the
//! query-handling use case that drives them.
pub mod ports;
pub mod use_cases;
