//! dnsfront infrastructure: the wire-level dispatcher, the UDP/TCP listener
//! pair with its lifecycle, an upstream forwarding resolver and the
//! `tracing` event sink.
pub mod dns;
pub mod events;
