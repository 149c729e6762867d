pub mod dns;
mod signal;

pub use dns::run_dns_server;
