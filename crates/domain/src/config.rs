pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod shutdown;

pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use shutdown::ShutdownConfig;
