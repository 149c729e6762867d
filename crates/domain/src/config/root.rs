use serde::{Deserialize, Serialize};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::{ServerConfig, MAX_DNS_MESSAGE_SIZE, MIN_UDP_MESSAGE_SIZE};
use super::shutdown::ShutdownConfig;

const LOCAL_CONFIG_PATH: &str = "dnsfront.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/dnsfront/config.toml";

/// Main configuration structure for dnsfront
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (address, port, transport limits)
    #[serde(default)]
    pub server: ServerConfig,

    /// Resolver configuration
    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dnsfront.toml in current directory
    /// 3. /etc/dnsfront/config.toml
    /// 4. Default configuration
    ///
    /// Command-line overrides are applied on top, then the result is validated.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if !overrides.upstream_servers.is_empty() {
            self.dns.upstream_servers = overrides.upstream_servers;
        }
        if let Some(drain) = overrides.drain_timeout_ms {
            self.shutdown.drain_timeout_ms = drain;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if !(MIN_UDP_MESSAGE_SIZE..=MAX_DNS_MESSAGE_SIZE).contains(&self.server.udp_max_message_size)
        {
            return Err(ConfigError::Validation(format!(
                "udp_max_message_size must be between {} and {}",
                MIN_UDP_MESSAGE_SIZE, MAX_DNS_MESSAGE_SIZE
            )));
        }

        if self.dns.upstream_servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }
        self.dns.upstream_addrs()?;

        if self.dns.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "query_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.shutdown.drain_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "drain_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
    pub upstream_servers: Vec<String>,
    pub drain_timeout_ms: Option<u64>,
}
