use serde::{Deserialize, Serialize};

/// Largest DNS message that fits a two-byte length or a UDP datagram.
pub const MAX_DNS_MESSAGE_SIZE: usize = 65535;

/// Smallest UDP payload every DNS implementation must accept (RFC 1035).
pub const MIN_UDP_MESSAGE_SIZE: usize = 512;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    /// Receive buffer for the UDP listener; sized for EDNS payloads.
    #[serde(default = "default_udp_max_message_size")]
    pub udp_max_message_size: usize,

    /// How long a TCP connection may sit idle between two messages.
    #[serde(default = "default_tcp_idle_timeout_secs")]
    pub tcp_idle_timeout_secs: u64,

    #[serde(default = "default_tcp_backlog")]
    pub tcp_backlog: u32,
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.dns_port)
        } else {
            format!("{}:{}", self.bind_address, self.dns_port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
            udp_max_message_size: default_udp_max_message_size(),
            tcp_idle_timeout_secs: default_tcp_idle_timeout_secs(),
            tcp_backlog: default_tcp_backlog(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dns_port() -> u16 {
    5053
}

fn default_udp_max_message_size() -> usize {
    MAX_DNS_MESSAGE_SIZE
}

fn default_tcp_idle_timeout_secs() -> u64 {
    10
}

fn default_tcp_backlog() -> u32 {
    1024
}
