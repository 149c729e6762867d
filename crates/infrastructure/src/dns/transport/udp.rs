//! UDP transport for upstream queries (RFC 1035 §4.2.1).
//!
//! Messages are sent unframed. A response with TC set should be retried over TCP.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use dnsfront_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Matches the EDNS payload advertised in upstream queries.
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let socket = UdpSocket::bind(self.bind_addr())
            .await
            .map_err(|e| DomainError::Other(format!("Failed to bind UDP socket: {}", e)))?;

        // A connected socket drops datagrams from any other source.
        socket.connect(self.server_addr).await.map_err(|e| {
            DomainError::Other(format!(
                "Failed to connect UDP socket to {}: {}",
                self.server_addr, e
            ))
        })?;

        let bytes_sent = socket.send(message_bytes).await.map_err(|e| {
            DomainError::Other(format!(
                "Failed to send UDP query to {}: {}",
                self.server_addr, e
            ))
        })?;

        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let bytes_received = tokio::time::timeout(timeout, socket.recv(&mut recv_buf))
            .await
            .map_err(|_| {
                DomainError::Other(format!(
                    "Timeout waiting for UDP response from {}",
                    self.server_addr
                ))
            })?
            .map_err(|e| {
                DomainError::Other(format!(
                    "Failed to receive UDP response from {}: {}",
                    self.server_addr, e
                ))
            })?;

        if bytes_received == MAX_UDP_RESPONSE_SIZE {
            warn!(server = %self.server_addr, "UDP response filled the receive buffer");
        }
        recv_buf.truncate(bytes_received);

        debug!(server = %self.server_addr, bytes_received, "UDP response received");

        Ok(TransportResponse {
            bytes: recv_buf,
            protocol_used: "UDP",
        })
    }
}
