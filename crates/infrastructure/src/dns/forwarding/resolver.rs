use super::message_builder::MessageBuilder;
use super::response_parser::ResponseParser;
use crate::dns::transport::tcp::TcpTransport;
use crate::dns::transport::udp::UdpTransport;
use crate::dns::transport::DnsTransport;
use async_trait::async_trait;
use dnsfront_application::ports::{DnsResolution, DnsResolver};
use dnsfront_domain::config::DnsConfig;
use dnsfront_domain::{ConfigError, DnsQuery, DomainError};
use hickory_proto::op::{Message, ResponseCode};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Forwards queries to a fixed list of upstream servers.
///
/// Upstreams are tried in order. Each gets one UDP attempt, retried over TCP
/// when the answer is truncated. Transport failures and SERVFAIL, REFUSED or
/// NOTIMP answers move on to the next upstream; any other answer is final.
pub struct ForwardingResolver {
    upstreams: Vec<SocketAddr>,
    timeout: Duration,
}

impl ForwardingResolver {
    pub fn new(upstreams: Vec<SocketAddr>, timeout: Duration) -> Result<Self, DomainError> {
        if upstreams.is_empty() {
            return Err(DomainError::Other(
                "No upstream servers configured".to_string(),
            ));
        }
        Ok(Self { upstreams, timeout })
    }

    pub fn from_config(config: &DnsConfig) -> Result<Self, ConfigError> {
        let upstreams = config.upstream_addrs()?;
        Self::new(upstreams, Duration::from_millis(config.query_timeout_ms))
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    pub fn upstreams(&self) -> &[SocketAddr] {
        &self.upstreams
    }

    async fn exchange(
        &self,
        transport: &dyn DnsTransport,
        server: SocketAddr,
        query_id: u16,
        query_bytes: &[u8],
    ) -> Result<Message, DomainError> {
        let response = transport.send(query_bytes, self.timeout).await?;
        let message = ResponseParser::parse(&response.bytes)?;

        if message.id() != query_id {
            return Err(DomainError::Other(format!(
                "Response id {} from {} via {} does not match query id {}",
                message.id(),
                server,
                response.protocol_used,
                query_id
            )));
        }
        Ok(message)
    }

    async fn query_upstream(
        &self,
        server: SocketAddr,
        query_id: u16,
        query_bytes: &[u8],
    ) -> Result<Message, DomainError> {
        let message = self
            .exchange(&UdpTransport::new(server), server, query_id, query_bytes)
            .await?;

        if !message.truncated() {
            return Ok(message);
        }

        debug!(server = %server, "Truncated UDP response, retrying over TCP");
        self.exchange(&TcpTransport::new(server), server, query_id, query_bytes)
            .await
    }
}

fn is_server_failure(rcode: ResponseCode) -> bool {
    matches!(
        rcode,
        ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
    )
}

#[async_trait]
impl DnsResolver for ForwardingResolver {
    async fn resolve(&self, query: &DnsQuery) -> Result<DnsResolution, DomainError> {
        let (query_id, query_bytes) = MessageBuilder::build_query(query)?;
        let mut last_error = None;

        for &server in &self.upstreams {
            match self.query_upstream(server, query_id, &query_bytes).await {
                Ok(message) if is_server_failure(message.response_code()) => {
                    let status = ResponseParser::rcode_to_status(message.response_code());
                    warn!(server = %server, domain = %query.domain, status, "Upstream failed to answer");
                    last_error = Some(DomainError::Other(format!(
                        "Upstream {} answered {}",
                        server, status
                    )));
                }
                Ok(message) => {
                    debug!(server = %server, domain = %query.domain, "Upstream answered");
                    return ResponseParser::into_resolution(message);
                }
                Err(e) => {
                    warn!(server = %server, domain = %query.domain, error = %e, "Upstream query failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DomainError::Other("No upstream servers configured".to_string())))
    }
}
