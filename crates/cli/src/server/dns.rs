use super::signal::shutdown_signal;
use dnsfront_domain::{Config, Transport};
use dnsfront_infrastructure::dns::{DnsServer, DnsServerHandler, ServerOptions};
use std::net::SocketAddr;
use tracing::{error, info, warn};

/// Runs the DNS listeners until a shutdown signal arrives, then drains them.
///
/// Fails only when neither listener could bind.
pub async fn run_dns_server(config: &Config, handler: DnsServerHandler) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = config.server.listen_address().parse()?;

    let mut server = DnsServer::new(handler, ServerOptions::from_config(config));
    server.start(socket_addr)?;

    let udp = server.listening_addr(Transport::Udp).await;
    let tcp = server.listening_addr(Transport::Tcp).await;
    if udp.is_none() && tcp.is_none() {
        server.stop().await?;
        anyhow::bail!("DNS server could not bind {} on UDP or TCP", socket_addr);
    }
    if udp.is_none() || tcp.is_none() {
        warn!(udp = ?udp, tcp = ?tcp, "DNS server running on one transport only");
    }

    info!(bind_address = %socket_addr, "DNS server ready");

    shutdown_signal().await;

    let report = server.stop().await?;
    if report.drained {
        info!("All in-flight queries completed");
    } else {
        error!(abandoned = report.abandoned, "Shutdown abandoned in-flight queries");
    }
    Ok(())
}
