//! The UDP/TCP listener pair.
//!
//! Both listeners run as independent tasks that share one dispatcher and one
//! lifecycle: `shutdown` stops accepting new work, `abort` interrupts work
//! that outlived the drain timeout, and `requests` tracks everything in
//! flight.

mod socket;
mod tcp;
mod udp;

use crate::dns::server::DnsServerHandler;
use dnsfront_domain::{QueryEvent, Transport};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::error;

pub(crate) use tcp::TcpListener;
pub(crate) use udp::UdpListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    /// Task spawned, socket not bound yet.
    Pending,
    Listening(SocketAddr),
    /// Bind or accept failed; the listener is gone, its sibling is not affected.
    Failed,
    Stopped,
}

#[derive(Clone)]
pub(crate) struct ListenerContext {
    pub handler: DnsServerHandler,
    pub shutdown: CancellationToken,
    pub abort: CancellationToken,
    pub requests: TaskTracker,
}

impl ListenerContext {
    pub fn record(&self, event: QueryEvent) {
        self.handler.events().record(event);
    }

    /// Binding failed or the socket died; the sibling listener keeps going.
    pub fn listener_failed(
        &self,
        transport: Transport,
        addr: SocketAddr,
        reason: String,
        status: &watch::Sender<ListenerStatus>,
    ) {
        error!(%transport, addr = %addr, error = %reason, "DNS listener failed");
        self.record(QueryEvent::ListenerFailed {
            transport,
            addr,
            reason,
        });
        status.send_replace(ListenerStatus::Failed);
    }
}

/// Listener tuning taken from the server options.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListenerLimits {
    pub udp_max_message_size: usize,
    pub tcp_idle_timeout: Duration,
    pub tcp_backlog: u32,
}

pub(crate) struct ListenerHandle {
    pub transport: Transport,
    pub status: watch::Receiver<ListenerStatus>,
    pub task: JoinHandle<()>,
}

/// Spawns both listeners on `addr` and returns immediately.
pub(crate) fn spawn_pair(
    addr: SocketAddr,
    ctx: &ListenerContext,
    limits: ListenerLimits,
) -> [ListenerHandle; 2] {
    let (udp_tx, udp_rx) = watch::channel(ListenerStatus::Pending);
    let udp = UdpListener::new(addr, limits.udp_max_message_size);
    let udp_ctx = ctx.clone();
    let udp_task = tokio::spawn(async move { udp.run(udp_ctx, udp_tx).await });

    let (tcp_tx, tcp_rx) = watch::channel(ListenerStatus::Pending);
    let tcp = TcpListener::new(addr, limits.tcp_idle_timeout, limits.tcp_backlog);
    let tcp_ctx = ctx.clone();
    let tcp_task = tokio::spawn(async move { tcp.run(tcp_ctx, tcp_tx).await });

    [
        ListenerHandle {
            transport: Transport::Udp,
            status: udp_rx,
            task: udp_task,
        },
        ListenerHandle {
            transport: Transport::Tcp,
            status: tcp_rx,
            task: tcp_task,
        },
    ]
}
