use super::socket::create_udp_socket;
use super::{ListenerContext, ListenerStatus};
use dnsfront_domain::{QueryEvent, Transport};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Consecutive receive errors after which the socket is considered dead.
const MAX_CONSECUTIVE_RECV_ERRORS: u32 = 32;

pub(crate) struct UdpListener {
    addr: SocketAddr,
    max_message_size: usize,
}

impl UdpListener {
    pub fn new(addr: SocketAddr, max_message_size: usize) -> Self {
        Self {
            addr,
            max_message_size,
        }
    }

    pub async fn run(self, ctx: ListenerContext, status: watch::Sender<ListenerStatus>) {
        let socket = match create_udp_socket(self.addr) {
            Ok(socket) => Arc::new(socket),
            Err(e) => {
                ctx.listener_failed(Transport::Udp, self.addr, e.to_string(), &status);
                return;
            }
        };
        let local_addr = socket.local_addr().unwrap_or(self.addr);

        info!(bind_address = %local_addr, max_message_size = self.max_message_size, "UDP listener ready");
        ctx.record(QueryEvent::ListenerStarted {
            transport: Transport::Udp,
            addr: local_addr,
        });
        status.send_replace(ListenerStatus::Listening(local_addr));

        let mut recv_buf = vec![0u8; self.max_message_size];
        let mut consecutive_errors = 0u32;

        loop {
            let received = tokio::select! {
                biased;
                _ = ctx.shutdown.cancelled() => break,
                received = socket.recv_from(&mut recv_buf) => received,
            };

            match received {
                Ok((len, from)) => {
                    consecutive_errors = 0;
                    let datagram = recv_buf[..len].to_vec();
                    spawn_request(&ctx, Arc::clone(&socket), datagram, from);
                }
                Err(e) if is_transient(&e) => {
                    debug!(error = %e, "Transient UDP receive error");
                }
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(error = %e, consecutive_errors, "UDP receive error");
                    if consecutive_errors >= MAX_CONSECUTIVE_RECV_ERRORS {
                        ctx.listener_failed(Transport::Udp, local_addr, e.to_string(), &status);
                        return;
                    }
                }
            }
        }

        info!(bind_address = %local_addr, "UDP listener stopped accepting");
        ctx.record(QueryEvent::ListenerStopped {
            transport: Transport::Udp,
            addr: local_addr,
        });
        status.send_replace(ListenerStatus::Stopped);
    }
}

fn spawn_request(ctx: &ListenerContext, socket: Arc<UdpSocket>, datagram: Vec<u8>, from: SocketAddr) {
    let handler = ctx.handler.clone();
    let abort = ctx.abort.clone();

    ctx.requests.spawn(async move {
        tokio::select! {
            _ = abort.cancelled() => {
                debug!(client = %from, "UDP request abandoned at shutdown");
            }
            _ = async {
                if let Some(reply) = handler.handle_raw(&datagram, Transport::Udp, from).await {
                    if let Err(e) = socket.send_to(&reply, from).await {
                        handler.report_send_failure(Transport::Udp, from, &e);
                    }
                }
            } => {}
        }
    });
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
    )
}
