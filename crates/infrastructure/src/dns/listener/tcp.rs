use super::socket::create_tcp_listener;
use super::{ListenerContext, ListenerStatus};
use dnsfront_domain::{QueryEvent, Transport};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub(crate) struct TcpListener {
    addr: SocketAddr,
    idle_timeout: Duration,
    backlog: u32,
}

impl TcpListener {
    pub fn new(addr: SocketAddr, idle_timeout: Duration, backlog: u32) -> Self {
        Self {
            addr,
            idle_timeout,
            backlog,
        }
    }

    pub async fn run(self, ctx: ListenerContext, status: watch::Sender<ListenerStatus>) {
        let listener = match create_tcp_listener(self.addr, self.backlog) {
            Ok(listener) => listener,
            Err(e) => {
                ctx.listener_failed(Transport::Tcp, self.addr, e.to_string(), &status);
                return;
            }
        };
        let local_addr = listener.local_addr().unwrap_or(self.addr);

        info!(bind_address = %local_addr, idle_timeout_secs = self.idle_timeout.as_secs(), "TCP listener ready");
        ctx.record(QueryEvent::ListenerStarted {
            transport: Transport::Tcp,
            addr: local_addr,
        });
        status.send_replace(ListenerStatus::Listening(local_addr));

        loop {
            let accepted = tokio::select! {
                biased;
                _ = ctx.shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let conn_ctx = ctx.clone();
                    let idle_timeout = self.idle_timeout;
                    ctx.requests.spawn(async move {
                        serve_connection(stream, peer, conn_ctx, idle_timeout).await;
                    });
                }
                Err(e) if is_transient_accept_error(&e) => {
                    debug!(error = %e, "Transient TCP accept error");
                }
                Err(e) => {
                    ctx.listener_failed(Transport::Tcp, local_addr, e.to_string(), &status);
                    return;
                }
            }
        }

        info!(bind_address = %local_addr, "TCP listener stopped accepting");
        ctx.record(QueryEvent::ListenerStopped {
            transport: Transport::Tcp,
            addr: local_addr,
        });
        status.send_replace(ListenerStatus::Stopped);
    }
}

/// Serves length-prefixed messages on one connection, one at a time.
///
/// On shutdown an idle connection is closed at once; a connection with a
/// request in flight finishes writing that reply first. `abort` cuts both.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    ctx: ListenerContext,
    idle_timeout: Duration,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(client = %peer, error = %e, "Failed to set TCP_NODELAY");
    }

    loop {
        let message = tokio::select! {
            biased;
            _ = ctx.shutdown.cancelled() => break,
            read = tokio::time::timeout(idle_timeout, read_with_length_prefix(&mut stream)) => {
                match read {
                    Ok(Ok(Some(message))) => message,
                    Ok(Ok(None)) => break,
                    Ok(Err(e)) => {
                        debug!(client = %peer, error = %e, "Closing TCP connection after read error");
                        break;
                    }
                    Err(_) => {
                        debug!(client = %peer, "Closing idle TCP connection");
                        break;
                    }
                }
            }
        };

        let reply = tokio::select! {
            _ = ctx.abort.cancelled() => break,
            reply = ctx.handler.handle_raw(&message, Transport::Tcp, peer) => reply,
        };
        let Some(reply) = reply else {
            continue;
        };

        let written = tokio::select! {
            _ = ctx.abort.cancelled() => break,
            written = send_with_length_prefix(&mut stream, &reply) => written,
        };
        if let Err(e) = written {
            ctx.handler.report_send_failure(Transport::Tcp, peer, &e);
            break;
        }
    }

    if let Err(e) = stream.shutdown().await {
        debug!(client = %peer, error = %e, "TCP shutdown error");
    }
}

/// Reads one framed message. `Ok(None)` is a clean close between messages.
async fn read_with_length_prefix(stream: &mut TcpStream) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 2];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let message_len = u16::from_be_bytes(len_buf) as usize;
    if message_len == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "zero-length DNS message",
        ));
    }

    let mut message = vec![0u8; message_len];
    stream.read_exact(&mut message).await?;
    Ok(Some(message))
}

async fn send_with_length_prefix(stream: &mut TcpStream, message: &[u8]) -> io::Result<()> {
    let length = u16::try_from(message.len()).map_err(|_| {
        warn!(len = message.len(), "Reply exceeds TCP message size");
        io::Error::new(io::ErrorKind::InvalidInput, "reply too large for TCP framing")
    })?;

    let mut framed = Vec::with_capacity(message.len() + 2);
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message);
    stream.write_all(&framed).await?;
    stream.flush().await
}

fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
