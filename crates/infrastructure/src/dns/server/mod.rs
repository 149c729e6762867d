//! Dispatcher and server lifecycle.

mod handler;
pub mod reply;
mod state;

pub use handler::DnsServerHandler;
pub use state::{ServerError, ServerState};

use crate::dns::listener::{self, ListenerContext, ListenerHandle, ListenerLimits, ListenerStatus};
use dnsfront_domain::{Config, Transport};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub udp_max_message_size: usize,
    pub tcp_idle_timeout: Duration,
    pub tcp_backlog: u32,
    /// Upper bound on how long [`DnsServer::stop`] waits for in-flight requests.
    pub drain_timeout: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            udp_max_message_size: config.server.udp_max_message_size,
            tcp_idle_timeout: Duration::from_secs(config.server.tcp_idle_timeout_secs),
            tcp_backlog: config.server.tcp_backlog,
            drain_timeout: Duration::from_millis(config.shutdown.drain_timeout_ms),
        }
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of [`DnsServer::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    /// Every in-flight request finished within the drain timeout.
    pub drained: bool,
    /// Requests or connections cut off when the drain timeout expired.
    pub abandoned: usize,
}

struct ListenerSet {
    addr: SocketAddr,
    shutdown: CancellationToken,
    abort: CancellationToken,
    requests: TaskTracker,
    listeners: [ListenerHandle; 2],
}

impl ListenerSet {
    fn listener(&self, transport: Transport) -> Option<&ListenerHandle> {
        self.listeners.iter().find(|l| l.transport == transport)
    }
}

/// Runs the UDP and TCP listeners around one shared [`DnsServerHandler`].
pub struct DnsServer {
    handler: DnsServerHandler,
    options: ServerOptions,
    state: ServerState,
    running: Option<ListenerSet>,
}

impl DnsServer {
    pub fn new(handler: DnsServerHandler, options: ServerOptions) -> Self {
        Self {
            handler,
            options,
            state: ServerState::Created,
            running: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|set| set.addr)
    }

    /// Launches both listeners and returns without waiting for them to bind.
    ///
    /// Bind failures are not returned here; they show up as
    /// `ListenerFailed` events and as [`ListenerStatus::Failed`]. Must be
    /// called from within a Tokio runtime.
    pub fn start(&mut self, addr: SocketAddr) -> Result<(), ServerError> {
        if self.state != ServerState::Created {
            return Err(ServerError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        info!(bind_address = %addr, "Starting DNS server (UDP + TCP)");

        let ctx = ListenerContext {
            handler: self.handler.clone(),
            shutdown: CancellationToken::new(),
            abort: CancellationToken::new(),
            requests: TaskTracker::new(),
        };
        let limits = ListenerLimits {
            udp_max_message_size: self.options.udp_max_message_size,
            tcp_idle_timeout: self.options.tcp_idle_timeout,
            tcp_backlog: self.options.tcp_backlog,
        };
        let listeners = listener::spawn_pair(addr, &ctx, limits);

        self.running = Some(ListenerSet {
            addr,
            shutdown: ctx.shutdown,
            abort: ctx.abort,
            requests: ctx.requests,
            listeners,
        });
        self.state = ServerState::Started;
        Ok(())
    }

    /// Current status of one listener, `None` before `start`.
    pub fn listener_status(&self, transport: Transport) -> Option<ListenerStatus> {
        let handle = self.running.as_ref()?.listener(transport)?;
        let status = *handle.status.borrow();
        Some(status)
    }

    /// Waits until the listener has either bound or failed.
    ///
    /// Returns the bound address, or `None` if the listener failed.
    pub async fn listening_addr(&self, transport: Transport) -> Option<SocketAddr> {
        let mut status = self.running.as_ref()?.listener(transport)?.status.clone();
        let settled = *status
            .wait_for(|s| *s != ListenerStatus::Pending)
            .await
            .ok()?;
        match settled {
            ListenerStatus::Listening(addr) => Some(addr),
            _ => None,
        }
    }

    /// Requests and TCP connections currently being served.
    pub fn in_flight(&self) -> usize {
        self.running.as_ref().map_or(0, |set| set.requests.len())
    }

    /// Stops both listeners and drains in-flight work.
    ///
    /// New datagrams and connections are refused as soon as this is called.
    /// Work still running after the drain timeout is aborted, so the call
    /// returns within roughly that timeout.
    pub async fn stop(&mut self) -> Result<StopReport, ServerError> {
        let set = match (self.state, self.running.take()) {
            (ServerState::Started, Some(set)) => set,
            (state, running) => {
                self.running = running;
                return Err(ServerError::InvalidState {
                    operation: "stop",
                    state,
                });
            }
        };

        self.state = ServerState::Stopping;
        info!(in_flight = set.requests.len(), "Stopping DNS server");

        set.shutdown.cancel();
        for listener in set.listeners {
            if let Err(e) = listener.task.await {
                error!(transport = %listener.transport, error = %e, "DNS listener task ended abnormally");
            }
        }

        set.requests.close();
        let drained = tokio::time::timeout(self.options.drain_timeout, set.requests.wait())
            .await
            .is_ok();

        let mut abandoned = 0;
        if !drained {
            abandoned = set.requests.len();
            warn!(
                abandoned,
                drain_timeout_ms = self.options.drain_timeout.as_millis() as u64,
                "Drain timeout expired, aborting in-flight requests"
            );
            set.abort.cancel();
            set.requests.wait().await;
        }

        self.state = ServerState::Stopped;
        info!(bind_address = %set.addr, drained, "DNS server stopped");
        Ok(StopReport { drained, abandoned })
    }
}

impl Drop for DnsServer {
    fn drop(&mut self) {
        if let Some(set) = self.running.take() {
            set.shutdown.cancel();
            set.abort.cancel();
        }
    }
}
