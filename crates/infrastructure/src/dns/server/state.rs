use std::fmt;
use thiserror::Error;

/// Lifecycle of a [`DnsServer`](super::DnsServer).
///
/// `Created → Started → Stopping → Stopped`; a stopped server is not restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Started,
    Stopping,
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Created => "created",
            ServerState::Started => "started",
            ServerState::Stopping => "stopping",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("Cannot {operation} a server that is {state}")]
    InvalidState {
        operation: &'static str,
        state: ServerState,
    },
}
