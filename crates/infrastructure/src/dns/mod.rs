pub mod forwarding;
pub mod listener;
pub mod server;
pub mod transport;

pub use forwarding::{ForwardingResolver, RecordTypeMapper};
pub use listener::ListenerStatus;
pub use server::{DnsServer, DnsServerHandler, ServerError, ServerOptions, ServerState, StopReport};
