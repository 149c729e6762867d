use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;

const SOCKET_BUFFER_SIZE: usize = 512 * 1024;

fn domain_for(socket_addr: SocketAddr) -> Domain {
    if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    }
}

/// Must be called from within a Tokio runtime.
pub(crate) fn create_udp_socket(socket_addr: SocketAddr) -> io::Result<tokio::net::UdpSocket> {
    let socket = Socket::new(domain_for(socket_addr), Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(SOCKET_BUFFER_SIZE)?;
    socket.set_send_buffer_size(SOCKET_BUFFER_SIZE)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    tokio::net::UdpSocket::from_std(std_socket)
}

/// Must be called from within a Tokio runtime.
pub(crate) fn create_tcp_listener(
    socket_addr: SocketAddr,
    backlog: u32,
) -> io::Result<tokio::net::TcpListener> {
    let socket = Socket::new(domain_for(socket_addr), Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(backlog.min(i32::MAX as u32) as i32)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    tokio::net::TcpListener::from_std(std_listener)
}
