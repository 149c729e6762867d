use dnsfront_application::ports::DnsResolution;
use dnsfront_domain::{QueryEvent, Transport};
use dnsfront_infrastructure::dns::{
    DnsServer, ListenerStatus, ServerError, ServerOptions, ServerState,
};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

mod helpers;
use helpers::*;

const REPLY_WAIT: Duration = Duration::from_secs(2);

async fn started_server(resolver: &MockDnsResolver, events: &RecordingEventSink, options: ServerOptions) -> (DnsServer, SocketAddr) {
    let mut server = DnsServer::new(handler_with(resolver, events), options);
    let addr = loopback(free_port());
    server.start(addr).unwrap();
    assert!(server.listening_addr(Transport::Udp).await.is_some());
    assert!(server.listening_addr(Transport::Tcp).await.is_some());
    (server, addr)
}

async fn udp_exchange(server: SocketAddr, request: &[u8]) -> Message {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.send_to(request, server).await.unwrap();
    let mut buf = vec![0u8; 4096];
    let (len, _) = tokio::time::timeout(REPLY_WAIT, socket.recv_from(&mut buf))
        .await
        .expect("no UDP reply")
        .unwrap();
    Message::from_vec(&buf[..len]).unwrap()
}

async fn tcp_send(stream: &mut TcpStream, request: &[u8]) {
    let mut framed = (request.len() as u16).to_be_bytes().to_vec();
    framed.extend_from_slice(request);
    stream.write_all(&framed).await.unwrap();
}

async fn tcp_recv(stream: &mut TcpStream) -> Message {
    let mut len_buf = [0u8; 2];
    tokio::time::timeout(REPLY_WAIT, stream.read_exact(&mut len_buf))
        .await
        .expect("no TCP reply")
        .unwrap();
    let mut reply = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut reply).await.unwrap();
    Message::from_vec(&reply).unwrap()
}

#[tokio::test]
async fn test_udp_query_is_answered() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();
    resolver
        .set_response("udp.example.test.", a_resolution("udp.example.test.", Ipv4Addr::new(192, 0, 2, 7)))
        .await;
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;

    let reply = udp_exchange(addr, &query_bytes(0x0101, "udp.example.test.", RecordType::A)).await;

    assert_eq!(reply.id(), 0x0101);
    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert_eq!(reply.answers().len(), 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_tcp_connection_serves_several_queries() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();
    resolver
        .set_response("tcp.example.test.", a_resolution("tcp.example.test.", Ipv4Addr::new(192, 0, 2, 8)))
        .await;
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    for id in [10u16, 11, 12] {
        tcp_send(&mut stream, &query_bytes(id, "tcp.example.test.", RecordType::A)).await;
        let reply = tcp_recv(&mut stream).await;
        assert_eq!(reply.id(), id);
        assert_eq!(reply.answers().len(), 1);
    }

    let received = events
        .events()
        .iter()
        .filter(|e| matches!(e, QueryEvent::Received { transport: Transport::Tcp, .. }))
        .count();
    assert_eq!(received, 3);

    drop(stream);
    server.stop().await.unwrap();
}

fn answered_ip(reply: &Message) -> Option<Ipv4Addr> {
    reply.answers().iter().find_map(|r| match r.data() {
        Some(RData::A(a)) => Some(a.0),
        _ => None,
    })
}

fn host(i: u8) -> (String, Ipv4Addr) {
    (format!("host{}.example.test.", i), Ipv4Addr::new(192, 0, 2, i))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replies_carry_their_own_answers() {
    let resolver = MockDnsResolver::new().with_delay(Duration::from_millis(50));
    let events = RecordingEventSink::new();
    for i in 1..=30 {
        let (name, ip) = host(i);
        resolver.set_response(&name, a_resolution(&name, ip)).await;
    }
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;
    let started = Instant::now();

    // Hosts 21..=30 go over TCP, one connection each.
    let tcp_clients: Vec<_> = (21..=30u8)
        .map(|i| {
            tokio::spawn(async move {
                let (name, _) = host(i);
                let mut stream = TcpStream::connect(addr).await.unwrap();
                tcp_send(&mut stream, &query_bytes(u16::from(i), &name, RecordType::A)).await;
                tcp_recv(&mut stream).await
            })
        })
        .collect();

    // Hosts 1..=20 go over UDP from one socket.
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for i in 1..=20u8 {
        let (name, _) = host(i);
        socket
            .send_to(&query_bytes(u16::from(i), &name, RecordType::A), addr)
            .await
            .unwrap();
    }

    let mut seen = HashSet::new();
    let mut buf = vec![0u8; 4096];
    while seen.len() < 20 {
        let (len, _) = tokio::time::timeout(REPLY_WAIT, socket.recv_from(&mut buf))
            .await
            .expect("missing UDP replies")
            .unwrap();
        let reply = Message::from_vec(&buf[..len]).unwrap();
        let (name, ip) = host(reply.id() as u8);
        assert_eq!(reply.queries()[0].name().to_string(), name);
        assert_eq!(answered_ip(&reply), Some(ip), "UDP reply {} carries another answer", reply.id());
        seen.insert(reply.id());
    }

    for client in tcp_clients {
        let reply = client.await.unwrap();
        let (name, ip) = host(reply.id() as u8);
        assert_eq!(reply.queries()[0].name().to_string(), name);
        assert_eq!(answered_ip(&reply), Some(ip), "TCP reply {} carries another answer", reply.id());
    }

    // Requests overlap instead of running one after another.
    assert!(started.elapsed() < Duration::from_millis(50 * 30));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_closes_both_listeners() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();
    resolver
        .set_response("example.test.", a_resolution("example.test.", Ipv4Addr::new(192, 0, 2, 1)))
        .await;
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;

    let report = server.stop().await.unwrap();
    assert!(report.drained);
    assert_eq!(report.abandoned, 0);
    assert_eq!(server.state(), ServerState::Stopped);
    assert_eq!(server.listener_status(Transport::Udp), None);

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(&query_bytes(1, "example.test.", RecordType::A), addr)
        .await
        .unwrap();
    let mut buf = vec![0u8; 512];
    let late = tokio::time::timeout(Duration::from_millis(300), socket.recv_from(&mut buf)).await;
    assert!(!matches!(late, Ok(Ok(_))), "stopped server must not answer");

    assert!(TcpStream::connect(addr).await.is_err());

    let stopped = events
        .events()
        .iter()
        .filter(|e| matches!(e, QueryEvent::ListenerStopped { .. }))
        .count();
    assert_eq!(stopped, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_in_flight_request_is_answered_during_stop() {
    let resolver = MockDnsResolver::new().with_delay(Duration::from_millis(300));
    let events = RecordingEventSink::new();
    resolver
        .set_response("slow.example.test.", a_resolution("slow.example.test.", Ipv4Addr::new(192, 0, 2, 2)))
        .await;
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;

    let client = tokio::spawn(async move {
        udp_exchange(addr, &query_bytes(0x0202, "slow.example.test.", RecordType::A)).await
    });

    while server.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let report = server.stop().await.unwrap();

    assert!(report.drained);
    let reply = client.await.unwrap();
    assert_eq!(reply.id(), 0x0202);
    assert_eq!(reply.answers().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drain_timeout_aborts_stuck_requests() {
    let resolver = MockDnsResolver::new().with_delay(Duration::from_secs(30));
    let events = RecordingEventSink::new();
    let options = ServerOptions::default().with_drain_timeout(Duration::from_millis(100));
    let (mut server, addr) = started_server(&resolver, &events, options).await;

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(&query_bytes(3, "stuck.example.test.", RecordType::A), addr)
        .await
        .unwrap();
    while server.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let started = Instant::now();
    let report = server.stop().await.unwrap();

    assert!(!report.drained);
    assert_eq!(report.abandoned, 1);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.in_flight(), 0);
}

#[tokio::test]
async fn test_idle_tcp_connection_does_not_delay_stop() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;

    let mut idle = TcpStream::connect(addr).await.unwrap();
    while server.in_flight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let report = server.stop().await.unwrap();
    assert!(report.drained);

    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(REPLY_WAIT, idle.read(&mut buf)).await.unwrap();
    assert!(matches!(read, Ok(0) | Err(_)), "server side should close the idle connection");
}

#[tokio::test]
async fn test_udp_bind_failure_leaves_tcp_running() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();
    resolver
        .set_response("example.test.", a_resolution("example.test.", Ipv4Addr::new(192, 0, 2, 1)))
        .await;

    let port = free_port();
    let _occupied = std::net::UdpSocket::bind(("127.0.0.1", port)).unwrap();
    let addr = loopback(port);

    let mut server = DnsServer::new(handler_with(&resolver, &events), ServerOptions::default());
    server.start(addr).unwrap();

    assert_eq!(server.listening_addr(Transport::Udp).await, None);
    assert_eq!(server.listener_status(Transport::Udp), Some(ListenerStatus::Failed));
    assert_eq!(server.listening_addr(Transport::Tcp).await, Some(addr));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    tcp_send(&mut stream, &query_bytes(4, "example.test.", RecordType::A)).await;
    assert_eq!(tcp_recv(&mut stream).await.id(), 4);

    assert!(events.events().iter().any(|e| matches!(
        e,
        QueryEvent::ListenerFailed { transport: Transport::Udp, .. }
    )));

    drop(stream);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_lifecycle_rejects_invalid_transitions() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();
    let mut server = DnsServer::new(handler_with(&resolver, &events), ServerOptions::default());

    assert_eq!(server.state(), ServerState::Created);
    assert_eq!(
        server.stop().await.unwrap_err(),
        ServerError::InvalidState { operation: "stop", state: ServerState::Created }
    );

    let addr = loopback(free_port());
    server.start(addr).unwrap();
    assert_eq!(server.state(), ServerState::Started);
    assert_eq!(server.address(), Some(addr));
    assert!(matches!(
        server.start(addr),
        Err(ServerError::InvalidState { operation: "start", state: ServerState::Started })
    ));

    server.stop().await.unwrap();
    assert!(server.stop().await.is_err());
    assert!(server.start(addr).is_err());
}

#[tokio::test]
async fn test_udp_send_failure_is_recorded_and_listener_keeps_serving() {
    let resolver = MockDnsResolver::new();
    let events = RecordingEventSink::new();

    // Encodes to just under 64 KiB, more than a UDP datagram over IPv4 can carry.
    let owner = Name::from_str("big.example.test.").unwrap();
    let records = (0..400)
        .map(|i| {
            let text = format!("{:03}{}", i, "x".repeat(247));
            Record::from_rdata(owner.clone(), 300, RData::TXT(TXT::new(vec![text])))
        })
        .collect();
    resolver
        .set_response("big.example.test.", DnsResolution::new(records))
        .await;
    resolver
        .set_response("small.example.test.", a_resolution("small.example.test.", Ipv4Addr::new(192, 0, 2, 11)))
        .await;
    let (mut server, addr) = started_server(&resolver, &events, ServerOptions::default()).await;

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(&query_bytes(0x0B16, "big.example.test.", RecordType::TXT), addr)
        .await
        .unwrap();

    let deadline = Instant::now() + REPLY_WAIT;
    let reply_failed = loop {
        let failed = events.events().into_iter().find(|e| matches!(e, QueryEvent::ReplyFailed { .. }));
        if failed.is_some() || Instant::now() > deadline {
            break failed;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    match reply_failed {
        Some(QueryEvent::ReplyFailed { transport, client, .. }) => {
            assert_eq!(transport, Transport::Udp);
            assert_eq!(client, socket.local_addr().unwrap());
        }
        other => panic!("expected a ReplyFailed event, got {:?}", other),
    }

    assert_eq!(server.listener_status(Transport::Udp), Some(ListenerStatus::Listening(addr)));
    let reply = udp_exchange(addr, &query_bytes(0x0C17, "small.example.test.", RecordType::A)).await;
    assert_eq!(reply.id(), 0x0C17);
    assert_eq!(answered_ip(&reply), Some(Ipv4Addr::new(192, 0, 2, 11)));

    server.stop().await.unwrap();
}
