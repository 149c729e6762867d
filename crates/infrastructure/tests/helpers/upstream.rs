use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, SOA};
use hickory_proto::rr::{Name, RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy)]
pub enum UpstreamBehavior {
    Answer(Ipv4Addr),
    /// UDP replies carry TC and no answers; TCP replies answer.
    TruncateUdp(Ipv4Addr),
    NxDomain,
    ServFail,
    /// NOERROR, no answers, SOA in authority.
    NoData,
    /// Never replies.
    Silent,
}

/// Loopback upstream answering on UDP and TCP at the same port.
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn start(behavior: UpstreamBehavior) -> Self {
        let (udp, tcp) = loop {
            let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            let addr = udp.local_addr().unwrap();
            if let Ok(tcp) = TcpListener::bind(addr).await {
                break (udp, tcp);
            }
        };
        let addr = udp.local_addr().unwrap();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    received = udp.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = received {
                            if let Some(reply) = build_reply(&buf[..len], behavior, false) {
                                let _ = udp.send_to(&reply, peer).await;
                            }
                        }
                    }
                    accepted = tcp.accept() => {
                        if let Ok((mut stream, _)) = accepted {
                            tokio::spawn(async move {
                                let mut len_buf = [0u8; 2];
                                if stream.read_exact(&mut len_buf).await.is_err() {
                                    return;
                                }
                                let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                                if stream.read_exact(&mut query).await.is_err() {
                                    return;
                                }
                                if let Some(reply) = build_reply(&query, behavior, true) {
                                    let mut framed = (reply.len() as u16).to_be_bytes().to_vec();
                                    framed.extend_from_slice(&reply);
                                    let _ = stream.write_all(&framed).await;
                                }
                            });
                        }
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn build_reply(query: &[u8], behavior: UpstreamBehavior, over_tcp: bool) -> Option<Vec<u8>> {
    let request = Message::from_vec(query).ok()?;
    let question = request.queries().first()?.clone();
    let name = question.name().clone();

    let mut reply = Message::new();
    reply
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true)
        .add_query(question);

    match behavior {
        UpstreamBehavior::Answer(ip) => {
            reply.add_answer(Record::from_rdata(name, 60, RData::A(A(ip))));
        }
        UpstreamBehavior::TruncateUdp(ip) => {
            if over_tcp {
                reply.add_answer(Record::from_rdata(name, 60, RData::A(A(ip))));
            } else {
                reply.set_truncated(true);
            }
        }
        UpstreamBehavior::NxDomain => {
            reply.set_response_code(ResponseCode::NXDomain);
        }
        UpstreamBehavior::ServFail => {
            reply.set_response_code(ResponseCode::ServFail);
        }
        UpstreamBehavior::NoData => {
            let soa = SOA::new(
                Name::from_str("ns.example.test.").ok()?,
                Name::from_str("hostmaster.example.test.").ok()?,
                1,
                3600,
                600,
                86400,
                300,
            );
            reply.add_name_server(Record::from_rdata(
                Name::from_str("example.test.").ok()?,
                300,
                RData::SOA(soa),
            ));
        }
        UpstreamBehavior::Silent => return None,
    }

    reply.to_vec().ok()
}
