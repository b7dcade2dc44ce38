//! Loopback name servers and message builders for the integration tests.
#![allow(dead_code)]

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use domain_send::net::client::tcp::{read_framed, write_framed};

//------------ Logging -------------------------------------------------------

pub fn init_logging() {
    // Initialize tracing based logging. Override with env var RUST_LOG, e.g.
    // RUST_LOG=trace.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}

//------------ Messages ------------------------------------------------------

pub const A: u16 = 1;
pub const SOA: u16 = 6;
pub const AXFR: u16 = 252;

/// Creates a query for `example.com` with the given ID and type.
pub fn mk_query(id: u16, qtype: u16) -> Vec<u8> {
    let mut res = Vec::new();
    res.extend_from_slice(&id.to_be_bytes());
    res.extend_from_slice(&[0x01, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
    res.extend_from_slice(b"\x07example\x03com\x00");
    res.extend_from_slice(&qtype.to_be_bytes());
    res.extend_from_slice(&[0, 1]);
    res
}

/// Creates a reply to `query` with answer records of the given types.
///
/// The question is copied from the query. Answer owner names are
/// compressed to point at the question name. Each record carries
/// `rdlen` octets of zeros as its data.
pub fn mk_reply(
    query: &[u8],
    types: &[u16],
    rdlen: u16,
    tc: bool,
) -> Vec<u8> {
    let mut res = query.to_vec();
    res[2] |= 0x80 | if tc { 0x02 } else { 0 };
    res[6..8].copy_from_slice(&(types.len() as u16).to_be_bytes());
    for rtype in types {
        res.extend_from_slice(&[0xc0, 12]);
        res.extend_from_slice(&rtype.to_be_bytes());
        res.extend_from_slice(&[0, 1, 0, 0, 0x0e, 0x10]);
        res.extend_from_slice(&rdlen.to_be_bytes());
        res.resize(res.len() + usize::from(rdlen), 0);
    }
    res
}

//------------ UDP servers ---------------------------------------------------

/// A UDP server that never answers.
///
/// The socket stays bound for as long as the value is alive.
pub struct SilentServer {
    sock: UdpSocket,
}

impl SilentServer {
    pub fn new() -> Self {
        SilentServer {
            sock: UdpSocket::bind("127.0.0.1:0").unwrap(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.sock.local_addr().unwrap()
    }
}

/// Runs a UDP server answering `count` queries via `answer`.
pub fn udp_server<F>(
    sock: UdpSocket,
    count: usize,
    mut answer: F,
) -> JoinHandle<()>
where
    F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = vec![0u8; 65535];
        for _ in 0..count {
            let (len, peer) = sock.recv_from(&mut buf).unwrap();
            let reply = answer(&buf[..len]);
            sock.send_to(&reply, peer).unwrap();
        }
    })
}

/// Binds a UDP socket and a TCP listener to the same loopback port.
pub fn bind_both() -> (UdpSocket, TcpListener) {
    for _ in 0..20 {
        let udp = UdpSocket::bind("127.0.0.1:0").unwrap();
        if let Ok(tcp) = TcpListener::bind(udp.local_addr().unwrap()) {
            return (udp, tcp);
        }
    }
    panic!("no free port for both UDP and TCP");
}

//------------ TCP servers ---------------------------------------------------

/// Runs a TCP server for one connection.
///
/// The server reads one query and passes it to `answer`, which writes
/// whatever it likes to the connection. The connection is closed when
/// `answer` returns.
pub fn tcp_server<F>(listener: TcpListener, answer: F) -> JoinHandle<()>
where
    F: FnOnce(&[u8], &mut TcpStream) + Send + 'static,
{
    thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        let query = read_framed(&mut sock).unwrap();
        answer(&query, &mut sock);
    })
}

/// Writes `messages` to `sock`, each prefixed with its length.
pub fn write_messages(sock: &mut TcpStream, messages: &[Vec<u8>]) {
    for msg in messages {
        write_framed(sock, msg).unwrap();
    }
}

/// Writes a length-prefixed message a few octets at a time.
pub fn write_slowly(
    sock: &mut TcpStream,
    message: &[u8],
    chunk: usize,
) -> io::Result<()> {
    sock.set_nodelay(true)?;
    let mut frame = (message.len() as u16).to_be_bytes().to_vec();
    frame.extend_from_slice(message);
    for part in frame.chunks(chunk) {
        sock.write_all(part)?;
        thread::sleep(Duration::from_millis(2));
    }
    Ok(())
}

pub fn tcp_listener() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").unwrap()
}

//------------ IPv6 ----------------------------------------------------------

/// Binds a UDP socket and a TCP listener to the same IPv6 loopback port.
///
/// Returns `None` if the host has no IPv6 loopback address.
pub fn bind_both_v6() -> Option<(UdpSocket, TcpListener)> {
    for _ in 0..20 {
        let udp = UdpSocket::bind("[::1]:0").ok()?;
        if let Ok(tcp) = TcpListener::bind(udp.local_addr().unwrap()) {
            return Some((udp, tcp));
        }
    }
    None
}
