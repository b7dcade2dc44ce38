//! Exchanges with name servers running on the loopback interface.

mod common;

use std::time::{Duration, Instant};

use common::{
    bind_both, bind_both_v6, init_logging, mk_query, mk_reply, tcp_listener, tcp_server,
    udp_server, write_messages, write_slowly, SilentServer, A, AXFR, SOA,
};
use domain_send::net::client::conf::{ExchangePolicy, Protocol, ServerList};
use domain_send::net::client::dispatcher::{Answer, Dispatcher};
use domain_send::net::client::error::{Error, ErrorKind};
use domain_send::net::client::{axfr, tcp, udp};
use std::net::UdpSocket;

fn policy(timeout: Duration) -> ExchangePolicy {
    let mut res = ExchangePolicy::new();
    res.set_timeout(timeout);
    res
}

#[test]
fn silent_server_is_skipped() {
    init_logging();

    let silent = SilentServer::new();
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    let responsive = sock.local_addr().unwrap();
    let server = udp_server(sock, 1, |query| mk_reply(query, &[A], 4, false));

    let dispatcher = Dispatcher::new(
        [silent.addr(), responsive].into_iter().collect(),
        policy(Duration::from_millis(300)),
    );
    let query = mk_query(0x1234, A);
    let start = Instant::now();
    let reply = dispatcher.send(&query).unwrap();
    let elapsed = start.elapsed();
    server.join().unwrap();

    assert_eq!(reply.addr(), responsive);
    assert_eq!(reply.protocol(), Protocol::Udp);
    assert_eq!(reply.header().id(), 0x1234);
    assert_eq!(reply.header().ancount(), 1);
    assert!(elapsed >= Duration::from_millis(300));
    assert!(reply.elapsed() < elapsed);
}

#[test]
fn truncated_reply_is_retried_over_tcp() {
    init_logging();

    let (udp_sock, listener) = bind_both();
    let addr = udp_sock.local_addr().unwrap();
    let udp_server =
        udp_server(udp_sock, 1, |query| mk_reply(query, &[], 0, true));
    let tcp_server = tcp_server(listener, |query, sock| {
        let reply = mk_reply(query, &[A; 200], 4, false);
        write_messages(sock, &[reply]);
    });

    let dispatcher = Dispatcher::new(
        ServerList::from(vec![addr]),
        policy(Duration::from_secs(2)),
    );
    let reply = dispatcher.send(&mk_query(7, A)).unwrap();
    udp_server.join().unwrap();
    tcp_server.join().unwrap();

    assert_eq!(reply.addr(), addr);
    assert_eq!(reply.protocol(), Protocol::Tcp);
    assert!(!reply.is_truncated());
    assert_eq!(reply.header().ancount(), 200);
    assert!(reply.len() > 512);
}

#[test]
fn large_udp_reply_with_bigger_buffer() {
    init_logging();

    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = sock.local_addr().unwrap();
    let server =
        udp_server(sock, 1, |query| mk_reply(query, &[A; 100], 4, false));

    let mut policy = policy(Duration::from_secs(2));
    policy.set_udp_payload_size(Some(4096));
    let reply = udp::exchange(addr, &mk_query(1, A), &policy).unwrap();
    server.join().unwrap();
    assert_eq!(reply.header().ancount(), 100);
    assert!(reply.len() > 512);
}

#[test]
fn tcp_reply_in_small_pieces() {
    init_logging();

    let listener = tcp_listener();
    let addr = listener.local_addr().unwrap();
    let server = tcp_server(listener, |query, sock| {
        let reply = mk_reply(query, &[A, A, A], 4, false);
        write_slowly(sock, &reply, 3).unwrap();
    });

    let reply =
        tcp::exchange(addr, &mk_query(2, A), &policy(Duration::from_secs(2)))
            .unwrap();
    server.join().unwrap();
    assert_eq!(reply.header().id(), 2);
    assert_eq!(reply.header().ancount(), 3);
}

#[test]
fn tcp_connection_closed_early() {
    init_logging();

    let listener = tcp_listener();
    let addr = listener.local_addr().unwrap();
    let server = tcp_server(listener, |_, sock| {
        write_messages(sock, &[]);
    });

    let err =
        tcp::exchange(addr, &mk_query(3, A), &policy(Duration::from_secs(2)))
            .unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, Error::UnexpectedEndOfData));
    assert_eq!(err.kind(), ErrorKind::Receive);
}

#[test]
fn all_servers_fail() {
    init_logging();

    let first = SilentServer::new();
    let second = SilentServer::new();
    let dispatcher = Dispatcher::new(
        [first.addr(), second.addr()].into_iter().collect(),
        policy(Duration::from_millis(100)),
    );
    let err = dispatcher.send(&mk_query(4, A)).unwrap_err();
    let failures = err.failures().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].addr(), first.addr());
    assert_eq!(failures[1].addr(), second.addr());
    assert!(failures.iter().all(|f| f.error().is_timeout()));
}

#[test]
fn complete_zone_transfer() {
    init_logging();

    let listener = tcp_listener();
    let addr = listener.local_addr().unwrap();
    let server = tcp_server(listener, |query, sock| {
        write_messages(
            sock,
            &[
                mk_reply(query, &[SOA, A], 22, false),
                mk_reply(query, &[A, A], 4, false),
                mk_reply(query, &[A, SOA], 22, false),
            ],
        );
    });

    let dispatcher = Dispatcher::new(
        ServerList::from(vec![addr]),
        policy(Duration::from_secs(2)),
    );
    let query = mk_query(5, AXFR);
    let stream = match dispatcher.dispatch(&query).unwrap() {
        Answer::Transfer(stream) => stream,
        Answer::Single(_) => panic!("expected a zone transfer"),
    };
    let messages = stream.collect_all().unwrap();
    server.join().unwrap();

    assert_eq!(messages.len(), 3);
    for msg in &messages {
        assert_eq!(&msg[..2], &5u16.to_be_bytes());
    }
}

#[test]
fn zone_transfer_cut_short() {
    init_logging();

    let listener = tcp_listener();
    let addr = listener.local_addr().unwrap();
    let server = tcp_server(listener, |query, sock| {
        write_messages(
            sock,
            &[
                mk_reply(query, &[SOA, A], 22, false),
                mk_reply(query, &[A], 4, false),
            ],
        );
    });

    let mut stream = axfr::connect(
        addr,
        &mk_query(6, AXFR),
        &policy(Duration::from_secs(2)),
    )
    .unwrap();
    assert!(stream.next().unwrap().is_ok());
    assert!(stream.next().unwrap().is_ok());
    let err = stream.next().unwrap().unwrap_err();
    assert!(matches!(err, Error::IncompleteTransfer { received: 2, .. }));
    assert!(stream.next().is_none());
    server.join().unwrap();
}

#[test]
fn zone_transfer_read_times_out() {
    init_logging();

    let listener = tcp_listener();
    let addr = listener.local_addr().unwrap();
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
    let server = tcp_server(listener, move |query, sock| {
        write_messages(sock, &[mk_reply(query, &[SOA], 22, false)]);
        // Keep the connection open until the client gave up.
        let _ = done_rx.recv();
    });

    let mut stream = axfr::connect(
        addr,
        &mk_query(8, AXFR),
        &policy(Duration::from_millis(200)),
    )
    .unwrap();
    assert!(stream.next().unwrap().is_ok());
    let err = stream.next().unwrap().unwrap_err();
    match err {
        Error::IncompleteTransfer { received, source } => {
            assert_eq!(received, 1);
            assert!(source.is_timeout());
        }
        err => panic!("unexpected error {}", err),
    }
    done_tx.send(()).unwrap();
    server.join().unwrap();
}

#[test]
fn ipv6_truncated_reply_is_retried_over_tcp() {
    init_logging();

    let (udp_sock, listener) = match bind_both_v6() {
        Some(socks) => socks,
        None => return,
    };
    let addr = udp_sock.local_addr().unwrap();
    assert!(addr.is_ipv6());
    let udp_server =
        udp_server(udp_sock, 1, |query| mk_reply(query, &[], 0, true));
    let tcp_server = tcp_server(listener, |query, sock| {
        assert!(sock.peer_addr().unwrap().is_ipv6());
        write_messages(sock, &[mk_reply(query, &[A; 50], 4, false)]);
    });

    let dispatcher = Dispatcher::new(
        ServerList::from(vec![addr]),
        policy(Duration::from_secs(2)),
    );
    let reply = dispatcher.send(&mk_query(9, A)).unwrap();
    udp_server.join().unwrap();
    tcp_server.join().unwrap();

    assert_eq!(reply.addr(), addr);
    assert_eq!(reply.protocol(), Protocol::Tcp);
    assert_eq!(reply.header().ancount(), 50);
}

#[test]
fn ipv6_tcp_exchange() {
    init_logging();

    let listener = match std::net::TcpListener::bind("[::1]:0") {
        Ok(listener) => listener,
        Err(_) => return,
    };
    let addr = listener.local_addr().unwrap();
    let server = tcp_server(listener, |query, sock| {
        write_messages(sock, &[mk_reply(query, &[A], 4, false)]);
    });

    let reply =
        tcp::exchange(addr, &mk_query(10, A), &policy(Duration::from_secs(2)))
            .unwrap();
    server.join().unwrap();
    assert_eq!(reply.addr(), addr);
    assert_eq!(reply.header().id(), 10);
}
