use statsd_shard::prelude::*;
use statsd_shard::{bucket, Client, ClientBuilder, MetricError};
use std::io::Read;
use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

mod utils;
use utils::{run_arc_threaded_test, wait_for, LINES_PER_ITERATION};

fn new_tcp_client(address: &str) -> ClientBuilder {
    Client::builder("tcp", address)
        .timeout(Duration::from_secs(1))
        .flush_period(Duration::from_secs(3600))
}

/// Accept `conns` connections and read each of them until it's closed,
/// returning everything read from all of them.
fn read_all(listener: TcpListener, conns: usize) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let streams: Vec<_> = (0..conns).map(|_| listener.accept().unwrap().0).collect();
        let mut out = String::new();
        for mut stream in streams {
            stream.read_to_string(&mut out).unwrap();
        }
        out
    })
}

#[test]
fn test_tcp_client_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let reader = read_all(listener, 1);

    let client = new_tcp_client(&address).prefix("juju").shards(1).build().unwrap();
    client.count(&bucket!["zoo"], 3);
    client.gauge(&bucket!["zoo"], -2);
    drop(client);

    assert_eq!("juju.zoo:3|c\njuju.zoo:-2|g\n", reader.join().unwrap());
}

#[test]
fn test_tcp_client_multiple_shards() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let reader = read_all(listener, 3);

    let client = new_tcp_client(&address).shards(3).build().unwrap();
    run_arc_threaded_test(client, 3, 10);

    let received = reader.join().unwrap();
    assert_eq!(3 * 10 * LINES_PER_ITERATION, received.lines().count() as u64);
}

/// Is `line` a complete `metric.line:<n>|c` counter line?
fn is_counter_line(line: &str) -> bool {
    match line.strip_prefix("metric.line:").and_then(|l| l.strip_suffix("|c")) {
        Some(value) => value.parse::<u64>().is_ok(),
        None => false,
    }
}

#[test]
fn test_tcp_client_slow_reader_keeps_lines_whole() {
    const LINES: u64 = 200_000;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let reader = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // Stop reading long enough for the socket buffers to fill up and
        // the client's writes to stall, then read everything.
        thread::sleep(Duration::from_millis(500));
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    });

    let errors = Arc::new(AtomicU64::new(0));
    let errors_ref = Arc::clone(&errors);
    let client = Client::builder("tcp", &address)
        .timeout(Duration::from_millis(200))
        .flush_period(Duration::from_millis(10))
        .prefix("metric")
        .shards(1)
        .with_error_handler(move |_| {
            errors_ref.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    for i in 0..LINES {
        client.count(&bucket!["line"], i);
    }
    drop(client);

    let received = reader.join().unwrap();
    let malformed: Vec<&str> = received.lines().filter(|l| !is_counter_line(l)).take(5).collect();
    assert!(malformed.is_empty(), "malformed lines on the wire: {:?}", malformed);

    let expected: Vec<String> = (0..LINES).map(|i| format!("metric.line:{}|c", i)).collect();
    assert!(received.lines().eq(expected.iter().map(String::as_str)));
    assert!(received.ends_with('\n'));
    assert_eq!(0, errors.load(Ordering::SeqCst));
}

#[test]
fn test_tcp_client_nothing_listening() {
    // Bind then drop a listener to get a port that's very likely unused
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let res = new_tcp_client(&address).shards(2).build();
    match res {
        Err(e @ MetricError::Connect { .. }) => {
            assert!(e.to_string().contains("shard 0"));
            assert!(e.to_string().contains("tcp"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_tcp_client_peer_closed_reports_errors() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let closer = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let errors = Arc::new(AtomicU64::new(0));
    let errors_ref = Arc::clone(&errors);
    let client = new_tcp_client(&address)
        .shards(1)
        .with_error_handler(move |_| {
            errors_ref.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    closer.join().unwrap();

    // The first writes after the peer goes away may still succeed, keep
    // writing until the connection reports it's broken.
    let failed = wait_for(|| {
        client.incr(&bucket!["orphan"]);
        client.flush();
        errors.load(Ordering::SeqCst) > 0
    });

    assert!(failed);
    assert!(client.stats().packets_dropped > 0);
}
