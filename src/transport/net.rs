// statsd-shard - A sharded, buffered Statsd client for Rust
//
// Copyright 2015-2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::transport::core::Transport;
use crate::types::MetricError;
use std::fmt;
use std::io::{self, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::{UnixDatagram, UnixStream};

/// Kind of network a client connects over.
///
/// Parsed from the same names used by most Statsd clients: `udp`, `tcp`,
/// and on Unix platforms `unix` (stream) and `unixgram` (datagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Udp,
    Tcp,
    #[cfg(unix)]
    Unix,
    #[cfg(unix)]
    Unixgram,
}

impl Network {
    pub const fn as_str(self) -> &'static str {
        match self {
            Network::Udp => "udp",
            Network::Tcp => "tcp",
            #[cfg(unix)]
            Network::Unix => "unix",
            #[cfg(unix)]
            Network::Unixgram => "unixgram",
        }
    }

    /// Is this a connectionless network where each write is one datagram?
    pub const fn is_datagram(self) -> bool {
        match self {
            Network::Udp => true,
            Network::Tcp => false,
            #[cfg(unix)]
            Network::Unix => false,
            #[cfg(unix)]
            Network::Unixgram => true,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl FromStr for Network {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "udp" => Ok(Network::Udp),
            "tcp" => Ok(Network::Tcp),
            #[cfg(unix)]
            "unix" => Ok(Network::Unix),
            #[cfg(unix)]
            "unixgram" => Ok(Network::Unixgram),
            other => Err(MetricError::UnsupportedNetwork(other.to_owned())),
        }
    }
}

/// Connected socket used by a shard to send packets to the Statsd server.
#[derive(Debug)]
pub enum Connection {
    Udp(UdpSocket),
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
    #[cfg(unix)]
    Unixgram(UnixDatagram),
}

impl Connection {
    /// Open a connection to `address` over `network`.
    ///
    /// For TCP, each address the host resolves to is tried in turn, giving
    /// each one `timeout` to connect. Stream connections have no write timeout:
    /// a write that gave up part way through a packet would leave a partial
    /// line on the stream for the next packet to be appended to.
    ///
    /// Datagram sockets get `timeout` as their write timeout since each write
    /// is all or nothing. They're connectionless, so after "connecting" a couple of
    /// empty datagrams are written to find out early when nothing is listening
    /// on the other end (the error from the first probe is only reported by
    /// the operating system on a later write). Any failure is returned as an
    /// error here instead of silently dropping every packet later on.
    pub fn open(network: Network, address: &str, timeout: Duration) -> io::Result<Connection> {
        let mut conn = match network {
            Network::Udp => Connection::Udp(connect_udp(address)?),
            Network::Tcp => Connection::Tcp(connect_tcp(address, timeout)?),
            #[cfg(unix)]
            Network::Unix => Connection::Unix(UnixStream::connect(address)?),
            #[cfg(unix)]
            Network::Unixgram => {
                let socket = UnixDatagram::unbound()?;
                socket.connect(address)?;
                Connection::Unixgram(socket)
            }
        };

        if network.is_datagram() {
            conn.set_write_timeout(timeout)?;
            for _ in 0..2 {
                conn.write(&[])?;
            }
        }

        Ok(conn)
    }

    fn set_write_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Connection::Udp(socket) => socket.set_write_timeout(Some(timeout)),
            #[cfg(unix)]
            Connection::Unixgram(socket) => socket.set_write_timeout(Some(timeout)),
            _ => Ok(()),
        }
    }

    /// Write timeout currently set on the underlying socket.
    #[cfg(test)]
    fn write_timeout(&self) -> io::Result<Option<Duration>> {
        match self {
            Connection::Udp(socket) => socket.write_timeout(),
            Connection::Tcp(stream) => stream.write_timeout(),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.write_timeout(),
            #[cfg(unix)]
            Connection::Unixgram(socket) => socket.write_timeout(),
        }
    }
}

impl Transport for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Udp(socket) => socket.send(buf),
            Connection::Tcp(stream) => stream.write_all(buf).map(|_| buf.len()),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.write_all(buf).map(|_| buf.len()),
            #[cfg(unix)]
            Connection::Unixgram(socket) => socket.send(buf),
        }
    }
}

/// Resolve `address` into every socket address it refers to, returning an
/// `InvalidInput` error if it yields none.
fn get_addrs(address: &str) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = address.to_socket_addrs()?.collect();
    if addrs.is_empty() {
        Err(io::Error::new(io::ErrorKind::InvalidInput, "No socket addresses yielded"))
    } else {
        Ok(addrs)
    }
}

fn connect_udp(address: &str) -> io::Result<UdpSocket> {
    let addrs = get_addrs(address)?;
    let mut last_err = None;

    for addr in addrs {
        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        match UdpSocket::bind(local).and_then(|socket| socket.connect(addr).map(|_| socket)) {
            Ok(socket) => return Ok(socket),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "could not connect")))
}

fn connect_tcp(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = get_addrs(address)?;
    let mut last_err = None;

    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "could not connect")))
}
