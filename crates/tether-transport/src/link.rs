//! Datagram and clock abstractions.
//!
//! The protocol engines never touch sockets or system time directly; they
//! are written against [`DatagramLink`] and [`Clock`] so the same state
//! machines run over real UDP in production and over the in-memory
//! [`loopback`](crate::loopback) network in tests.

use crate::MAX_DATAGRAM_SIZE;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Instant;

/// A peer's network address: IPv4 plus UDP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    /// IPv4 address
    pub ip: Ipv4Addr,
    /// UDP port
    pub port: u16,
}

impl PeerAddr {
    /// Create an address from its components.
    #[must_use]
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Canonical 6-byte form: 4 address octets then the port, network order.
    ///
    /// These bytes index the handshake-id mixing table, so the encoding must
    /// stay stable.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 6] {
        let octets = self.ip.octets();
        let port = self.port.to_be_bytes();
        [octets[0], octets[1], octets[2], octets[3], port[0], port[1]]
    }
}

impl From<SocketAddrV4> for PeerAddr {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

impl From<PeerAddr> for SocketAddrV4 {
    fn from(addr: PeerAddr) -> Self {
        SocketAddrV4::new(addr.ip, addr.port)
    }
}

impl std::fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Non-blocking datagram service.
///
/// Implementations must not block: `recv` returns `Ok(None)` when no packet
/// is waiting, and `send` either hands the packet to the network or fails.
pub trait DatagramLink {
    /// Send one datagram to `to`.
    fn send(&mut self, to: PeerAddr, data: &[u8]) -> io::Result<()>;

    /// Receive one datagram, if any is waiting.
    fn recv(&mut self) -> io::Result<Option<(PeerAddr, Vec<u8>)>>;
}

/// Monotonic microsecond clock.
pub trait Clock {
    /// Current monotonic time in microseconds.
    fn now_micros(&self) -> u64;
}

/// Wall-independent clock backed by [`std::time::Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_micros(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Non-blocking UDP socket implementing [`DatagramLink`].
pub struct UdpLink {
    socket: UdpSocket,
    buf: Box<[u8; MAX_DATAGRAM_SIZE]>,
}

impl UdpLink {
    /// Bind a non-blocking UDP socket to `addr`.
    ///
    /// # Errors
    ///
    /// Propagates socket creation and bind failures.
    pub fn bind(addr: SocketAddrV4) -> io::Result<Self> {
        let socket = socket2::Socket::new(
            socket2::Domain::IPV4,
            socket2::Type::DGRAM,
            Some(socket2::Protocol::UDP),
        )?;
        socket.set_nonblocking(true)?;
        socket.set_recv_buffer_size(256 * 1024)?;
        socket.set_send_buffer_size(256 * 1024)?;
        socket.bind(&SocketAddr::V4(addr).into())?;
        Ok(Self {
            socket: socket.into(),
            buf: Box::new([0u8; MAX_DATAGRAM_SIZE]),
        })
    }

    /// Local address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates `local_addr` failures from the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramLink for UdpLink {
    fn send(&mut self, to: PeerAddr, data: &[u8]) -> io::Result<()> {
        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "datagram exceeds 65507 bytes",
            ));
        }
        self.socket.send_to(data, SocketAddrV4::from(to))?;
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Option<(PeerAddr, Vec<u8>)>> {
        loop {
            match self.socket.recv_from(&mut self.buf[..]) {
                Ok((len, SocketAddr::V4(from))) => {
                    return Ok(Some((PeerAddr::from(from), self.buf[..len].to_vec())));
                }
                // not our address family; drop and keep draining
                Ok((_, SocketAddr::V6(_))) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }
}
