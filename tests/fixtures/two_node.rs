//! Two-party fixtures over the in-memory loopback network.
//!
//! Both fixtures share one [`LoopbackNetwork`] and one [`ManualClock`], so
//! tests advance time explicitly and every run is deterministic.

use std::net::Ipv4Addr;
use tether_core::{Node, SessionId, SessionStatus};
use tether_crypto::Identity;
use tether_transport::{
    Endpoint, LinkId, LinkStatus, LoopbackLink, LoopbackNetwork, ManualClock, PeerAddr,
};

/// Scheduler period used by all scenarios: 50 ms, i.e. 20 Hz.
pub const TICK_MICROS: u64 = 50_000;

/// Route protocol tracing to the test output. Honors `RUST_LOG`, e.g.
/// `RUST_LOG=tether_transport=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test address `10.0.0.<host>:33445`.
pub fn peer(host: u8) -> PeerAddr {
    PeerAddr::new(Ipv4Addr::new(10, 0, 0, host), 33445)
}

/// Two bare link endpoints, `a` at [`peer`]`(1)` and `b` at [`peer`]`(2)`.
pub struct LinkPair {
    /// Shared network; install filters here
    pub net: LoopbackNetwork,
    /// Shared clock
    pub clock: ManualClock,
    /// Endpoint at `10.0.0.1`
    pub a: Endpoint<LoopbackLink, ManualClock>,
    /// Endpoint at `10.0.0.2`
    pub b: Endpoint<LoopbackLink, ManualClock>,
}

impl LinkPair {
    /// Create a fresh pair.
    pub fn new() -> Self {
        init_tracing();
        let net = LoopbackNetwork::new();
        let clock = ManualClock::new();
        let a = Endpoint::new(net.link(peer(1)), clock.clone());
        let b = Endpoint::new(net.link(peer(2)), clock.clone());
        Self { net, clock, a, b }
    }

    /// Advance time by one scheduler period and run both endpoints.
    pub fn tick(&mut self) {
        self.clock.advance(TICK_MICROS);
        self.a.poll();
        self.b.poll();
        self.a.tick();
        self.b.tick();
    }

    /// Connect `a` to `b` and drive both sides until established.
    ///
    /// # Panics
    ///
    /// Panics if the link does not establish within `max_ticks`.
    pub fn establish(&mut self, max_ticks: u32) -> (LinkId, LinkId) {
        let a_id = self.a.connect(peer(2));
        for _ in 0..max_ticks {
            self.tick();
            if self.a.status(a_id) == Some(LinkStatus::Established) {
                if let Some(b_id) = self.b.connection_id(peer(1)) {
                    if self.b.status(b_id) == Some(LinkStatus::Established) {
                        return (a_id, b_id);
                    }
                }
            }
        }
        panic!("link did not establish within {max_ticks} ticks");
    }
}

impl Default for LinkPair {
    fn default() -> Self {
        Self::new()
    }
}

/// Two full nodes with fresh identities on the shared network.
pub struct NodePair {
    /// Shared network; install filters here
    pub net: LoopbackNetwork,
    /// Shared clock
    pub clock: ManualClock,
    /// Node at `10.0.0.1`
    pub a: Node<LoopbackLink, ManualClock>,
    /// Node at `10.0.0.2`
    pub b: Node<LoopbackLink, ManualClock>,
}

impl NodePair {
    /// Create a fresh pair.
    pub fn new() -> Self {
        init_tracing();
        let net = LoopbackNetwork::new();
        let clock = ManualClock::new();
        let a = Node::new(Identity::generate(), net.link(peer(1)), clock.clone());
        let b = Node::new(Identity::generate(), net.link(peer(2)), clock.clone());
        Self { net, clock, a, b }
    }

    /// Advance time by one scheduler period and run both nodes.
    pub fn tick(&mut self) {
        self.clock.advance(TICK_MICROS);
        self.a.tick();
        self.b.tick();
    }

    /// `a` dials `b`; `b` accepts; both driven until established.
    ///
    /// # Panics
    ///
    /// Panics if the session does not establish within `max_ticks`.
    pub fn establish(&mut self, max_ticks: u32) -> (SessionId, SessionId) {
        let b_pub = *self.b.identity().public_key();
        let a_sid = self.a.connect(&b_pub, peer(2)).expect("connect");
        let mut b_sid = None;
        for _ in 0..max_ticks {
            self.tick();
            if b_sid.is_none() {
                if let Some(hello) = self.b.next_inbound() {
                    b_sid = Some(self.b.accept_inbound(&hello).expect("accept"));
                }
            }
            if let Some(b_sid) = b_sid {
                if self.a.status(a_sid) == Some(SessionStatus::Established)
                    && self.b.status(b_sid) == Some(SessionStatus::Established)
                {
                    return (a_sid, b_sid);
                }
            }
        }
        panic!("session did not establish within {max_ticks} ticks");
    }
}

impl Default for NodePair {
    fn default() -> Self {
        Self::new()
    }
}
