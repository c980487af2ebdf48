//! The node: identity, link endpoint, session table and inbound queue in
//! one caller-owned value.
//!
//! A [`Node`] is driven from a single-threaded loop. Each [`Node::tick`]
//! ingests datagrams, drains freshly accepted link connections into the
//! inbound queue, advances pending session handshakes, expires sessions
//! whose link died, and finally runs the link-layer timers. Several nodes
//! can live in one process, which is how the integration tests drive both
//! ends of a conversation.

use crate::error::SessionError;
use crate::handshake::{self, SESSION_DATA, SESSION_HELLO, SESSION_REQUEST};
use crate::request::{self, Request};
use crate::session::{Session, SessionId, SessionStatus};
use crate::{CONFIRM_KILL_DELAY_SECS, MAX_INCOMING, MAX_SESSIONS};
use std::collections::VecDeque;
use tether_crypto::{Identity, MAC_SIZE, Nonce, PairCipher, PublicKey, SessionKeypair};
use tether_transport::{
    Clock, DatagramLink, Endpoint, LinkId, LinkStatus, MAX_DATA_SIZE, PeerAddr,
};
use tracing::{debug, trace, warn};

/// Confirmation record: four zero bytes under the fresh session keys.
const CONFIRM_PLAINTEXT: [u8; 4] = [0u8; 4];

/// Result of one encrypted read.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionRead {
    /// One decrypted record
    Packet(Vec<u8>),
    /// A record arrived but failed validation; the receive nonce did not
    /// advance
    Discarded,
    /// Nothing waiting
    Empty,
}

/// An inbound session offer surfaced by [`Node::next_inbound`].
///
/// Accept it with [`Node::accept_inbound`] or drop the link with
/// [`Node::refuse_inbound`].
pub struct InboundHello {
    /// Link connection carrying the offer
    pub link_id: LinkId,
    /// Peer's long-term public key
    pub peer_pub: PublicKey,
    /// Starting nonce the peer expects our records under
    pub secret_nonce: Nonce,
    /// Peer's ephemeral session public key
    pub session_pub: PublicKey,
}

/// A validated one-shot request received on the bare datagram socket.
pub struct IncomingRequest {
    /// Datagram source address
    pub from: PeerAddr,
    /// Sender's long-term public key
    pub sender: PublicKey,
    /// Request kind byte
    pub kind: u8,
    /// Decrypted request body
    pub body: Vec<u8>,
}

/// A TETHER node.
pub struct Node<L, C> {
    identity: Identity,
    endpoint: Endpoint<L, C>,
    sessions: Vec<Option<Session>>,
    incoming: VecDeque<LinkId>,
    requests: VecDeque<IncomingRequest>,
}

/// Seal and queue the four-zero-byte confirmation record, consuming one
/// send nonce.
fn send_confirmation<L: DatagramLink, C: Clock>(
    session: &mut Session,
    endpoint: &mut Endpoint<L, C>,
) -> Result<(), SessionError> {
    let cipher = session.cipher.as_ref().ok_or(SessionError::NotEstablished)?;
    let sealed = cipher.seal(&session.sent_nonce, &CONFIRM_PLAINTEXT)?;
    let mut record = Vec::with_capacity(1 + sealed.len());
    record.push(SESSION_DATA);
    record.extend_from_slice(&sealed);
    endpoint.write(session.link_id, &record)?;
    session.sent_nonce.increment();
    Ok(())
}

impl<L: DatagramLink, C: Clock> Node<L, C> {
    /// Create a node from an identity, a datagram link and a clock.
    pub fn new(identity: Identity, link: L, clock: C) -> Self {
        Self {
            identity,
            endpoint: Endpoint::new(link, clock),
            sessions: (0..MAX_SESSIONS).map(|_| None).collect(),
            incoming: VecDeque::new(),
            requests: VecDeque::new(),
        }
    }

    /// The node's long-term identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Read-only access to the link endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint<L, C> {
        &self.endpoint
    }

    // ---- session lifecycle ----

    /// Open an encrypted session to the peer with long-term key `peer_pub`
    /// at `addr`. Queues our hello; establishment completes over subsequent
    /// ticks.
    ///
    /// # Errors
    ///
    /// [`SessionError::DuplicateSession`] if a live session already targets
    /// this (key, address) pair, [`SessionError::TableFull`] when all slots
    /// are taken, plus link and crypto failures.
    pub fn connect(&mut self, peer_pub: &PublicKey, addr: PeerAddr) -> Result<SessionId, SessionError> {
        for session in self.sessions.iter().flatten() {
            if session.peer_pub == *peer_pub && self.endpoint.peer(session.link_id) == Some(addr) {
                return Err(SessionError::DuplicateSession);
            }
        }
        let sid = self.free_slot()?;

        let link_id = self.endpoint.connect(addr);
        let keys = SessionKeypair::generate();
        let recv_nonce = Nonce::random()?;
        let hello = handshake::build_hello(&self.identity, peer_pub, &recv_nonce, &keys.public)?;
        self.endpoint.write(link_id, &hello)?;

        let mut session = Session {
            peer_pub: *peer_pub,
            keys,
            peer_session_pub: None,
            cipher: None,
            recv_nonce,
            sent_nonce: Nonce::from_bytes([0u8; 24]),
            status: SessionStatus::HandshakeSent,
            link_id,
        };
        // first record the peer seals toward us uses the announced nonce + 1
        session.recv_nonce.increment();
        self.sessions[sid] = Some(session);
        debug!(sid, peer = %peer_pub, %addr, "session handshake sent");
        Ok(sid)
    }

    /// Next inbound session offer, if a queued link has a hello waiting.
    ///
    /// Links that died while queued are killed and dropped here.
    pub fn next_inbound(&mut self) -> Option<InboundHello> {
        let mut index = 0;
        while index < self.incoming.len() {
            let link_id = self.incoming[index];
            match self.endpoint.status(link_id) {
                None | Some(LinkStatus::TimedOut) => {
                    let _ = self.endpoint.kill(link_id);
                    self.incoming.remove(index);
                }
                Some(_) => {
                    if self.endpoint.head_packet_id(link_id) == Some(SESSION_HELLO) {
                        let data = self.endpoint.read(link_id)?;
                        match handshake::parse_hello(&self.identity, &data) {
                            Ok(hello) => {
                                self.incoming.remove(index);
                                return Some(InboundHello {
                                    link_id,
                                    peer_pub: hello.sender_pub,
                                    secret_nonce: hello.secret_nonce,
                                    session_pub: hello.session_pub,
                                });
                            }
                            Err(error) => {
                                warn!(link_id, %error, "undecipherable hello ignored");
                                index += 1;
                            }
                        }
                    } else {
                        index += 1;
                    }
                }
            }
        }
        None
    }

    /// Accept an inbound offer: allocate the session, answer with our own
    /// hello and queue the confirmation record.
    ///
    /// # Errors
    ///
    /// [`SessionError::TableFull`] when all slots are taken, plus link and
    /// crypto failures. On error the link is left alive for the caller to
    /// refuse.
    pub fn accept_inbound(&mut self, hello: &InboundHello) -> Result<SessionId, SessionError> {
        let sid = self.free_slot()?;

        let keys = SessionKeypair::generate();
        let cipher = PairCipher::new(&hello.session_pub, &keys.secret)?;
        let recv_nonce = Nonce::random()?;
        let mut sent_nonce = hello.secret_nonce;
        sent_nonce.increment();

        let reply =
            handshake::build_hello(&self.identity, &hello.peer_pub, &recv_nonce, &keys.public)?;
        self.endpoint.write(hello.link_id, &reply)?;

        let mut session = Session {
            peer_pub: hello.peer_pub,
            keys,
            peer_session_pub: Some(hello.session_pub),
            cipher: Some(cipher),
            recv_nonce,
            sent_nonce,
            status: SessionStatus::NotConfirmed,
            link_id: hello.link_id,
        };
        session.recv_nonce.increment();
        send_confirmation(&mut session, &mut self.endpoint)?;

        self.sessions[sid] = Some(session);
        debug!(sid, peer = %hello.peer_pub, "inbound session accepted");
        Ok(sid)
    }

    /// Decline an inbound offer and tear down its link.
    pub fn refuse_inbound(&mut self, hello: &InboundHello) {
        let _ = self.endpoint.kill(hello.link_id);
    }

    /// Session status, or `None` for a dead or unknown id.
    #[must_use]
    pub fn status(&self, sid: SessionId) -> Option<SessionStatus> {
        Some(self.sessions.get(sid)?.as_ref()?.status)
    }

    /// The peer's ephemeral session key, once its hello has been processed.
    #[must_use]
    pub fn peer_session_key(&self, sid: SessionId) -> Option<PublicKey> {
        self.sessions.get(sid)?.as_ref()?.peer_session_pub
    }

    /// Destroy a session and its underlying link.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownSession`] for a dead id; killing twice
    /// fails the second time.
    pub fn kill(&mut self, sid: SessionId) -> Result<(), SessionError> {
        match self.sessions.get_mut(sid).and_then(Option::take) {
            Some(session) => {
                debug!(sid, peer = %session.peer_pub, "session killed");
                let _ = self.endpoint.kill(session.link_id);
                Ok(())
            }
            None => Err(SessionError::UnknownSession(sid)),
        }
    }

    // ---- data path ----

    /// Seal one record and queue it on the link. Each successful call
    /// consumes exactly one send nonce.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotEstablished`] before confirmation,
    /// [`SessionError::PayloadSize`] for records that cannot fit once
    /// sealed, and [`SessionError::Link`] with
    /// [`LinkError::QueueFull`](tether_transport::LinkError::QueueFull)
    /// when the send window is full (retry next tick; no nonce consumed).
    pub fn write_encrypted(&mut self, sid: SessionId, data: &[u8]) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(sid)
            .and_then(Option::as_mut)
            .ok_or(SessionError::UnknownSession(sid))?;
        if session.status != SessionStatus::Established {
            return Err(SessionError::NotEstablished);
        }
        if data.is_empty() || 1 + data.len() + MAC_SIZE > MAX_DATA_SIZE {
            return Err(SessionError::PayloadSize { len: data.len() });
        }
        let cipher = session.cipher.as_ref().ok_or(SessionError::NotEstablished)?;
        let sealed = cipher.seal(&session.sent_nonce, data)?;
        let mut record = Vec::with_capacity(1 + sealed.len());
        record.push(SESSION_DATA);
        record.extend_from_slice(&sealed);
        self.endpoint.write(session.link_id, &record)?;
        session.sent_nonce.increment();
        Ok(())
    }

    /// Read and unseal the next record, if any.
    ///
    /// Returns [`SessionRead::Discarded`] for records that are not type 3 or
    /// fail authentication; the receive nonce only advances on success.
    pub fn read_decrypted(&mut self, sid: SessionId) -> SessionRead {
        let Some(session) = self.sessions.get_mut(sid).and_then(Option::as_mut) else {
            return SessionRead::Empty;
        };
        if session.status != SessionStatus::Established {
            return SessionRead::Empty;
        }
        let Some(data) = self.endpoint.read(session.link_id) else {
            return SessionRead::Empty;
        };
        if data.first() != Some(&SESSION_DATA) {
            trace!(sid, "non-data record discarded");
            return SessionRead::Discarded;
        }
        let Some(cipher) = session.cipher.as_ref() else {
            return SessionRead::Discarded;
        };
        match cipher.open(&session.recv_nonce, &data[1..]) {
            Ok(plain) => {
                session.recv_nonce.increment();
                SessionRead::Packet(plain)
            }
            Err(_) => {
                trace!(sid, "record failed authentication, discarded");
                SessionRead::Discarded
            }
        }
    }

    // ---- one-shot requests ----

    /// Seal and send a one-shot request datagram, outside any session.
    ///
    /// # Errors
    ///
    /// Propagates size, crypto and socket failures.
    pub fn send_request(
        &mut self,
        to: PeerAddr,
        peer_pub: &PublicKey,
        kind: u8,
        body: &[u8],
    ) -> Result<(), SessionError> {
        let packet = request::create_request(&self.identity, peer_pub, kind, body)?;
        self.endpoint.send_datagram(to, &packet)?;
        Ok(())
    }

    /// Next validated request received on the bare socket, if any.
    pub fn recv_request(&mut self) -> Option<IncomingRequest> {
        self.requests.pop_front()
    }

    // ---- event loop ----

    /// Run one scheduler round. Call a few times per second or more.
    pub fn tick(&mut self) {
        for (from, data) in self.endpoint.poll() {
            match request::handle_request(&self.identity, &data) {
                Ok(Request { sender, kind, body }) => {
                    if self.requests.len() < MAX_INCOMING {
                        self.requests.push_back(IncomingRequest {
                            from,
                            sender,
                            kind,
                            body,
                        });
                    }
                }
                Err(error) => trace!(%from, %error, "stray datagram dropped"),
            }
        }
        self.drain_incoming();
        self.pump_sessions();
        self.expire_sessions();
        self.endpoint.tick();
    }

    // ---- internals ----

    fn free_slot(&self) -> Result<SessionId, SessionError> {
        self.sessions
            .iter()
            .position(Option::is_none)
            .ok_or(SessionError::TableFull)
    }

    /// Move freshly accepted link connections into the inbound queue, and
    /// drop queued links that died before anyone claimed them.
    fn drain_incoming(&mut self) {
        let endpoint = &mut self.endpoint;
        self.incoming.retain(|&link_id| match endpoint.status(link_id) {
            None | Some(LinkStatus::TimedOut) => {
                debug!(link_id, "queued inbound link died unclaimed");
                let _ = endpoint.kill(link_id);
                false
            }
            Some(_) => true,
        });
        while self.incoming.len() < MAX_INCOMING {
            match self.endpoint.incoming_connection() {
                Some(link_id) => {
                    debug!(link_id, "inbound link queued for session handshake");
                    self.incoming.push_back(link_id);
                }
                None => break,
            }
        }
    }

    /// Advance sessions that are mid-handshake: consume the peer's hello
    /// while we wait in `HandshakeSent`, and the zero-record confirmation
    /// while in `NotConfirmed`. Any unexpected record kills the session.
    fn pump_sessions(&mut self) {
        for sid in 0..self.sessions.len() {
            let mut doomed = false;
            {
                let Some(session) = self.sessions[sid].as_mut() else {
                    continue;
                };
                match session.status {
                    SessionStatus::HandshakeSent => {
                        // a stray one-shot request can land ahead of the
                        // hello; drop it
                        if self.endpoint.head_packet_id(session.link_id) == Some(SESSION_REQUEST) {
                            let _ = self.endpoint.read(session.link_id);
                        }
                        match self.endpoint.head_packet_id(session.link_id) {
                            Some(SESSION_HELLO) => {
                                let Some(data) = self.endpoint.read(session.link_id) else {
                                    continue;
                                };
                                match handshake::parse_hello(&self.identity, &data) {
                                    Ok(hello) if hello.sender_pub == session.peer_pub => {
                                        match PairCipher::new(&hello.session_pub, &session.keys.secret)
                                        {
                                            Ok(cipher) => {
                                                session.peer_session_pub = Some(hello.session_pub);
                                                session.cipher = Some(cipher);
                                                session.sent_nonce = hello.secret_nonce;
                                                session.sent_nonce.increment();
                                                if send_confirmation(session, &mut self.endpoint)
                                                    .is_ok()
                                                {
                                                    session.status = SessionStatus::NotConfirmed;
                                                    debug!(sid, "session keys agreed");
                                                } else {
                                                    doomed = true;
                                                }
                                            }
                                            Err(_) => doomed = true,
                                        }
                                    }
                                    Ok(_) => {
                                        warn!(sid, "hello from unexpected identity ignored");
                                    }
                                    Err(error) => {
                                        warn!(sid, %error, "undecipherable hello ignored");
                                    }
                                }
                            }
                            Some(_) => doomed = true,
                            None => {}
                        }
                    }
                    SessionStatus::NotConfirmed => {
                        match self.endpoint.head_packet_id(session.link_id) {
                            Some(SESSION_DATA) => {
                                let Some(data) = self.endpoint.read(session.link_id) else {
                                    continue;
                                };
                                let confirmed = session
                                    .cipher
                                    .as_ref()
                                    .and_then(|cipher| {
                                        cipher.open(&session.recv_nonce, &data[1..]).ok()
                                    })
                                    .is_some_and(|plain| plain == CONFIRM_PLAINTEXT);
                                if confirmed {
                                    session.recv_nonce.increment();
                                    session.status = SessionStatus::Established;
                                    let _ = self
                                        .endpoint
                                        .kill_in(session.link_id, CONFIRM_KILL_DELAY_SECS);
                                    debug!(sid, peer = %session.peer_pub, "session established");
                                } else {
                                    doomed = true;
                                }
                            }
                            Some(_) => doomed = true,
                            None => {}
                        }
                    }
                    SessionStatus::Established | SessionStatus::TimedOut => {}
                }
            }
            if doomed {
                warn!(sid, "unexpected record during handshake, killing session");
                let _ = self.kill(sid);
            }
        }
    }

    /// Cascade link death up: a session whose link timed out (or vanished)
    /// becomes `TimedOut` and waits for the application to kill it.
    fn expire_sessions(&mut self) {
        for sid in 0..self.sessions.len() {
            let Some(session) = self.sessions[sid].as_mut() else {
                continue;
            };
            if session.status == SessionStatus::TimedOut {
                continue;
            }
            match self.endpoint.status(session.link_id) {
                Some(LinkStatus::TimedOut) | None => {
                    debug!(sid, peer = %session.peer_pub, "link died, session timed out");
                    session.status = SessionStatus::TimedOut;
                }
                Some(_) => {}
            }
        }
    }
}
