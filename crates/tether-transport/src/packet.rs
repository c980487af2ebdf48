//! Link packet encoding and decoding.
//!
//! Three packet types ride the raw datagram service. All multi-byte fields
//! are big-endian (network byte order); the first byte identifies the type.
//!
//! | Byte | Packet | Body |
//! |------|--------|------|
//! | 16 | Handshake | `id_sender:u32 . id_reply:u32` |
//! | 17 | Sync | `counter:u8 . recv_cursor:u32 . sent_cursor:u32 . requested:u32*` |
//! | 18 | Data | `seq:u32 . payload` |

use crate::error::PacketError;
use crate::{MAX_DATA_SIZE, WINDOW};

/// First byte of a link handshake packet.
pub const PACKET_HANDSHAKE: u8 = 16;

/// First byte of a link sync packet.
pub const PACKET_SYNC: u8 = 17;

/// First byte of a link data packet.
pub const PACKET_DATA: u8 = 18;

const HANDSHAKE_LEN: usize = 1 + 4 + 4;
const SYNC_HEADER_LEN: usize = 1 + 1 + 4 + 4;
const DATA_HEADER_LEN: usize = 1 + 4;

/// A decoded link packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPacket {
    /// Connection establishment: the sender's handshake id and, when
    /// replying, an echo of the id it is answering (zero on first contact).
    Handshake {
        /// Handshake id chosen by the sender
        id_sender: u32,
        /// Echoed id of the packet being answered, zero for the opening shot
        id_reply: u32,
    },
    /// Periodic control packet carrying both cursors and retransmit requests.
    Sync {
        /// Anti-replay counter, strictly increasing mod 256
        counter: u8,
        /// Sender's receive cursor: everything before it was delivered
        recv_cursor: u32,
        /// Sender's send cursor: next fresh sequence number it will emit
        sent_cursor: u32,
        /// Missing sequence numbers the sender wants retransmitted
        requested: Vec<u32>,
    },
    /// One record of application data.
    Data {
        /// Sequence number of this record
        seq: u32,
        /// Record payload, `1..=MAX_DATA_SIZE` bytes
        payload: Vec<u8>,
    },
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

impl LinkPacket {
    /// Decode a packet from raw datagram bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] describing the malformation; callers drop
    /// such packets without touching connection state.
    pub fn parse(data: &[u8]) -> Result<Self, PacketError> {
        let Some(&kind) = data.first() else {
            return Err(PacketError::TooShort(0));
        };
        match kind {
            PACKET_HANDSHAKE => {
                if data.len() != HANDSHAKE_LEN {
                    return Err(PacketError::BadLength(data.len()));
                }
                Ok(Self::Handshake {
                    id_sender: read_u32(data, 1),
                    id_reply: read_u32(data, 5),
                })
            }
            PACKET_SYNC => {
                if data.len() < SYNC_HEADER_LEN
                    || data.len() > SYNC_HEADER_LEN + 4 * WINDOW
                    || (data.len() - SYNC_HEADER_LEN) % 4 != 0
                {
                    return Err(PacketError::BadLength(data.len()));
                }
                let requested = data[SYNC_HEADER_LEN..]
                    .chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok(Self::Sync {
                    counter: data[1],
                    recv_cursor: read_u32(data, 2),
                    sent_cursor: read_u32(data, 6),
                    requested,
                })
            }
            PACKET_DATA => {
                if data.len() <= DATA_HEADER_LEN {
                    return Err(PacketError::TooShort(data.len()));
                }
                let payload_len = data.len() - DATA_HEADER_LEN;
                if payload_len > MAX_DATA_SIZE {
                    return Err(PacketError::OversizedPayload(payload_len));
                }
                Ok(Self::Data {
                    seq: read_u32(data, 1),
                    payload: data[DATA_HEADER_LEN..].to_vec(),
                })
            }
            other => Err(PacketError::UnknownType(other)),
        }
    }

    /// Encode the packet for the wire.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Handshake {
                id_sender,
                id_reply,
            } => {
                let mut out = Vec::with_capacity(HANDSHAKE_LEN);
                out.push(PACKET_HANDSHAKE);
                out.extend_from_slice(&id_sender.to_be_bytes());
                out.extend_from_slice(&id_reply.to_be_bytes());
                out
            }
            Self::Sync {
                counter,
                recv_cursor,
                sent_cursor,
                requested,
            } => {
                debug_assert!(requested.len() <= WINDOW);
                let mut out = Vec::with_capacity(SYNC_HEADER_LEN + 4 * requested.len());
                out.push(PACKET_SYNC);
                out.push(*counter);
                out.extend_from_slice(&recv_cursor.to_be_bytes());
                out.extend_from_slice(&sent_cursor.to_be_bytes());
                for seq in requested {
                    out.extend_from_slice(&seq.to_be_bytes());
                }
                out
            }
            Self::Data { seq, payload } => {
                debug_assert!(!payload.is_empty() && payload.len() <= MAX_DATA_SIZE);
                let mut out = Vec::with_capacity(DATA_HEADER_LEN + payload.len());
                out.push(PACKET_DATA);
                out.extend_from_slice(&seq.to_be_bytes());
                out.extend_from_slice(payload);
                out
            }
        }
    }
}
