//! Session-layer scenarios: establishment, encrypted transfer, lifecycle.

use tether_integration_tests::two_node::{NodePair, peer};
use tether_core::{SessionError, SessionRead, SessionStatus};
use tether_transport::{MAX_DATA_SIZE, PACKET_SYNC};

#[test]
fn session_establishes_both_ways() {
    let mut pair = NodePair::new();
    let (a_sid, b_sid) = pair.establish(60);

    assert_eq!(pair.a.status(a_sid), Some(SessionStatus::Established));
    assert_eq!(pair.b.status(b_sid), Some(SessionStatus::Established));
}

#[test]
fn encrypted_records_flow_both_directions() {
    let mut pair = NodePair::new();
    let (a_sid, b_sid) = pair.establish(60);

    pair.a.write_encrypted(a_sid, b"hello").unwrap();
    pair.b.write_encrypted(b_sid, b"world").unwrap();
    for _ in 0..20 {
        pair.tick();
    }

    assert_eq!(
        pair.b.read_decrypted(b_sid),
        SessionRead::Packet(b"hello".to_vec())
    );
    assert_eq!(
        pair.a.read_decrypted(a_sid),
        SessionRead::Packet(b"world".to_vec())
    );
    assert_eq!(pair.a.read_decrypted(a_sid), SessionRead::Empty);
    assert_eq!(pair.b.read_decrypted(b_sid), SessionRead::Empty);
}

#[test]
fn many_records_arrive_in_order() {
    let mut pair = NodePair::new();
    let (a_sid, b_sid) = pair.establish(60);

    let mut sent = 0u32;
    let mut received = 0u32;
    let mut ticks = 0u32;
    while received < 100 {
        while sent < 100 {
            match pair.a.write_encrypted(a_sid, &sent.to_be_bytes()) {
                Ok(()) => sent += 1,
                Err(SessionError::Link(tether_transport::LinkError::QueueFull)) => break,
                Err(other) => panic!("unexpected write failure: {other}"),
            }
        }
        pair.tick();
        loop {
            match pair.b.read_decrypted(b_sid) {
                SessionRead::Packet(record) => {
                    assert_eq!(record, &received.to_be_bytes());
                    received += 1;
                }
                SessionRead::Discarded => panic!("record discarded on clean link"),
                SessionRead::Empty => break,
            }
        }
        ticks += 1;
        assert!(ticks < 5_000, "stream stalled after {received} records");
    }
}

#[test]
fn record_size_ceiling_enforced() {
    let mut pair = NodePair::new();
    let (a_sid, _b_sid) = pair.establish(60);

    // largest record that fits once framed and sealed
    let max = vec![0u8; MAX_DATA_SIZE - 17];
    pair.a.write_encrypted(a_sid, &max).unwrap();

    let too_big = vec![0u8; MAX_DATA_SIZE - 16];
    assert!(matches!(
        pair.a.write_encrypted(a_sid, &too_big),
        Err(SessionError::PayloadSize { .. })
    ));
    assert!(matches!(
        pair.a.write_encrypted(a_sid, &[]),
        Err(SessionError::PayloadSize { len: 0 })
    ));
}

#[test]
fn refuse_inbound_tears_down_link() {
    let mut pair = NodePair::new();
    let b_pub = *pair.b.identity().public_key();
    pair.a.connect(&b_pub, peer(2)).unwrap();

    let mut offer = None;
    for _ in 0..60 {
        pair.tick();
        if let Some(hello) = pair.b.next_inbound() {
            offer = Some(hello);
            break;
        }
    }
    let hello = offer.expect("inbound offer surfaced");
    let link_id = hello.link_id;
    pair.b.refuse_inbound(&hello);
    assert_eq!(pair.b.endpoint().status(link_id), None);
}

#[test]
fn session_times_out_when_peer_vanishes() {
    let mut pair = NodePair::new();
    let (a_sid, _b_sid) = pair.establish(60);

    // sever b entirely: its sync packets stop reaching a
    pair.net
        .set_filter(|from, _to, data| !(from == peer(2) && data[0] == PACKET_SYNC));

    for _ in 0..(12 * 20) {
        pair.tick();
    }
    assert_eq!(pair.a.status(a_sid), Some(SessionStatus::TimedOut));

    // the application reacts by killing; a second kill reports failure
    pair.a.kill(a_sid).unwrap();
    assert!(pair.a.kill(a_sid).is_err());
}

#[test]
fn one_shot_requests_cross_without_session() {
    let mut pair = NodePair::new();
    let b_pub = *pair.b.identity().public_key();

    pair.a
        .send_request(peer(2), &b_pub, 32, b"friend request body")
        .unwrap();
    pair.tick();

    let request = pair.b.recv_request().expect("request delivered");
    assert_eq!(request.sender, *pair.a.identity().public_key());
    assert_eq!(request.kind, 32);
    assert_eq!(request.body, b"friend request body");
    assert_eq!(request.from, peer(1));
}
