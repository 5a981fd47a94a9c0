use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::link::{Application, Config, Error, FnHandler, Link, LinkState, SyncState};
use crate::serial::{transfer_lossy, PrngLoss, Ring, RxStream};
use crate::wire::{packet, slip, Channel, PacketRepr, SeqNumber, SyncCode};

type State = LinkState<CriticalSectionRawMutex, 16>;
type Wire = Ring<1024>;

const SPEED: u8 = 0x10;

fn ch(number: u8) -> Channel {
    Channel::new(number).unwrap()
}

#[derive(Default)]
struct Recorder {
    packets: Vec<(Channel, Vec<u8>)>,
    active: usize,
    resets: usize,
}

impl Application for Recorder {
    fn packet_received(&mut self, channel: Channel, payload: &[u8]) {
        self.packets.push((channel, payload.to_vec()));
    }

    fn link_active(&mut self) {
        self.active += 1;
    }

    fn link_reset(&mut self) {
        self.resets += 1;
    }
}

/// Write one frame onto a wire.
fn inject(wire: &mut Wire, content: &[u8]) {
    let mut encoder = slip::Encoder::new();
    assert!(encoder.encode(content, wire));
}

fn inject_header(wire: &mut Wire, repr: PacketRepr, payload: &[u8]) {
    let mut content = vec![0; repr.buffer_len()];
    repr.emit(packet::new_unchecked_mut(&mut content));
    content[2..].copy_from_slice(payload);
    inject(wire, &content);
}

/// Take every complete frame off a wire.
fn frames(wire: &mut Wire) -> Vec<Vec<u8>> {
    let mut decoder = slip::Decoder::new();
    let mut frames = Vec::new();
    let mut current = Vec::new();
    while let Some(byte) = wire.read() {
        match decoder.decode(byte) {
            Some(slip::Token::Byte(byte)) => current.push(byte),
            Some(slip::Token::End) if !current.is_empty() => {
                frames.push(core::mem::take(&mut current));
            },
            _ => (),
        }
    }
    frames
}

fn headers(frames: &[Vec<u8>]) -> Vec<PacketRepr> {
    frames.iter()
        .filter(|frame| frame.len() >= 2)
        .map(|frame| PacketRepr::parse(packet::new_unchecked(frame)).unwrap())
        .collect()
}

/// Bring a single link into the active state by playing the peer's part.
fn activate(link: &mut Link<'_, CriticalSectionRawMutex, 16>, app: &mut Recorder) -> Wire {
    let mut rx = Wire::new();
    let mut tx = Wire::new();
    inject(&mut rx, &[SyncCode::SyncResp.into()]);
    inject(&mut rx, &[SyncCode::ConfResp.into()]);
    link.poll(&mut rx, &mut tx, app);
    assert!(link.state().is_active());
    assert_eq!(app.active, 1);
    // Drop the handshake chatter.
    frames(&mut tx);
    tx
}

struct Pair<'a> {
    a: Link<'a, CriticalSectionRawMutex, 16>,
    b: Link<'a, CriticalSectionRawMutex, 16>,
    a_to_b: Wire,
    b_to_a: Wire,
    line_a: Wire,
    line_b: Wire,
    loss: PrngLoss,
}

impl<'a> Pair<'a> {
    fn new(a: &'a State, b: &'a State, loss: PrngLoss) -> Self {
        Pair {
            a: Link::new(a),
            b: Link::new(b),
            a_to_b: Wire::new(),
            b_to_a: Wire::new(),
            line_a: Wire::new(),
            line_b: Wire::new(),
            loss,
        }
    }

    /// One millisecond of both links and the wire between them.
    fn step(&mut self, app_a: &mut Recorder, app_b: &mut Recorder) {
        self.a.state().tick();
        self.b.state().tick();
        self.a.poll(&mut self.line_a, &mut self.a_to_b, app_a);
        self.b.poll(&mut self.line_b, &mut self.b_to_a, app_b);
        transfer_lossy(&mut self.a_to_b, &mut self.line_b, &mut self.loss);
        transfer_lossy(&mut self.b_to_a, &mut self.line_a, &mut self.loss);
    }

    fn run_until(
        &mut self,
        millis: usize,
        app_a: &mut Recorder,
        app_b: &mut Recorder,
        mut done: impl FnMut(&Recorder, &Recorder) -> bool,
    ) -> bool {
        for _ in 0..millis {
            self.step(app_a, app_b);
            if done(app_a, app_b) {
                return true;
            }
        }
        false
    }
}

/// Speed commands addressed to the same locomotive.
fn same_loco(addr: u8) -> impl FnMut(&[u8]) -> bool {
    move |data| data.len() > 1 && data[0] == SPEED && data[1] == addr
}

fn both_active(a: &Recorder, b: &Recorder) -> bool {
    a.active > 0 && b.active > 0
}

#[test]
fn invalid_config() {
    let config = Config { tx_window: 0, ..Config::default() };
    assert!(matches!(State::new(config), Err(Error::Illegal)));
    let config = Config { rx_mtu: 128, ..Config::default() };
    assert!(matches!(State::new(config), Err(Error::Illegal)));
    let config = Config { keep_alive_limit: 0, ..Config::default() };
    assert!(matches!(State::new(config), Err(Error::Illegal)));
}

#[test]
fn handshake_simultaneous() {
    let a = State::new(Config { id: 1, ..Config::default() }).unwrap();
    let b = State::new(Config { id: 2, ..Config::default() }).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());

    assert!(pair.run_until(1000, &mut app_a, &mut app_b, both_active));
    assert_eq!(a.sync_state(), SyncState::Garrulous);
    assert_eq!(b.sync_state(), SyncState::Garrulous);
}

#[test]
fn handshake_one_sided_delay() {
    let a = State::new(Config::default()).unwrap();
    let b = State::new(Config::default()).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());

    // The first side shouts into the void for a while.
    for _ in 0..750 {
        a.tick();
        pair.a.poll(&mut pair.line_a, &mut pair.a_to_b, &mut app_a);
        pair.a_to_b.clear();
    }
    assert_eq!(a.sync_state(), SyncState::Shy);

    assert!(pair.run_until(1000, &mut app_a, &mut app_b, both_active));
    assert_eq!(app_a.resets + app_b.resets, 0);
}

#[test]
fn sync_resp_makes_curious() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let (mut rx, mut tx) = (Wire::new(), Wire::new());
    let mut app = Recorder::default();

    inject(&mut rx, &[0xaa]);
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(state.sync_state(), SyncState::Curious);
    assert_eq!(frames(&mut tx), [vec![0xa5]]);
}

#[test]
fn window_stall() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    for speed in 0..4 {
        state.send(ch(1), &[SPEED, 3, speed, 1]).unwrap();
    }
    link.poll(&mut rx, &mut tx, &mut app);
    let sent = headers(&frames(&mut tx));
    let seqs: Vec<_> = sent.iter().map(|repr| repr.seq_number).collect();
    assert_eq!(seqs, [SeqNumber::new(0), SeqNumber::new(1), SeqNumber::new(2)]);
    assert_eq!(state.stats().window_stalls, 1);

    // Still stalled.
    link.poll(&mut rx, &mut tx, &mut app);
    assert!(frames(&mut tx).is_empty());

    // Acknowledge the first packet only.
    inject_header(&mut rx, PacketRepr::ack_only(SeqNumber::new(1)), &[]);
    link.poll(&mut rx, &mut tx, &mut app);
    let sent = headers(&frames(&mut tx));
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].seq_number, SeqNumber::new(3));
    assert_eq!(state.stats().acknowledged, 1);
}

#[test]
fn out_of_order_is_reacked() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    let repr = PacketRepr {
        channel: ch(1),
        seq_number: SeqNumber::new(1),
        ack_number: SeqNumber::new(0),
        payload_len: 2,
    };
    inject_header(&mut rx, repr, &[0x01, 0x02]);
    link.poll(&mut rx, &mut tx, &mut app);

    assert!(app.packets.is_empty());
    assert_eq!(frames(&mut tx), [vec![0x00, 0x00]]);
    assert_eq!(state.stats().out_of_sequence, 1);
}

#[test]
fn delayed_ack() {
    let state = State::new(Config { peer_retransmit_period: 40, rx_window: 2, ..Config::default() })
        .unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    let repr = PacketRepr {
        channel: ch(2),
        seq_number: SeqNumber::new(0),
        ack_number: SeqNumber::new(0),
        payload_len: 1,
    };
    inject_header(&mut rx, repr, &[0x42]);
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(app.packets, [(ch(2), vec![0x42])]);
    assert!(frames(&mut tx).is_empty());

    for _ in 0..20 {
        state.tick();
    }
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(frames(&mut tx), [vec![0x01, 0x00]]);
}

#[test]
fn truncated_frame_not_committed() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    // Declares three octets, carries two.
    inject(&mut rx, &[0b01_000_000, 0x03, 0x01, 0x02]);
    link.poll(&mut rx, &mut tx, &mut app);
    assert!(app.packets.is_empty());
    assert_eq!(state.stats().malformed, 1);
    assert_eq!(state.stats().accepted, 0);

    // The retransmission goes through.
    inject(&mut rx, &[0b01_000_000, 0x03, 0x01, 0x02, 0x03]);
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(app.packets, [(ch(1), vec![0x01, 0x02, 0x03])]);
}

#[test]
fn escaped_payload_delivered() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    inject(&mut rx, &[0b11_000_000, 0x02, slip::FRAME, slip::ESCAPE]);
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(app.packets, [(ch(3), vec![slip::FRAME, slip::ESCAPE])]);
}

#[test]
fn keep_alive_timeout() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    state.send(ch(1), &[SPEED, 3, 40, 1]).unwrap();
    for _ in 0..1999 {
        state.tick();
        link.poll(&mut rx, &mut tx, &mut app);
        tx.clear();
    }
    assert_eq!(app.resets, 0);

    state.tick();
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(app.resets, 1);
    assert_eq!(state.sync_state(), SyncState::Shy);
    assert_eq!(state.pending(), 0);
    assert_eq!(state.stats().resets, 1);
}

#[test]
fn peer_restart_resets() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    inject(&mut rx, &[SyncCode::Sync.into()]);
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(app.resets, 1);
    assert_eq!(state.sync_state(), SyncState::Shy);
}

#[test]
fn payload_waits_for_handshake() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let (mut rx, mut tx) = (Wire::new(), Wire::new());
    let mut app = Recorder::default();

    state.send(ch(1), &[SPEED, 3, 40, 1]).unwrap();
    for _ in 0..300 {
        state.tick();
        link.poll(&mut rx, &mut tx, &mut app);
    }
    let sent = frames(&mut tx);
    assert!(!sent.is_empty());
    assert!(sent.iter().all(|frame| frame == &[u8::from(SyncCode::Sync)]));
    assert_eq!(state.pending(), 1);
}

#[test]
fn send_checks() {
    let state = State::new(Config::default()).unwrap();
    assert_eq!(state.send(Channel::LINK_CONTROL, &[1]), Err(Error::Illegal));
    assert_eq!(state.send(ch(1), &[]), Err(Error::BadSize));
    assert_eq!(state.send(ch(1), &[0; 128]), Err(Error::BadSize));
    assert_eq!(state.ping(), Err(Error::Illegal));

    for _ in 0..16 {
        state.send_static(ch(1), b"\x10\x03\x28\x01").unwrap();
    }
    assert_eq!(state.send(ch(1), &[1]), Err(Error::Exhausted));
    assert_eq!(state.stats().alloc_failures, 1);
}

#[test]
fn replacing_speed_commands() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let mut app = Recorder::default();
    let mut tx = activate(&mut link, &mut app);
    let mut rx = Wire::new();

    // One goes out and awaits its acknowledgment.
    state.send_replacing(ch(1), &[SPEED, 3, 10, 1], same_loco(3)).unwrap();
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(headers(&frames(&mut tx)).len(), 1);

    // Fill the window so that later commands stay queued.
    state.send(ch(1), &[SPEED, 7, 1, 1]).unwrap();
    state.send(ch(1), &[SPEED, 8, 1, 1]).unwrap();
    link.poll(&mut rx, &mut tx, &mut app);
    assert_eq!(headers(&frames(&mut tx)).len(), 2);

    state.send_replacing(ch(1), &[SPEED, 3, 20, 1], same_loco(3)).unwrap();
    state.send_replacing(ch(1), &[SPEED, 3, 30, 1], same_loco(3)).unwrap();
    let stats = state.stats();
    assert_eq!(stats.replaced, 1);
    // The sent one is marked once, the first queued one is dropped by the second.
    assert_eq!(stats.superseded, 1);
    assert_eq!(state.pending(), 4);

    // Acknowledge everything, only the newest command follows.
    inject_header(&mut rx, PacketRepr::ack_only(SeqNumber::new(3)), &[]);
    link.poll(&mut rx, &mut tx, &mut app);
    let sent = frames(&mut tx);
    assert_eq!(sent.len(), 1);
    assert_eq!(&sent[0][2..], &[SPEED, 3, 30, 1]);
}

#[test]
fn static_and_owned_payloads() {
    static HALT: [u8; 4] = [SPEED, 0, 0, 1];

    let a = State::new(Config::default()).unwrap();
    let b = State::new(Config::default()).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(1000, &mut app_a, &mut app_b, both_active));

    a.send_static(ch(2), &HALT).unwrap();
    let mut owned = crate::link::Buffer::new();
    owned.extend_from_slice(&[SPEED, 5, 60, 0]).unwrap();
    a.send_owned(ch(1), owned).unwrap();

    assert!(pair.run_until(100, &mut app_a, &mut app_b, |_, b| b.packets.len() == 2));
    assert_eq!(app_b.packets, [
        (ch(2), HALT.to_vec()),
        (ch(1), vec![SPEED, 5, 60, 0]),
    ]);

    // Acknowledged eventually, nothing left behind.
    assert!(pair.run_until(5000, &mut app_a, &mut app_b, |_, _| a.pending() == 0));
}

#[test]
fn bidirectional() {
    let a = State::new(Config::default()).unwrap();
    let b = State::new(Config::default()).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(1000, &mut app_a, &mut app_b, both_active));

    for n in 0..10u8 {
        a.send(ch(1), &[n]).unwrap();
        b.send(ch(3), &[n, n]).unwrap();
    }

    assert!(pair.run_until(10_000, &mut app_a, &mut app_b, |a, b| {
        a.packets.len() == 10 && b.packets.len() == 10
    }));
    assert!(app_b.packets.iter().enumerate().all(|(n, (c, p))| *c == ch(1) && p == &[n as u8]));
    assert!(app_a.packets.iter().enumerate().all(|(n, (c, p))| *c == ch(3) && p == &[n as u8, n as u8]));
}

#[test]
fn lossy_delivery_in_order() {
    // Identifiers stay clear of values a frame that lost a header octet could pass for.
    const FIRST: u8 = 0x10;
    const COUNT: u8 = 40;

    let a = State::new(Config { retransmit_period: 200, ..Config::default() }).unwrap();
    let b = State::new(Config { peer_retransmit_period: 200, ..Config::default() }).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::percent(1, 0x5eed));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(5000, &mut app_a, &mut app_b, both_active));

    let mut next = FIRST;
    for _ in 0..60_000 {
        if next < FIRST + COUNT && a.send(ch(1), &[next, 0x11, 0x22]).is_ok() {
            next += 1;
        }
        pair.step(&mut app_a, &mut app_b);
        if app_b.packets.len() == usize::from(COUNT) {
            break;
        }
    }

    // Never duplicated, never reordered.
    let ids: Vec<u8> = app_b.packets.iter().map(|(_, payload)| payload[0]).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    // A reset discards what was queued, otherwise everything arrives.
    if app_a.resets == 0 && app_b.resets == 0 {
        assert_eq!(ids, (FIRST..FIRST + COUNT).collect::<Vec<_>>());
    }
}

#[test]
fn link_control_negotiates() {
    let a = State::new(Config { link_control: true, tx_window: 5, rx_window: 2, rx_mtu: 64, ..Config::default() })
        .unwrap();
    let b = State::new(Config { link_control: true, tx_window: 7, rx_window: 4, rx_mtu: 16, ..Config::default() })
        .unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());

    assert!(pair.run_until(3000, &mut app_a, &mut app_b, |_, _| a.is_configured() && b.is_configured()));
    assert_eq!(a.tx_window(), 4);
    assert_eq!(a.tx_mtu(), 16);
    assert_eq!(b.tx_window(), 2);
    assert_eq!(b.tx_mtu(), 64);

    // The negotiated MTU limits sends.
    assert_eq!(a.send(ch(1), &[0; 17]), Err(Error::BadSize));
    assert!(a.send(ch(1), &[0; 16]).is_ok());

    a.ping().unwrap();
    assert!(pair.run_until(1000, &mut app_a, &mut app_b, |_, _| a.stats().ping_replies == 1));
    assert_eq!(b.stats().pings_answered, 1);
    // Link control never reaches the application.
    let no_control = |app: &Recorder| app.packets.iter().all(|(channel, _)| !channel.is_link_control());
    assert!(no_control(&app_a) && no_control(&app_b));
}

#[test]
fn handshake_with_full_arena() {
    let a = State::new(Config { id: 1, ..Config::default() }).unwrap();
    let b = State::new(Config { id: 2, ..Config::default() }).unwrap();
    for n in 0..16u8 {
        a.send(ch(1), &[n]).unwrap();
    }
    assert_eq!(a.send(ch(1), &[16]), Err(Error::Exhausted));

    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(10_000, &mut app_a, &mut app_b, |a, b| {
        both_active(a, b) && b.packets.len() == 16
    }));
    assert!(app_b.packets.iter().enumerate().all(|(n, (c, p))| *c == ch(1) && p == &[n as u8]));
    assert_eq!(a.stats().alloc_failures, 1);
    assert!(pair.run_until(5000, &mut app_a, &mut app_b, |_, _| a.pending() == 0));
}

#[test]
fn link_control_with_full_arena() {
    let a = State::new(Config { id: 1, link_control: true, ..Config::default() }).unwrap();
    let b = State::new(Config { id: 2, link_control: true, ..Config::default() }).unwrap();
    for n in 0..16u8 {
        a.send(ch(1), &[n]).unwrap();
    }

    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(10_000, &mut app_a, &mut app_b, |_, b| {
        a.is_configured() && b.packets.len() == 16
    }));
    assert!(pair.run_until(1000, &mut app_a, &mut app_b, |_, _| b.is_configured()));
    assert_eq!(a.tx_window(), 1);
    assert_eq!(b.tx_window(), 1);
}

#[test]
fn oversized_payload_skipped() {
    let a = State::new(Config { id: 1, ..Config::default() }).unwrap();
    let b = State::new(Config { id: 2, rx_mtu: 8, ..Config::default() }).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(1000, &mut app_a, &mut app_b, both_active));

    // Without link control the sender does not know the limit of the peer.
    a.send(ch(1), &[0x11; 20]).unwrap();
    a.send(ch(1), &[0x22]).unwrap();
    assert!(pair.run_until(2000, &mut app_a, &mut app_b, |_, b| !b.packets.is_empty()));
    assert_eq!(app_b.packets, [(ch(1), vec![0x22])]);
    assert_eq!(b.stats().oversized, 1);

    assert!(pair.run_until(2000, &mut app_a, &mut app_b, |_, _| a.pending() == 0));
    assert_eq!(a.stats().retransmitted, 0);
}

#[test]
fn external_reset() {
    let a = State::new(Config::default()).unwrap();
    let b = State::new(Config::default()).unwrap();
    let mut pair = Pair::new(&a, &b, PrngLoss::uniform(None, 0));
    let (mut app_a, mut app_b) = (Recorder::default(), Recorder::default());
    assert!(pair.run_until(1000, &mut app_a, &mut app_b, both_active));

    a.send(ch(1), &[1]).unwrap();
    pair.a.reset(&mut app_a);
    assert_eq!(app_a.resets, 1);
    assert_eq!(a.pending(), 0);

    // The restarted side's Sync resets the peer too, then both come back.
    assert!(pair.run_until(2000, &mut app_a, &mut app_b, |a, b| a.active == 2 && b.active == 2));
    assert_eq!(app_b.resets, 1);

    b.send(ch(2), &[2]).unwrap();
    assert!(pair.run_until(100, &mut app_a, &mut app_b, |a, _| !a.packets.is_empty()));
    assert_eq!(app_a.packets, [(ch(2), vec![2])]);
}

#[test]
fn fn_handler() {
    let state = State::new(Config::default()).unwrap();
    let mut link = Link::new(&state);
    let (mut rx, mut tx) = (Wire::new(), Wire::new());
    inject(&mut rx, &[SyncCode::SyncResp.into()]);
    inject(&mut rx, &[SyncCode::ConfResp.into()]);
    inject(&mut rx, &[0b01_000_000, 0x01, 0x7f]);

    let mut seen = Vec::new();
    link.poll(&mut rx, &mut tx, &mut FnHandler(|channel: Channel, payload: &[u8]| {
        seen.push((channel, payload.to_vec()))
    }));
    assert_eq!(seen, [(ch(1), vec![0x7f])]);
}
