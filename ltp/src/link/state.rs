use crate::managed::{Arena, Key, Queue};
use crate::time::Timer;
use crate::wire::{Channel, SeqNumber, SyncCode, MAX_PAYLOAD_LEN};

use super::{Config, Error, Result, Stats};
use super::control::Control;
use super::packet::Packet;
use super::sync::Sync;

/// The packet currently being serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InFlight {
    /// A packet from the send queue.
    Queued(Key),
    /// An acknowledgment synthesized without any slot.
    Ack,
    /// A handshake octet, also held outside the arena.
    Sync(SyncCode),
}

/// All state of a link that is shared between the task, the tick source and the application.
pub(crate) struct State<const N: usize> {
    pub(crate) config: Config,
    pub(crate) arena: Arena<Packet, N>,
    /// Not yet transmitted, in transmission order.
    pub(crate) send_queue: Queue,
    /// Transmitted and awaiting acknowledgment, by ascending sequence number.
    pub(crate) unacked: Queue,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) ack_timer: Timer,
    pub(crate) retransmit_timer: Timer,
    pub(crate) sync: Sync,
    /// The sequence number of the next newly sequenced packet.
    pub(crate) tx_seq: SeqNumber,
    /// The sequence number expected from the peer, which is also the acknowledgment to send.
    pub(crate) rx_seq: SeqNumber,
    pub(crate) last_ack_sent: SeqNumber,
    pub(crate) last_ack_received: SeqNumber,
    pub(crate) tx_window: u8,
    pub(crate) tx_mtu: u8,
    pub(crate) window_stalled: bool,
    pub(crate) control: Control,
    pub(crate) stats: Stats,
}

impl<const N: usize> State<N> {
    pub(crate) fn new(config: Config) -> Self {
        State {
            config,
            arena: Arena::new(),
            send_queue: Queue::new(),
            unacked: Queue::new(),
            in_flight: None,
            ack_timer: Timer::Idle,
            retransmit_timer: Timer::Idle,
            sync: Sync::new(config.sync_period),
            tx_seq: SeqNumber::default(),
            rx_seq: SeqNumber::default(),
            last_ack_sent: SeqNumber::default(),
            last_ack_received: SeqNumber::default(),
            tx_window: config.tx_window,
            tx_mtu: MAX_PAYLOAD_LEN as u8,
            window_stalled: false,
            control: Control::default(),
            stats: Stats::default(),
        }
    }

    /// Tear down both directions and restart the handshake.
    ///
    /// Every queued, unacknowledged or in-flight packet is discarded. Statistics survive.
    pub(crate) fn reset(&mut self) {
        net_debug!("LTP{}: link reset", self.config.id);

        self.send_queue.clear(&mut self.arena);
        self.unacked.clear(&mut self.arena);
        if let Some(InFlight::Queued(key)) = self.in_flight.take() {
            self.arena.remove(key);
        }

        self.ack_timer.stop();
        self.retransmit_timer.stop();
        self.sync = Sync::new(self.config.sync_period);
        self.tx_seq = SeqNumber::default();
        self.rx_seq = SeqNumber::default();
        self.last_ack_sent = SeqNumber::default();
        self.last_ack_received = SeqNumber::default();
        self.tx_window = self.config.tx_window;
        self.tx_mtu = MAX_PAYLOAD_LEN as u8;
        self.window_stalled = false;
        self.control = Control::default();
        self.stats.resets = self.stats.resets.wrapping_add(1);
    }

    /// Advance all timers by one millisecond.
    pub(crate) fn tick(&mut self) {
        self.ack_timer.tick();
        self.retransmit_timer.tick();
        self.sync.timer.tick();
    }

    /// Queue a packet at the back of the send queue.
    pub(crate) fn enqueue(&mut self, packet: Packet) -> Result<Key> {
        match self.arena.insert(packet) {
            Ok(key) => {
                self.send_queue.push_back(&mut self.arena, key);
                Ok(key)
            },
            Err(_) => {
                net_debug!("LTP{}: packet arena exhausted", self.config.id);
                self.stats.alloc_failures = self.stats.alloc_failures.wrapping_add(1);
                Err(Error::Exhausted)
            },
        }
    }

    /// Check an application payload against the current transmit limits.
    pub(crate) fn check_payload(&self, channel: Channel, len: usize) -> Result<()> {
        if channel.is_link_control() {
            return Err(Error::Illegal);
        }

        if len == 0 || len > usize::from(self.tx_mtu) {
            return Err(Error::BadSize);
        }

        Ok(())
    }

    /// Retire or mark every packet that `same` considers the same logical update.
    ///
    /// A match that never went out is removed from the send queue and freed. A match that already
    /// carries a sequence number must still be delivered to keep the sequence intact, so it is
    /// only marked as superseded.
    pub(crate) fn replace<F>(&mut self, channel: Channel, mut same: F)
    where
        F: FnMut(&[u8]) -> bool,
    {
        let mut cursor = self.send_queue.front();
        while let Some(key) = cursor {
            cursor = self.arena.next(key);
            match self.matches(key, channel, &mut same) {
                Some(false) => {
                    self.send_queue.unlink(&mut self.arena, key);
                    self.arena.remove(key);
                    self.stats.replaced = self.stats.replaced.wrapping_add(1);
                    net_trace!("LTP{}: replaced queued packet on {}", self.config.id, channel);
                },
                Some(true) => self.supersede(key),
                None => (),
            }
        }

        let mut cursor = self.unacked.front();
        while let Some(key) = cursor {
            cursor = self.arena.next(key);
            if self.matches(key, channel, &mut same).is_some() {
                self.supersede(key);
            }
        }

        if let Some(InFlight::Queued(key)) = self.in_flight {
            if self.matches(key, channel, &mut same).is_some() {
                self.supersede(key);
            }
        }
    }

    /// Whether a packet matches, and if so whether it was sequenced.
    fn matches<F>(&self, key: Key, channel: Channel, same: &mut F) -> Option<bool>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let packet = self.arena.get(key)?;
        if packet.channel != channel || packet.superseded {
            return None;
        }

        if same(packet.payload.as_slice()) {
            Some(packet.seq.is_some())
        } else {
            None
        }
    }

    fn supersede(&mut self, key: Key) {
        if let Some(packet) = self.arena.get_mut(key) {
            packet.superseded = true;
            self.stats.superseded = self.stats.superseded.wrapping_add(1);
        }
    }

    /// The number of packets held by the link, in any queue or in flight.
    pub(crate) fn pending(&self) -> usize {
        self.arena.len()
    }
}
