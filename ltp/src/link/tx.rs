use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::managed::Key;
use crate::serial::TxStream;
use crate::wire::{slip::Encoder, PacketRepr, SeqNumber};

use super::LinkState;
use super::packet::{emit_header, emit_sync, FrameBuf};
use super::state::{InFlight, State};

/// Task local progress of the frame being written to the line.
pub(crate) struct Transmitter {
    encoder: Encoder,
    frame: FrameBuf,
    active: bool,
}

impl Transmitter {
    pub(crate) fn new() -> Self {
        Transmitter {
            encoder: Encoder::new(),
            frame: FrameBuf::new(),
            active: false,
        }
    }

    /// Write frames until the line is full or nothing is left to send.
    ///
    /// The frame content is copied out under the lock, the byte stuffing then runs without it.
    pub(crate) fn transmit<M, T, const N: usize>(&mut self, out: &mut T, state: &LinkState<M, N>)
    where
        M: RawMutex,
        T: TxStream + ?Sized,
    {
        loop {
            if !self.active {
                if out.space() < 3 {
                    break;
                }

                let frame = &mut self.frame;
                if !state.with(|state| state.schedule(frame)) {
                    break;
                }
                self.active = true;
            }

            if !self.encoder.encode(&self.frame, out) {
                break;
            }

            self.active = false;
            state.with(State::complete);
        }
    }

    /// Abandon the current frame.
    pub(crate) fn reset(&mut self) {
        self.encoder.reset();
        self.frame.clear();
        self.active = false;
    }
}

impl<const N: usize> State<N> {
    /// Pick the next frame and write its content, returns `false` if there is nothing to send.
    pub(crate) fn schedule(&mut self, frame: &mut FrameBuf) -> bool {
        debug_assert!(self.in_flight.is_none());

        if self.ack_timer.is_expired() {
            let ack = self.stamp_ack();
            net_trace!("LTP{}: tx ack {}", self.config.id, ack);
            if emit_header(PacketRepr::ack_only(ack), frame).is_ok() {
                self.in_flight = Some(InFlight::Ack);
                return true;
            }
        }

        if let Some(code) = self.sync.pending.pop_front() {
            net_trace!("LTP{}: tx {:?}", self.config.id, code);
            if emit_sync(code, frame).is_ok() {
                self.in_flight = Some(InFlight::Sync(code));
                return true;
            }
        }

        if self.retransmit_timer.is_expired() {
            let count = self.unacked.len() as u32;
            net_debug!("LTP{}: retransmit timeout, resending {}", self.config.id, count);
            self.send_queue.append_front(&mut self.arena, &mut self.unacked);
            self.stats.retransmitted = self.stats.retransmitted.wrapping_add(count);
            self.restart_retransmit_timer();
        }

        while let Some(key) = self.next_sendable() {
            self.send_queue.unlink(&mut self.arena, key);

            let tx_seq = self.tx_seq;
            let (seq, fresh) = match self.arena.get_mut(key) {
                Some(queued) => {
                    let fresh = queued.seq.is_none();
                    (*queued.seq.get_or_insert(tx_seq), fresh)
                },
                None => continue,
            };
            if fresh {
                self.tx_seq = tx_seq.next();
            }
            let ack = self.stamp_ack();

            let emitted = match self.arena.get(key) {
                Some(queued) => queued.emit(ack, frame).map(|()| queued.channel),
                None => continue,
            };

            match emitted {
                Ok(_channel) => {
                    net_trace!("LTP{}: tx {} seq={} ack={}", self.config.id, _channel, seq, ack);
                    self.in_flight = Some(InFlight::Queued(key));
                    return true;
                },
                Err(_err) => {
                    net_debug!("LTP{}: dropping unsendable packet: {}", self.config.id, _err);
                    self.arena.remove(key);
                    self.stats.malformed = self.stats.malformed.wrapping_add(1);
                },
            }
        }

        false
    }

    /// The frame last scheduled has been written completely.
    pub(crate) fn complete(&mut self) {
        match self.in_flight.take() {
            None => (),
            Some(InFlight::Ack) => {
                self.stats.acks_sent = self.stats.acks_sent.wrapping_add(1);
            },
            Some(InFlight::Sync(_)) => (),
            Some(InFlight::Queued(key)) => {
                let seq = match self.arena.get(key) {
                    Some(packet) => packet.seq,
                    None => return,
                };

                match seq {
                    Some(seq) => {
                        self.stats.transmitted = self.stats.transmitted.wrapping_add(1);
                        if self.is_outstanding(seq) {
                            self.unacked.push_back(&mut self.arena, key);
                            if self.retransmit_timer.is_idle() {
                                self.restart_retransmit_timer();
                            }
                        } else {
                            // Acknowledged while it was still being written.
                            self.arena.remove(key);
                        }
                    },
                    None => {
                        self.arena.remove(key);
                    },
                }
            },
        }
    }
}

impl<const N: usize> State<N> {
    /// Retire acknowledged packets.
    ///
    /// The acknowledgment names the next sequence number the peer expects, confirming every packet
    /// before it. Values outside the range of outstanding numbers are stale or corrupt and ignored.
    pub(crate) fn handle_ack(&mut self, ack: SeqNumber) {
        let outstanding = self.tx_seq.distance_from(self.last_ack_received);
        let advance = ack.distance_from(self.last_ack_received);

        if advance > outstanding {
            net_debug!("LTP{}: ignoring ack {} outside of window", self.config.id, ack);
            return;
        }

        if advance == 0 {
            return;
        }

        self.last_ack_received = ack;
        self.window_stalled = false;

        let mut retired = 0u32;
        while let Some(key) = self.unacked.front() {
            if self.is_key_outstanding(key) {
                break;
            }
            self.unacked.pop_front(&mut self.arena);
            self.arena.remove(key);
            retired += 1;
        }

        // Copies already moved back for retransmission need not go out again.
        while let Some(key) = self.send_queue.front() {
            let sequenced = self.arena.get(key).map_or(false, |packet| packet.seq.is_some());
            if !sequenced || self.is_key_outstanding(key) {
                break;
            }
            self.send_queue.pop_front(&mut self.arena);
            self.arena.remove(key);
            retired += 1;
        }

        net_trace!("LTP{}: ack {} retired {}", self.config.id, ack, retired);
        self.stats.acknowledged = self.stats.acknowledged.wrapping_add(retired);
        self.restart_retransmit_timer();
    }

    /// Arm the retransmission timer while anything awaits acknowledgment, otherwise stop it.
    pub(crate) fn restart_retransmit_timer(&mut self) {
        if self.unacked.is_empty() {
            self.retransmit_timer.stop();
        } else {
            self.retransmit_timer.arm(self.config.retransmit_period);
        }
    }

    /// Take the acknowledgment for an outgoing header, which makes a delayed one unnecessary.
    fn stamp_ack(&mut self) -> SeqNumber {
        self.ack_timer.stop();
        self.last_ack_sent = self.rx_seq;
        self.rx_seq
    }

    /// Query whether a sequence number was sent but not yet acknowledged.
    fn is_outstanding(&self, seq: SeqNumber) -> bool {
        seq.distance_from(self.last_ack_received) < self.tx_seq.distance_from(self.last_ack_received)
    }

    fn is_key_outstanding(&self, key: Key) -> bool {
        match self.arena.get(key).and_then(|packet| packet.seq) {
            Some(seq) => self.is_outstanding(seq),
            None => false,
        }
    }

    fn window_full(&self) -> bool {
        self.tx_seq.distance_from(self.last_ack_received) >= self.tx_window
    }

    /// The packet to send next, without taking it from the queue.
    ///
    /// Nothing is sent before the handshake completes, and a new sequence number needs room in the
    /// window.
    fn next_sendable(&mut self) -> Option<Key> {
        if !self.is_garrulous() {
            return None;
        }

        let head = self.send_queue.front()?;
        let seq = self.arena.get(head)?.seq;

        let stalled = seq.is_none() && self.window_full();
        if stalled && !self.window_stalled {
            net_trace!("LTP{}: window full", self.config.id);
            self.stats.window_stalls = self.stats.window_stalls.wrapping_add(1);
        }
        self.window_stalled = stalled;

        if stalled {
            None
        } else {
            Some(head)
        }
    }
}
