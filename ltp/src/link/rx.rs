use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::wire::{self, packet, Channel, PacketRepr, SyncCode, HEADER_LEN};
use crate::wire::slip::{Decoder, Token};

use super::{Buffer, Lifecycle, LinkState};
use super::state::State;

/// What a completed frame asks of the task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Received {
    /// Hand the payload of the receiver to the application.
    Payload(Channel),
    /// Notify the application of a lifecycle change.
    Lifecycle(Lifecycle),
}

/// Task local assembly of the frame being received.
///
/// The header is parsed as soon as its two octets are in, which fixes the frame length. Nothing of
/// the frame takes effect before the closing delimiter confirms that length.
pub(crate) struct Receiver {
    decoder: Decoder,
    header: [u8; HEADER_LEN],
    /// Content octets of the current frame seen so far.
    received: usize,
    repr: Option<wire::Result<PacketRepr>>,
    payload: Buffer,
}

impl Receiver {
    pub(crate) fn new() -> Self {
        Receiver {
            decoder: Decoder::new(),
            header: [0; HEADER_LEN],
            received: 0,
            repr: None,
            payload: Buffer::new(),
        }
    }

    /// The payload of the frame last reported as `Received::Payload`.
    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Process one octet from the line.
    pub(crate) fn receive<M, const N: usize>(&mut self, byte: u8, state: &LinkState<M, N>)
        -> Option<Received>
    where
        M: RawMutex,
    {
        match self.decoder.decode(byte)? {
            Token::Byte(byte) => {
                self.content(byte);
                None
            },
            Token::End => {
                let received = self.end(state);
                self.start_frame();
                received
            },
        }
    }

    /// Forget the current frame.
    pub(crate) fn reset(&mut self) {
        self.decoder.reset();
        self.start_frame();
        self.payload.clear();
    }

    fn start_frame(&mut self) {
        self.received = 0;
        self.repr = None;
    }

    fn content(&mut self, byte: u8) {
        let idx = self.received;
        self.received = self.received.saturating_add(1);

        if idx < HEADER_LEN {
            self.header[idx] = byte;
            if self.received == HEADER_LEN {
                // The previous payload may be read until the next header arrives.
                self.payload.clear();
                self.repr = Some(PacketRepr::parse(packet::new_unchecked(&self.header)));
            }
            return;
        }

        // Octets beyond the declared length are counted but not stored.
        if let Some(Ok(repr)) = self.repr {
            if idx < repr.buffer_len() {
                let _ = self.payload.push(byte);
            }
        }
    }

    fn end<M: RawMutex, const N: usize>(&mut self, state: &LinkState<M, N>) -> Option<Received> {
        match (self.received, self.repr) {
            // Back to back delimiters.
            (0, _) => None,
            (1, _) => state
                .with(|state| state.sync_receive(SyncCode::from(self.header[0])))
                .map(Received::Lifecycle),
            (received, Some(Ok(repr))) if received == repr.buffer_len() => {
                let payload = &self.payload;
                let deliver = state.with(|state| state.receive_frame(repr, payload));
                if deliver {
                    Some(Received::Payload(repr.channel))
                } else {
                    None
                }
            },
            (_received, _) => {
                // Bad header, cut short or overlong. The sender repairs it by retransmission.
                state.with(|state| {
                    net_debug!("LTP{}: dropping frame of {} octets, header {:02x?}",
                        state.config.id, _received, self.header);
                    state.stats.malformed = state.stats.malformed.wrapping_add(1);
                });
                None
            },
        }
    }
}

impl<const N: usize> State<N> {
    /// Process a well framed packet.
    ///
    /// The acknowledgment is processed for every packet, payload or not. A payload in sequence
    /// is acknowledged even when it is not delivered. Returns whether the payload is for the
    /// application.
    pub(crate) fn receive_frame(&mut self, repr: PacketRepr, payload: &[u8]) -> bool {
        self.handle_ack(repr.ack_number);
        self.sync_heard();

        if !repr.has_payload() {
            return false;
        }

        if repr.seq_number != self.rx_seq {
            net_debug!("LTP{}: rx {} out of sequence, expected {}",
                self.config.id, repr, self.rx_seq);
            self.stats.out_of_sequence = self.stats.out_of_sequence.wrapping_add(1);
            // Repeat the expected number right away.
            self.ack_timer.fire();
            return false;
        }

        net_trace!("LTP{}: rx {}", self.config.id, repr);
        self.rx_seq = self.rx_seq.next();
        self.stats.accepted = self.stats.accepted.wrapping_add(1);

        let unacked = self.rx_seq.distance_from(self.last_ack_sent);
        if unacked >= self.config.rx_window {
            self.ack_timer.fire();
        } else if self.ack_timer.is_idle() {
            self.ack_timer.arm(self.config.ack_delay());
        }

        // Consumed in sequence so the stream moves on, but never handed out.
        if repr.payload_len > self.config.rx_mtu {
            net_debug!("LTP{}: rx {} exceeds mtu {}", self.config.id, repr, self.config.rx_mtu);
            self.stats.oversized = self.stats.oversized.wrapping_add(1);
            return false;
        }

        if repr.channel.is_link_control() && self.config.link_control {
            self.control_receive(payload);
            return false;
        }

        self.stats.delivered = self.stats.delivered.wrapping_add(1);
        true
    }
}
