use crate::wire::{control, Channel, ControlRepr};

use super::{Buffer, Error, Payload, Result};
use super::packet::Packet;
use super::state::State;

/// Progress of the configuration exchange on channel 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct Control {
    /// The peer announced its receive parameters.
    pub(crate) got_conf_ind: bool,
    /// The peer confirmed ours.
    pub(crate) got_conf_res: bool,
    /// Our announcement still needs a slot in the send queue.
    pub(crate) conf_ind_pending: bool,
    /// The confirmation of the peer's announcement still needs a slot.
    pub(crate) conf_res_pending: bool,
}

impl Control {
    pub(crate) fn is_configured(&self) -> bool {
        self.got_conf_ind && self.got_conf_res
    }
}

impl<const N: usize> State<N> {
    /// Announce the local receive parameters, if link control is enabled.
    pub(crate) fn control_start(&mut self) {
        if !self.config.link_control {
            return;
        }

        self.control.conf_ind_pending = true;
        self.control_retry();
    }

    /// Queue the parts of the configuration exchange that found no free slot before.
    ///
    /// A full arena is waited out silently, every failed attempt would count as exhaustion.
    pub(crate) fn control_retry(&mut self) {
        if self.control.conf_ind_pending && !self.arena.is_full() {
            let conf = ControlRepr::ConfInd {
                rx_window: self.config.rx_window,
                rx_mtu: self.config.rx_mtu,
            };
            self.control.conf_ind_pending = self.queue_control(conf).is_err();
        }

        if self.control.conf_res_pending && !self.arena.is_full() {
            let conf = ControlRepr::ConfRes {
                rx_window: self.tx_window,
                rx_mtu: self.tx_mtu,
            };
            self.control.conf_res_pending = self.queue_control(conf).is_err();
        }
    }

    /// Queue a link control message on channel 0.
    pub(crate) fn queue_control(&mut self, repr: ControlRepr) -> Result<()> {
        let mut buffer = Buffer::new();
        buffer.resize_default(repr.buffer_len())
            .map_err(|_| Error::BadSize)?;
        repr.emit(control::new_unchecked_mut(&mut buffer[..]));
        self.enqueue(Packet::new(Channel::LINK_CONTROL, Payload::Owned(buffer)))?;
        Ok(())
    }

    /// Handle a link control message from the peer.
    pub(crate) fn control_receive(&mut self, payload: &[u8]) {
        let id = self.config.id;
        let repr = match control::new_checked(payload).and_then(ControlRepr::parse) {
            Ok(repr) => repr,
            Err(_err) => {
                net_debug!("LTP{}: bad link control message: {}", id, _err);
                self.stats.malformed = self.stats.malformed.wrapping_add(1);
                return;
            },
        };

        net_debug!("LTP{}: rx {}", id, repr);
        match repr {
            ControlRepr::ConfInd { rx_window, rx_mtu } => {
                self.tx_window = self.config.tx_window.min(rx_window);
                self.tx_mtu = rx_mtu;
                self.control.got_conf_ind = true;
                self.control.conf_res_pending = true;
                self.control_retry();
            },
            ControlRepr::ConfRes { .. } => {
                self.control.got_conf_res = true;
            },
            ControlRepr::PingReq => {
                if self.queue_control(ControlRepr::PingCfm).is_ok() {
                    self.stats.pings_answered = self.stats.pings_answered.wrapping_add(1);
                }
            },
            ControlRepr::PingCfm => {
                self.stats.ping_replies = self.stats.ping_replies.wrapping_add(1);
            },
        }

        if self.control.is_configured() {
            net_debug!("LTP{}: configured, window {} mtu {}", id, self.tx_window, self.tx_mtu);
        }
    }
}
