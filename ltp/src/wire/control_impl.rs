use core::fmt;

use super::{Error, Result};

enum_with_unknown! {
    /// Identifies a message of the link control channel.
    pub enum ControlId(u8) {
        /// Announce the local receive parameters.
        ConfInd = 0xa0,
        /// Confirm the parameters adopted for sending.
        ConfRes = 0xa1,
        /// Request an echo.
        PingReq = 0xb0,
        /// The echo.
        PingCfm = 0xb1,
    }
}

byte_wrapper! {
    /// A message on the link control channel.
    #[derive(Debug, PartialEq, Eq)]
    pub struct control([u8]);
}

mod field {
    pub(crate) const ID: usize = 0;
    pub(crate) const RX_WINDOW: usize = 1;
    pub(crate) const RX_MTU: usize = 2;
    pub(crate) const CONF_END: usize = 3;
    pub(crate) const PING_END: usize = 1;
}

impl control {
    /// Imbue a raw octet buffer with control message structure.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// Imbue a mutable octet buffer with control message structure.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Shorthand for a combination of `new_unchecked` and `check_len`.
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        Self::new_unchecked(data).check_len()?;
        Ok(Self::new_unchecked(data))
    }

    /// Ensure that no accessor method will panic if called.
    ///
    /// Configuration messages need the window and MTU octets, all others only the identifier.
    pub fn check_len(&self) -> Result<()> {
        let needed = match self.0.first().copied().map(ControlId::from) {
            None => return Err(Error::Truncated),
            Some(ControlId::ConfInd) | Some(ControlId::ConfRes) => field::CONF_END,
            Some(_) => field::PING_END,
        };

        if self.0.len() < needed {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the message identifier.
    pub fn id(&self) -> ControlId {
        ControlId::from(self.0[field::ID])
    }

    /// Return the receive window of a configuration message.
    pub fn rx_window(&self) -> u8 {
        self.0[field::RX_WINDOW]
    }

    /// Return the receive MTU of a configuration message.
    pub fn rx_mtu(&self) -> u8 {
        self.0[field::RX_MTU]
    }

    /// Set the message identifier.
    pub fn set_id(&mut self, id: ControlId) {
        self.0[field::ID] = id.into();
    }

    /// Set the receive window.
    pub fn set_rx_window(&mut self, value: u8) {
        self.0[field::RX_WINDOW] = value;
    }

    /// Set the receive MTU.
    pub fn set_rx_mtu(&mut self, value: u8) {
        self.0[field::RX_MTU] = value;
    }
}

/// A high-level representation of a link control message.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Repr {
    /// The sender's receive parameters.
    ConfInd {
        /// Packets the sender accepts before acknowledging.
        rx_window: u8,
        /// The largest payload the sender accepts.
        rx_mtu: u8,
    },
    /// The parameters the sender adopted towards the receiver.
    ConfRes {
        /// The adopted transmit window.
        rx_window: u8,
        /// The adopted transmit MTU.
        rx_mtu: u8,
    },
    /// A ping request.
    PingReq,
    /// A ping reply.
    PingCfm,
}

impl Repr {
    /// Parse a link control message.
    ///
    /// A window outside `1..8` or an MTU of zero is malformed.
    pub fn parse(msg: &control) -> Result<Repr> {
        msg.check_len()?;
        match msg.id() {
            ControlId::ConfInd | ControlId::ConfRes => {
                let rx_window = msg.rx_window();
                let rx_mtu = msg.rx_mtu();
                if rx_window == 0 || rx_window > 7 || rx_mtu == 0 || rx_mtu > 127 {
                    return Err(Error::Malformed);
                }
                Ok(if msg.id() == ControlId::ConfInd {
                    Repr::ConfInd { rx_window, rx_mtu }
                } else {
                    Repr::ConfRes { rx_window, rx_mtu }
                })
            },
            ControlId::PingReq => Ok(Repr::PingReq),
            ControlId::PingCfm => Ok(Repr::PingCfm),
            ControlId::Unknown(_) => Err(Error::Unrecognized),
        }
    }

    /// The identifier of this message.
    pub fn id(&self) -> ControlId {
        match self {
            Repr::ConfInd { .. } => ControlId::ConfInd,
            Repr::ConfRes { .. } => ControlId::ConfRes,
            Repr::PingReq => ControlId::PingReq,
            Repr::PingCfm => ControlId::PingCfm,
        }
    }

    /// Return the length of the encoded message.
    pub fn buffer_len(&self) -> usize {
        match self {
            Repr::ConfInd { .. } | Repr::ConfRes { .. } => field::CONF_END,
            Repr::PingReq | Repr::PingCfm => field::PING_END,
        }
    }

    /// Emit the message into a buffer.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than `buffer_len`.
    pub fn emit(&self, msg: &mut control) {
        msg.set_id(self.id());
        match *self {
            Repr::ConfInd { rx_window, rx_mtu } | Repr::ConfRes { rx_window, rx_mtu } => {
                msg.set_rx_window(rx_window);
                msg.set_rx_mtu(rx_mtu);
            },
            Repr::PingReq | Repr::PingCfm => (),
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Repr::ConfInd { rx_window, rx_mtu } =>
                write!(f, "CONF_IND window={} mtu={}", rx_window, rx_mtu),
            Repr::ConfRes { rx_window, rx_mtu } =>
                write!(f, "CONF_RES window={} mtu={}", rx_window, rx_mtu),
            Repr::PingReq => write!(f, "PING_REQ"),
            Repr::PingCfm => write!(f, "PING_CFM"),
        }
    }
}
