use core::fmt;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

/// The length of a packet header.
pub const HEADER_LEN: usize = field::PAYLOAD.start;

/// The largest payload the seven bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 0x7f;

/// A multiplexed channel of a link.
///
/// Channel 0 is reserved for link control, channels 1 to 3 are free for application use.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Channel(u8);

/// A sequence number, modulo 8.
///
/// All arithmetic wraps around. There is no ordering since it would not be transitive; use
/// [`distance_from`] to compare positions within a window instead.
///
/// [`distance_from`]: #method.distance_from
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default)]
pub struct SeqNumber(u8);

byte_wrapper! {
    /// A byte sequence representing a packet, header followed by payload.
    #[derive(Debug, PartialEq, Eq)]
    pub struct packet([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const HEADER:  Field = 0..2;
    pub(crate) const PAYLOAD: Rest  = 2..;

    pub(crate) const CHANNEL_SHIFT: u16 = 14;
    pub(crate) const SEQ_SHIFT: u16 = 11;
    pub(crate) const ACK_SHIFT: u16 = 8;
    pub(crate) const CRC_FLAG: u16 = 0x0080;

    pub(crate) const CHANNEL_MASK: u16 = 0x03;
    pub(crate) const SEQ_MASK: u16 = 0x07;
    pub(crate) const LEN_MASK: u16 = 0x7f;
}

impl Channel {
    /// The link control channel.
    pub const LINK_CONTROL: Channel = Channel(0);

    /// The highest channel number that fits the header.
    pub const MAX: u8 = field::CHANNEL_MASK as u8;

    /// Create a channel, if the number fits into the header.
    pub fn new(number: u8) -> Option<Self> {
        if number <= Self::MAX {
            Some(Channel(number))
        } else {
            None
        }
    }

    /// The channel number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// Query whether this is the reserved link control channel.
    pub fn is_link_control(self) -> bool {
        self == Self::LINK_CONTROL
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

impl SeqNumber {
    /// Create a sequence number, only the low three bits are kept.
    pub fn new(value: u8) -> Self {
        SeqNumber(value & field::SEQ_MASK as u8)
    }

    /// The number within `0..8`.
    pub fn value(self) -> u8 {
        self.0
    }

    /// The sequence number following this one.
    #[must_use]
    pub fn next(self) -> Self {
        SeqNumber::new(self.0.wrapping_add(1))
    }

    /// How many steps `earlier` lies behind this sequence number.
    pub fn distance_from(self, earlier: SeqNumber) -> u8 {
        self.0.wrapping_sub(earlier.0) & field::SEQ_MASK as u8
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl packet {
    /// Imbue a raw octet buffer with packet structure.
    pub fn new_unchecked(data: &[u8]) -> &Self {
        Self::__from_macro_new_unchecked(data)
    }

    /// Imbue a mutable octet buffer with packet structure.
    pub fn new_unchecked_mut(data: &mut [u8]) -> &mut Self {
        Self::__from_macro_new_unchecked_mut(data)
    }

    /// Shorthand for a combination of `new_unchecked` and `check_len`.
    pub fn new_checked(data: &[u8]) -> Result<&Self> {
        Self::new_unchecked(data).check_len()?;
        Ok(Self::new_unchecked(data))
    }

    /// Unwrap the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that no accessor method will panic if called.
    ///
    /// Returns `Err(Error::Truncated)` if the buffer is shorter than the header or than the
    /// length the header declares. Trailing octets beyond the declared length are allowed.
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < field::PAYLOAD.start {
            Err(Error::Truncated)
        } else if len < Self::buffer_len(self.payload_len().into()) {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the length of a packet header.
    pub fn header_len() -> usize {
        field::PAYLOAD.start
    }

    /// Return the length of a buffer required to hold a packet with the payload
    /// of a given length.
    pub fn buffer_len(payload_len: usize) -> usize {
        field::PAYLOAD.start + payload_len
    }

    fn header(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::HEADER])
    }

    fn set_header(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::HEADER], value)
    }

    fn update_header(&mut self, shift: u16, mask: u16, value: u16) {
        let header = self.header() & !(mask << shift);
        self.set_header(header | ((value & mask) << shift))
    }

    /// Return the channel field.
    pub fn channel(&self) -> Channel {
        Channel((self.header() >> field::CHANNEL_SHIFT & field::CHANNEL_MASK) as u8)
    }

    /// Return the sequence number field.
    pub fn seq_number(&self) -> SeqNumber {
        SeqNumber::new((self.header() >> field::SEQ_SHIFT) as u8)
    }

    /// Return the acknowledgment field.
    pub fn ack_number(&self) -> SeqNumber {
        SeqNumber::new((self.header() >> field::ACK_SHIFT) as u8)
    }

    /// Return the CRC present flag.
    pub fn crc_present(&self) -> bool {
        self.header() & field::CRC_FLAG != 0
    }

    /// Return the payload length field.
    pub fn payload_len(&self) -> u8 {
        (self.header() & field::LEN_MASK) as u8
    }

    /// Set the channel field.
    pub fn set_channel(&mut self, value: Channel) {
        self.update_header(field::CHANNEL_SHIFT, field::CHANNEL_MASK, value.0.into())
    }

    /// Set the sequence number field.
    pub fn set_seq_number(&mut self, value: SeqNumber) {
        self.update_header(field::SEQ_SHIFT, field::SEQ_MASK, value.0.into())
    }

    /// Set the acknowledgment field.
    pub fn set_ack_number(&mut self, value: SeqNumber) {
        self.update_header(field::ACK_SHIFT, field::SEQ_MASK, value.0.into())
    }

    /// Set the CRC present flag.
    pub fn set_crc_present(&mut self, value: bool) {
        self.update_header(7, 1, value.into())
    }

    /// Set the payload length field.
    ///
    /// Only the low seven bits are stored.
    pub fn set_payload_len(&mut self, value: u8) {
        self.update_header(0, field::LEN_MASK, value.into())
    }

    /// Return the payload as a byte slice.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than the declared length.
    pub fn payload_slice(&self) -> &[u8] {
        let end = Self::buffer_len(self.payload_len().into());
        &self.0[field::PAYLOAD.start..end]
    }

    /// Return the payload as a mutable byte slice.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than the declared length.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let end = Self::buffer_len(self.payload_len().into());
        &mut self.0[field::PAYLOAD.start..end]
    }
}

impl AsRef<[u8]> for packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A high-level representation of a packet header.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Repr {
    /// The channel the payload belongs to.
    pub channel: Channel,
    /// The sequence number of this packet.
    pub seq_number: SeqNumber,
    /// The next sequence number the sender expects to receive.
    pub ack_number: SeqNumber,
    /// The number of payload octets following the header.
    pub payload_len: u8,
}

impl Repr {
    /// Parse a header.
    ///
    /// Only the header itself is required to be present so that it can be inspected before the
    /// payload has arrived. A header claiming a checksum is malformed since none is ever sent.
    pub fn parse(header: &packet) -> Result<Repr> {
        if header.0.len() < field::PAYLOAD.start {
            return Err(Error::Truncated);
        }

        if header.crc_present() {
            return Err(Error::Malformed);
        }

        Ok(Repr {
            channel: header.channel(),
            seq_number: header.seq_number(),
            ack_number: header.ack_number(),
            payload_len: header.payload_len(),
        })
    }

    /// A header carrying only an acknowledgment.
    pub fn ack_only(ack_number: SeqNumber) -> Self {
        Repr {
            channel: Channel::LINK_CONTROL,
            seq_number: SeqNumber::default(),
            ack_number,
            payload_len: 0,
        }
    }

    /// Return the length of a buffer holding the header and the payload.
    pub fn buffer_len(&self) -> usize {
        packet::buffer_len(self.payload_len.into())
    }

    /// Query whether the header is followed by a payload.
    pub fn has_payload(&self) -> bool {
        self.payload_len != 0
    }

    /// Emit the header into a packet buffer.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than the header.
    pub fn emit(&self, header: &mut packet) {
        debug_assert!(usize::from(self.payload_len) <= MAX_PAYLOAD_LEN);
        header.set_header(0);
        header.set_channel(self.channel);
        header.set_seq_number(self.seq_number);
        header.set_ack_number(self.ack_number);
        header.set_crc_present(false);
        header.set_payload_len(self.payload_len);
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LTP {} seq={} ack={} len={}",
            self.channel, self.seq_number, self.ack_number, self.payload_len)
    }
}
