use heapless::Vec;

use crate::wire::{self, packet, Channel, PacketRepr, SeqNumber, SyncCode, HEADER_LEN, MAX_PAYLOAD_LEN};

/// An owned payload buffer.
pub type Buffer = Vec<u8, MAX_PAYLOAD_LEN>;

pub(crate) const FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// The content of one frame, header and payload, before byte stuffing.
pub(crate) type FrameBuf = Vec<u8, FRAME_LEN>;

/// The payload of an outbound packet.
///
/// Who owns the bytes is part of the type: an owned buffer is dropped with the packet, a static
/// slice is never copied or freed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Bytes that live for the whole program.
    Static(&'static [u8]),
    /// Bytes owned by the link.
    Owned(Buffer),
}

/// A payload packet waiting in one of the queues of a link.
#[derive(Clone, Debug)]
pub(crate) struct Packet {
    pub(crate) channel: Channel,
    /// Assigned when the packet is first scheduled, then fixed for every retransmission.
    pub(crate) seq: Option<SeqNumber>,
    /// A newer packet for the same logical update was queued while this one was already
    /// sequenced.
    pub(crate) superseded: bool,
    pub(crate) payload: Payload,
}

impl Payload {
    /// View the payload bytes.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Payload::Static(data) => *data,
            Payload::Owned(buffer) => buffer.as_slice(),
        }
    }

    /// The number of payload bytes.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Query whether there are no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl Packet {
    pub(crate) fn new(channel: Channel, payload: Payload) -> Self {
        Packet {
            channel,
            seq: None,
            superseded: false,
            payload,
        }
    }

    /// Write the frame content, stamping the acknowledgment to send.
    ///
    /// Fails without a sequence number or with a payload that does not fit the length field.
    pub(crate) fn emit(&self, ack: SeqNumber, frame: &mut FrameBuf) -> wire::Result<()> {
        let data = self.payload.as_slice();
        let payload_len = match u8::try_from(data.len()) {
            Ok(len) if usize::from(len) <= MAX_PAYLOAD_LEN => len,
            _ => return Err(wire::Error::Exceeded),
        };
        let seq_number = self.seq.ok_or(wire::Error::Malformed)?;
        let repr = PacketRepr {
            channel: self.channel,
            seq_number,
            ack_number: ack,
            payload_len,
        };
        emit_header(repr, frame)?;
        frame.extend_from_slice(data)
            .map_err(|_| wire::Error::Exceeded)
    }
}

/// Write a header into an emptied frame buffer.
pub(crate) fn emit_header(repr: PacketRepr, frame: &mut FrameBuf) -> wire::Result<()> {
    frame.clear();
    frame.resize_default(HEADER_LEN)
        .map_err(|_| wire::Error::Exceeded)?;
    repr.emit(packet::new_unchecked_mut(&mut frame[..]));
    Ok(())
}

/// Write a handshake octet as the whole frame content.
pub(crate) fn emit_sync(code: SyncCode, frame: &mut FrameBuf) -> wire::Result<()> {
    frame.clear();
    frame.push(code.into())
        .map_err(|_| wire::Error::Exceeded)
}
