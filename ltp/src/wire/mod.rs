/*! Low-level packet access and construction.

# An overview over packet representations

The `wire` module deals with the packet *representation*. It provides three kinds of
functionality.

 * First, it provides functions to extract fields from sequences of octets, and to insert fields
   into sequences of octets. This happens in the lowercase structures [`packet`] and [`control`].
 * Second, it provides a compact, high-level representation of header data that can be created from
   parsing and emitted into a sequence of octets. This happens through the `Repr` family of structs
   and enums, [`PacketRepr`] and [`ControlRepr`].
 * Third, it delimits packets on the raw byte stream. This is the [`slip`] module, a byte
   stuffing encoder and decoder.

[`packet`]: struct.packet.html
[`control`]: struct.control.html
[`PacketRepr`]: struct.PacketRepr.html
[`ControlRepr`]: enum.ControlRepr.html
[`slip`]: slip/index.html

# The line format

A frame on the line is delimited by `FRAME` octets. Its content, after removing the escaping, is
either:

 * exactly one octet, a [`SyncCode`] of the handshake; or
 * a two octet header followed by `payload_len` octets of payload.

```text
 Byte  Bit  Description
 0     7:6  Channel, 0 is link control, 1 to 3 belong to the application
       5:3  Sequence number of this packet, modulo 8
       2:0  Next sequence number expected from the peer (the acknowledgment)
 1     7    CRC present, always 0
       6:0  Payload length, 0 to 127
```

A header with payload length 0 carries only the acknowledgment.

[`SyncCode`]: enum.SyncCode.html

# Examples

To emit a header into an octet buffer, and then parse it back:

```rust
use ltp::wire::*;
let repr = PacketRepr {
    channel: Channel::new(1).unwrap(),
    seq_number: SeqNumber::new(5),
    ack_number: SeqNumber::new(3),
    payload_len: 4,
};
let mut buffer = vec![0; repr.buffer_len()];
{ // emission
    let header = packet::new_unchecked_mut(&mut buffer);
    repr.emit(header);
}
{ // parsing
    let header = packet::new_checked(&buffer)
        .expect("truncated packet");
    let parsed = PacketRepr::parse(header)
        .expect("malformed packet");
    assert_eq!(repr, parsed);
}
```
*/

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

mod control_impl;
mod error;
mod packet_impl;
pub mod slip;
mod sync;

pub use self::control_impl::{
    control,
    ControlId,
    Repr as ControlRepr};

pub use self::error::{
    Error,
    Result};

pub use self::packet_impl::{
    packet,
    Channel,
    Repr as PacketRepr,
    SeqNumber,
    HEADER_LEN,
    MAX_PAYLOAD_LEN};

pub use self::sync::SyncCode;
