//! Byte stuffing that delimits frames on a serial stream.
//!
//! A frame is enclosed in `FRAME` octets. Any `FRAME` or `ESCAPE` octet inside it is replaced by
//! `ESCAPE` followed by `ESCAPED_FRAME` or `ESCAPED_ESCAPE` respectively, so that a bare `FRAME`
//! on the line always marks a boundary.
//!
//! Both directions work one octet at a time. The [`Decoder`] turns line octets into [`Token`]s and
//! the [`Encoder`] writes as much of a frame as the outbound stream has room for, resuming where it
//! stopped on the next call.
//!
//! [`Decoder`]: struct.Decoder.html
//! [`Encoder`]: struct.Encoder.html
//! [`Token`]: enum.Token.html
use crate::serial::TxStream;

/// Delimits frames.
pub const FRAME: u8 = 0xc0;
/// Prefix of an escaped octet.
pub const ESCAPE: u8 = 0xdb;
/// Follows `ESCAPE` in place of a `FRAME` octet.
pub const ESCAPED_FRAME: u8 = 0xdc;
/// Follows `ESCAPE` in place of an `ESCAPE` octet.
pub const ESCAPED_ESCAPE: u8 = 0xdd;

/// The worst case number of octets a frame of the given content length occupies on the line.
pub const fn encoded_len_max(content_len: usize) -> usize {
    2 + 2*content_len
}

/// A decoded item of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// An octet of frame content, with escaping removed.
    Byte(u8),
    /// A frame boundary.
    End,
}

/// Turns line octets back into frame content.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    escaped: bool,
}

/// Where the encoder stopped within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// The opening delimiter has not been written.
    Start,
    /// The content up to this index has been written.
    Body(usize),
}

/// Writes one frame into an outbound stream, possibly over several calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoder {
    position: Position,
}

impl Decoder {
    /// Create a decoder outside of any escape sequence.
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Decode a single line octet.
    ///
    /// Returns `None` for an `ESCAPE` prefix, which only affects the following octet. An escape
    /// followed by an octet other than the two escape codes yields that octet unchanged.
    pub fn decode(&mut self, byte: u8) -> Option<Token> {
        if byte == FRAME {
            self.escaped = false;
            return Some(Token::End);
        }

        if self.escaped {
            self.escaped = false;
            let byte = match byte {
                ESCAPED_FRAME => FRAME,
                ESCAPED_ESCAPE => ESCAPE,
                other => other,
            };
            return Some(Token::Byte(byte));
        }

        if byte == ESCAPE {
            self.escaped = true;
            None
        } else {
            Some(Token::Byte(byte))
        }
    }

    /// Forget a pending escape prefix.
    pub fn reset(&mut self) {
        self.escaped = false;
    }
}

impl Encoder {
    /// Create an encoder positioned before the start of a frame.
    pub fn new() -> Self {
        Encoder { position: Position::Start }
    }

    /// Query whether part of a frame has been written already.
    pub fn is_started(&self) -> bool {
        self.position != Position::Start
    }

    /// Continue writing `frame` into `out`.
    ///
    /// Writes only while at least three octets of space remain, enough for an escaped octet or the
    /// closing delimiter. Returns `true` once the closing `FRAME` has been written, after which the
    /// encoder is ready for the next frame. The same `frame` must be passed until then. The stream
    /// is kicked if anything was written.
    pub fn encode<T: TxStream + ?Sized>(&mut self, frame: &[u8], out: &mut T) -> bool {
        let mut written = false;
        let mut done = false;

        while out.space() >= 3 {
            match self.position {
                Position::Start => {
                    out.write(FRAME);
                    self.position = Position::Body(0);
                },
                Position::Body(idx) if idx < frame.len() => {
                    match frame[idx] {
                        FRAME => {
                            out.write(ESCAPE);
                            out.write(ESCAPED_FRAME);
                        },
                        ESCAPE => {
                            out.write(ESCAPE);
                            out.write(ESCAPED_ESCAPE);
                        },
                        other => out.write(other),
                    }
                    self.position = Position::Body(idx + 1);
                },
                Position::Body(_) => {
                    out.write(FRAME);
                    self.position = Position::Start;
                    done = true;
                },
            }

            written = true;
            if done {
                break;
            }
        }

        if written {
            out.kick();
        }

        done
    }

    /// Abandon the current frame.
    ///
    /// The partial frame already on the line is terminated by the opening delimiter of the next.
    pub fn reset(&mut self) {
        self.position = Position::Start;
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{Ring, RxStream};

    fn decode_all(ring: &mut Ring<1024>) -> Vec<Vec<u8>> {
        let mut decoder = Decoder::new();
        let mut frames = Vec::new();
        let mut current = Vec::new();
        while let Some(byte) = ring.read() {
            match decoder.decode(byte) {
                Some(Token::Byte(byte)) => current.push(byte),
                Some(Token::End) => if !current.is_empty() {
                    frames.push(core::mem::take(&mut current));
                },
                None => (),
            }
        }
        frames
    }

    #[test]
    fn escapes() {
        let mut ring = Ring::<64>::new();
        let mut encoder = Encoder::new();
        assert!(encoder.encode(&[0x01, FRAME, ESCAPE, 0x02], &mut ring));
        let mut line = Vec::new();
        while let Some(byte) = ring.read() {
            line.push(byte);
        }
        assert_eq!(line, [FRAME, 0x01, ESCAPE, ESCAPED_FRAME, ESCAPE, ESCAPED_ESCAPE, 0x02, FRAME]);
        assert_eq!(ring.kicks(), 1);
    }

    #[test]
    fn resumes_on_space() {
        let content = [FRAME; 10];
        let mut ring = Ring::<4>::new();
        let mut encoder = Encoder::new();
        let mut line = Vec::new();

        let mut calls = 0;
        loop {
            calls += 1;
            let done = encoder.encode(&content, &mut ring);
            while let Some(byte) = ring.read() {
                line.push(byte);
            }
            if done {
                break;
            }
            assert!(encoder.is_started());
        }

        assert!(calls > 1);
        assert_eq!(line.len(), encoded_len_max(content.len()));
        let mut decoder = Decoder::new();
        let tokens: Vec<_> = line.iter().filter_map(|&b| decoder.decode(b)).collect();
        assert_eq!(tokens.first(), Some(&Token::End));
        assert_eq!(tokens.last(), Some(&Token::End));
        assert!(tokens[1..11].iter().all(|t| *t == Token::Byte(FRAME)));
    }

    #[test]
    fn no_space_no_kick() {
        let mut ring = Ring::<2>::new();
        let mut encoder = Encoder::new();
        assert!(!encoder.encode(&[0x00], &mut ring));
        assert!(!encoder.is_started());
        assert_eq!(ring.kicks(), 0);
    }

    #[test]
    fn round_trip_all_lengths() {
        use crate::wire::{packet, Channel, PacketRepr, SeqNumber};

        let mut ring = Ring::<1024>::new();
        let mut encoder = Encoder::new();

        for len in 0..=127u8 {
            let repr = PacketRepr {
                channel: Channel::new(len % 4).unwrap(),
                seq_number: SeqNumber::new(len),
                ack_number: SeqNumber::new(len / 8),
                payload_len: len,
            };
            let mut frame = vec![0; repr.buffer_len()];
            repr.emit(packet::new_unchecked_mut(&mut frame));
            // Delimiter and escape values throughout the payload.
            for (i, byte) in frame[2..].iter_mut().enumerate() {
                *byte = match i % 4 {
                    0 => FRAME,
                    1 => ESCAPE,
                    _ => (i as u8).wrapping_mul(37),
                };
            }

            assert!(encoder.encode(&frame, &mut ring));
            let frames = decode_all(&mut ring);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0], frame);

            let parsed = packet::new_checked(&frames[0]).unwrap();
            assert_eq!(PacketRepr::parse(parsed), Ok(repr));
            assert_eq!(parsed.payload_slice(), &frame[2..]);
        }
    }

    #[test]
    fn lenient_escape() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(ESCAPE), None);
        assert_eq!(decoder.decode(0x42), Some(Token::Byte(0x42)));
        // An escape directly before a delimiter is dropped.
        assert_eq!(decoder.decode(ESCAPE), None);
        assert_eq!(decoder.decode(FRAME), Some(Token::End));
        assert_eq!(decoder.decode(ESCAPED_FRAME), Some(Token::Byte(ESCAPED_FRAME)));
    }
}
