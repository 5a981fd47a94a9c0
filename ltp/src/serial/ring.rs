use heapless::Deque;

use super::{RxStream, TxStream};

/// A fixed capacity octet ring, usable as either end of a serial stream.
#[derive(Debug)]
pub struct Ring<const N: usize> {
    buffer: Deque<u8, N>,
    kicks: usize,
    overruns: usize,
}

impl<const N: usize> Ring<N> {
    /// Create an empty ring.
    pub fn new() -> Self {
        Ring {
            buffer: Deque::new(),
            kicks: 0,
            overruns: 0,
        }
    }

    /// How often the writer signalled new data.
    pub fn kicks(&self) -> usize {
        self.kicks
    }

    /// How many octets were written without space and lost.
    pub fn overruns(&self) -> usize {
        self.overruns
    }

    /// The number of queued octets.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Query whether no octet is queued.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Queue a whole slice, returning how many octets fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        let fit = bytes.len().min(self.space());
        bytes[..fit].iter().for_each(|&b| self.write(b));
        fit
    }

    /// Discard everything queued.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl<const N: usize> Default for Ring<N> {
    fn default() -> Self {
        Ring::new()
    }
}

impl<const N: usize> RxStream for Ring<N> {
    fn amount(&self) -> usize {
        self.buffer.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.buffer.pop_front()
    }
}

impl<const N: usize> TxStream for Ring<N> {
    fn space(&self) -> usize {
        N - self.buffer.len()
    }

    fn write(&mut self, byte: u8) {
        if self.buffer.push_back(byte).is_err() {
            self.overruns += 1;
        }
    }

    fn kick(&mut self) {
        self.kicks += 1;
    }
}

/// Move as many octets as possible from one stream to another.
///
/// Returns the number of octets moved.
pub fn transfer<R, T>(from: &mut R, to: &mut T) -> usize
where
    R: RxStream + ?Sized,
    T: TxStream + ?Sized,
{
    let mut moved = 0;
    while to.space() > 0 {
        match from.read() {
            Some(byte) => to.write(byte),
            None => break,
        }
        moved += 1;
    }
    moved
}
