//! The byte streams below a link.
//!
//! A link is agnostic of the serial hardware. It only sees one inbound and one outbound stream of
//! octets, usually ring buffers filled and drained by an interrupt or DMA engine. All operations
//! are bounded and never block: the link asks how much is available and moves at most that much.
//!
//! The [`Ring`] is a software stream for tests and simulations, and [`transfer_lossy`] moves
//! octets between two rings while dropping some of them like a noisy wire.
//!
//! [`Ring`]: struct.Ring.html
//! [`transfer_lossy`]: fn.transfer_lossy.html
mod loss;
mod ring;

pub use self::loss::{
    transfer_lossy,
    PrngLoss,
    Xoroshiro256};

pub use self::ring::{
    transfer,
    Ring};

/// The inbound half of a serial port.
pub trait RxStream {
    /// The number of octets ready to be read.
    fn amount(&self) -> usize;

    /// Take the next octet, if any.
    fn read(&mut self) -> Option<u8>;
}

/// The outbound half of a serial port.
pub trait TxStream {
    /// The number of octets that can be written without overrunning.
    fn space(&self) -> usize;

    /// Queue an octet for transmission.
    ///
    /// Must only be called while `space` is non-zero, an implementation may drop the octet
    /// otherwise.
    fn write(&mut self, byte: u8);

    /// Hint that new octets were queued and a hardware transfer should start or continue.
    fn kick(&mut self) { }
}

impl<T: RxStream + ?Sized> RxStream for &'_ mut T {
    fn amount(&self) -> usize {
        (**self).amount()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }
}

impl<T: TxStream + ?Sized> TxStream for &'_ mut T {
    fn space(&self) -> usize {
        (**self).space()
    }

    fn write(&mut self, byte: u8) {
        (**self).write(byte)
    }

    fn kick(&mut self) {
        (**self).kick()
    }
}
