//! The protocol logic of a link.
//!
//! ## Layering
//!
//! A link sits between a pair of byte streams and an application. The packet logic lives in
//! `wire`, this module keeps the state of one link and drives it. Each link is split into two
//! halves:
//!
//! * [`LinkState`] holds the queues, timers, sequence numbers and statistics. It is shared: a tick
//!   interrupt and any number of application contexts may use it concurrently through `&self`,
//!   every access is a short critical section of the chosen [`RawMutex`].
//! * [`Link`] is owned by the one task polling the streams. It keeps the framing progress of both
//!   directions and calls back into the [`Application`], never while holding the lock.
//!
//! Nothing is global so any number of links can run side by side.
//!
//! ## Receiving
//!
//! Incoming octets are unstuffed and collected into frames. A single octet frame is a handshake
//! code. Otherwise the two octet header is validated as soon as it is complete: its acknowledgment
//! retires sent packets, and a payload is only collected if it carries the expected sequence
//! number. The payload is committed, acknowledged and delivered once the closing delimiter
//! confirms its declared length. Anything else is dropped and counted; the sender repairs it by
//! retransmission.
//!
//! ## Sending
//!
//! Payloads are queued with [`LinkState::send`] and its variants and written out by [`Link::poll`]
//! in this order of priority: an acknowledgment that is due, a retransmission of everything
//! unacknowledged after a timeout, then the send queue. At most `tx_window` sequenced packets are
//! outstanding. Every header carries the current acknowledgment for the reverse direction.
//!
//! ## Handshake
//!
//! A link starts [`SyncState::Shy`] and repeats `Sync` until the peer answers, turns
//! [`SyncState::Curious`] and repeats `Conf` until confirmed, then is [`SyncState::Garrulous`].
//! Payloads only flow in the last state. A peer silent for `keep_alive_limit` keep-alive periods,
//! or a peer that starts over, resets the link to its initial state.
//!
//! [`LinkState`]: struct.LinkState.html
//! [`LinkState::send`]: struct.LinkState.html#method.send
//! [`Link`]: struct.Link.html
//! [`Link::poll`]: struct.Link.html#method.poll
//! [`Application`]: trait.Application.html
//! [`RawMutex`]: https://docs.rs/embassy-sync/0.6/embassy_sync/blocking_mutex/raw/trait.RawMutex.html
//! [`SyncState::Shy`]: enum.SyncState.html#variant.Shy
//! [`SyncState::Curious`]: enum.SyncState.html#variant.Curious
//! [`SyncState::Garrulous`]: enum.SyncState.html#variant.Garrulous
use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::{Mutex, raw::RawMutex};

use crate::serial::{RxStream, TxStream};
use crate::wire::{self, Channel, ControlRepr, MAX_PAYLOAD_LEN};

mod control;
mod packet;
mod rx;
mod state;
mod stats;
mod sync;
mod tx;

#[cfg(test)]
mod tests;

pub use self::packet::{Buffer, Payload};
pub use self::stats::Stats;
pub use self::sync::SyncState;

use self::packet::Packet;
use self::rx::{Received, Receiver};
use self::state::State;
use self::tx::Transmitter;

/// The result type of application facing calls.
pub type Result<T> = core::result::Result<T, Error>;

/// Why a call was refused.
///
/// A refused send has no effect on the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The operation was not permitted.
    ///
    /// Returned for sends on the reserved link control channel and for invalid configurations.
    Illegal,

    /// The payload is empty or longer than the peer accepts.
    BadSize,

    /// All packet slots are in use.
    ///
    /// Sending may succeed again once queued packets have been acknowledged.
    Exhausted,
}

/// Can convert from a wire error.
impl From<wire::Error> for Error {
    fn from(err: wire::Error) -> Self {
        match err {
            wire::Error::Exceeded => Error::BadSize,
            _ => Error::Illegal,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Illegal => write!(f, "operation not permitted"),
            Error::BadSize => write!(f, "bad payload size"),
            Error::Exhausted => write!(f, "packet slots exhausted"),
        }
    }
}

/// The parameters of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    /// Number of the link, only used in log messages.
    pub id: u8,
    /// Maximum number of sent and unacknowledged packets, `1..=7`.
    pub tx_window: u8,
    /// Number of received packets that forces an immediate acknowledgment, `1..=7`.
    pub rx_window: u8,
    /// The largest payload accepted from the peer, `1..=127`.
    pub rx_mtu: u8,
    /// Milliseconds before unacknowledged packets are sent again.
    pub retransmit_period: u16,
    /// The retransmission timeout of the peer in milliseconds.
    ///
    /// Acknowledgments are delayed by at most half of it.
    pub peer_retransmit_period: u16,
    /// Milliseconds between repetitions of the handshake.
    pub sync_period: u16,
    /// Milliseconds between keep-alives of an active link.
    pub keep_alive_period: u16,
    /// Keep-alive periods without any traffic from the peer before the link resets.
    pub keep_alive_limit: u8,
    /// Exchange receive parameters on channel 0 once the link is active.
    pub link_control: bool,
}

impl Config {
    /// Validate the parameters.
    pub fn check(&self) -> Result<()> {
        let window = 1..=7;
        if !window.contains(&self.tx_window) || !window.contains(&self.rx_window) {
            return Err(Error::Illegal);
        }

        if self.rx_mtu == 0 || usize::from(self.rx_mtu) > MAX_PAYLOAD_LEN {
            return Err(Error::Illegal);
        }

        let periods = [
            self.retransmit_period,
            self.peer_retransmit_period,
            self.sync_period,
            self.keep_alive_period,
        ];
        if periods.contains(&0) || self.keep_alive_limit == 0 {
            return Err(Error::Illegal);
        }

        Ok(())
    }

    pub(crate) fn ack_delay(&self) -> u16 {
        self.peer_retransmit_period / 2
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            id: 0,
            tx_window: 3,
            rx_window: 1,
            rx_mtu: MAX_PAYLOAD_LEN as u8,
            retransmit_period: 1000,
            peer_retransmit_period: 5000,
            sync_period: 100,
            keep_alive_period: 500,
            keep_alive_limit: 4,
            link_control: false,
        }
    }
}

/// The consumer of a link.
///
/// All methods are called from [`Link::poll`], outside of any critical section, so they may call
/// back into the [`LinkState`].
///
/// [`Link::poll`]: struct.Link.html#method.poll
/// [`LinkState`]: struct.LinkState.html
pub trait Application {
    /// A payload was received in sequence.
    fn packet_received(&mut self, channel: Channel, payload: &[u8]);

    /// The handshake completed.
    fn link_active(&mut self) { }

    /// The link was reset and every queued packet discarded.
    fn link_reset(&mut self) { }
}

/// A standard wrapper for a function receiving packets.
///
/// Lifecycle notifications are ignored.
pub struct FnHandler<F>(pub F);

impl<F> Application for FnHandler<F>
where
    F: FnMut(Channel, &[u8]),
{
    fn packet_received(&mut self, channel: Channel, payload: &[u8]) {
        (self.0)(channel, payload)
    }
}

impl<A: Application + ?Sized> Application for &'_ mut A {
    fn packet_received(&mut self, channel: Channel, payload: &[u8]) {
        (**self).packet_received(channel, payload)
    }

    fn link_active(&mut self) {
        (**self).link_active()
    }

    fn link_reset(&mut self) {
        (**self).link_reset()
    }
}

/// A change of the link's liveness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Lifecycle {
    Active,
    Reset,
}

/// The shared half of a link.
///
/// Holds up to `N` queued or unacknowledged packets.
pub struct LinkState<M: RawMutex, const N: usize> {
    inner: Mutex<M, RefCell<State<N>>>,
}

impl<M: RawMutex, const N: usize> LinkState<M, N> {
    /// Create the state of a link in its initial, shy state.
    ///
    /// Fails with `Error::Illegal` for an invalid configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.check()?;
        Ok(LinkState {
            inner: Mutex::new(RefCell::new(State::new(config))),
        })
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut State<N>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Advance all timers by one millisecond.
    ///
    /// Call this from a periodic tick source. Expired timers are acted upon by the next poll.
    pub fn tick(&self) {
        self.with(State::tick)
    }

    /// Queue a copy of `data` for sending on an application channel.
    pub fn send(&self, channel: Channel, data: &[u8]) -> Result<()> {
        let buffer = Buffer::from_slice(data).map_err(|_| Error::BadSize)?;
        self.send_payload(channel, Payload::Owned(buffer))
    }

    /// Queue an owned buffer for sending on an application channel.
    pub fn send_owned(&self, channel: Channel, buffer: Buffer) -> Result<()> {
        self.send_payload(channel, Payload::Owned(buffer))
    }

    /// Queue static data for sending without copying it.
    pub fn send_static(&self, channel: Channel, data: &'static [u8]) -> Result<()> {
        self.send_payload(channel, Payload::Static(data))
    }

    /// Queue a copy of `data`, replacing queued packets for the same logical update.
    ///
    /// The predicate `same` sees the payload of every queued, in flight or unacknowledged packet on
    /// `channel`. Matches that were never sent are discarded. Matches already sent keep their
    /// place in the sequence and are marked superseded. The predicate runs inside the critical
    /// section together with the insert, so it must be short.
    pub fn send_replacing<F>(&self, channel: Channel, data: &[u8], same: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let buffer = Buffer::from_slice(data).map_err(|_| Error::BadSize)?;
        self.with(|state| {
            state.check_payload(channel, buffer.len())?;
            state.replace(channel, same);
            state.enqueue(Packet::new(channel, Payload::Owned(buffer)))?;
            Ok(())
        })
    }

    fn send_payload(&self, channel: Channel, payload: Payload) -> Result<()> {
        self.with(|state| {
            state.check_payload(channel, payload.len())?;
            state.enqueue(Packet::new(channel, payload))?;
            Ok(())
        })
    }

    /// Ask the peer for a link control echo.
    ///
    /// Requires link control to be enabled.
    pub fn ping(&self) -> Result<()> {
        self.with(|state| {
            if !state.config.link_control {
                return Err(Error::Illegal);
            }
            state.queue_control(ControlRepr::PingReq)
        })
    }

    /// The current handshake state.
    pub fn sync_state(&self) -> SyncState {
        self.with(|state| state.sync.state)
    }

    /// Query whether the handshake completed.
    pub fn is_active(&self) -> bool {
        self.with(|state| state.is_garrulous())
    }

    /// Query whether the link control exchange completed in both directions.
    pub fn is_configured(&self) -> bool {
        self.with(|state| state.control.is_configured())
    }

    /// A snapshot of the counters.
    pub fn stats(&self) -> Stats {
        self.with(|state| state.stats)
    }

    /// The transmit window in effect.
    pub fn tx_window(&self) -> u8 {
        self.with(|state| state.tx_window)
    }

    /// The largest payload the peer accepts.
    pub fn tx_mtu(&self) -> u8 {
        self.with(|state| state.tx_mtu)
    }

    /// The configuration the link was created with.
    pub fn config(&self) -> Config {
        self.with(|state| state.config)
    }

    /// The number of packets queued, in flight or awaiting acknowledgment.
    pub fn pending(&self) -> usize {
        self.with(|state| state.pending())
    }
}

/// The task half of a link.
pub struct Link<'s, M: RawMutex, const N: usize> {
    state: &'s LinkState<M, N>,
    receiver: Receiver,
    transmitter: Transmitter,
}

impl<'s, M: RawMutex, const N: usize> Link<'s, M, N> {
    /// Drive a link state.
    ///
    /// Only one `Link` should exist per state; two would interleave their frames.
    pub fn new(state: &'s LinkState<M, N>) -> Self {
        Link {
            state,
            receiver: Receiver::new(),
            transmitter: Transmitter::new(),
        }
    }

    /// The shared half.
    pub fn state(&self) -> &'s LinkState<M, N> {
        self.state
    }

    /// Process everything pending and write as much as fits.
    ///
    /// Reads all available inbound octets, then runs the handshake timer, then fills the outbound
    /// stream. Never blocks.
    pub fn poll<R, T, A>(&mut self, rx: &mut R, tx: &mut T, app: &mut A)
    where
        R: RxStream + ?Sized,
        T: TxStream + ?Sized,
        A: Application + ?Sized,
    {
        while let Some(byte) = rx.read() {
            match self.receiver.receive(byte, self.state) {
                Some(Received::Payload(channel)) => {
                    app.packet_received(channel, self.receiver.payload())
                },
                Some(Received::Lifecycle(event)) => self.lifecycle(event, app),
                None => (),
            }
        }

        if let Some(event) = self.state.with(State::sync_poll) {
            self.lifecycle(event, app);
        }

        self.transmitter.transmit(tx, self.state);
    }

    /// Reset the link from the outside, discarding everything queued.
    pub fn reset<A: Application + ?Sized>(&mut self, app: &mut A) {
        self.state.with(State::reset);
        self.lifecycle(Lifecycle::Reset, app);
    }

    fn lifecycle<A: Application + ?Sized>(&mut self, event: Lifecycle, app: &mut A) {
        match event {
            Lifecycle::Active => app.link_active(),
            Lifecycle::Reset => {
                self.receiver.reset();
                self.transmitter.reset();
                app.link_reset();
            },
        }
    }
}
