//! A link transport protocol for small control packets over plain serial lines.
//!
//! ## Table of contents
//!
//! This is also a recommended reading order but feel free to skip ahead, each chapter tries to be
//! somewhat self-contained.
//!
//! 1. [Highlights](#highlights)
//! 2. [Design](#design-and-relevant-core-concepts)
//! 3. [The wire module](wire/index.html)
//!    1. [Header layout](wire/struct.packet.html)
//!    1. [Framing](wire/slip/index.html)
//!    1. [Sync control bytes](wire/enum.SyncCode.html)
//!    1. [Link control messages](wire/enum.ControlRepr.html)
//! 4. [The link](link/index.html)
//!    1. [Receiving](link/index.html#receiving)
//!    1. [Sending](link/index.html#sending)
//!    1. [Handshake](link/index.html#handshake)
//! 5. [Serial streams](serial/index.html)
//! 6. Internals
//!    1. [The managed module](managed/index.html)
//!    2. [Timers](time/index.html)
//!
//! ## Highlights
//!
//! * Byte stuffed framing that resumes wherever the outbound ring ran out of space
//! * Sliding window retransmission with cumulative and piggy-backed acknowledgments
//! * A three state handshake with keep-alive supervision that heals itself after loss of contact
//! * Any number of independent links, each borrowing its own state
//!
//! ## Design and relevant core concepts
//!
//! Two nodes exchange packets of at most 127 bytes over an asynchronous serial wire that has
//! neither framing nor flow control of its own. Each packet carries a two byte header with a
//! channel, a modulo-8 sequence number and the acknowledgment of the reverse direction.
//!
//! Nothing within `ltp` dynamically allocates memory. Packets live in a fixed arena whose capacity
//! is a const parameter of the link state; running out of slots is a counted, recoverable
//! condition rather than a failure. Payload bytes are copied into the arena, handed over as owned
//! buffers or referenced as `'static` data, and the choice is encoded in the type of the payload.
//!
//! The state of a link is split into a shared half, [`LinkState`], guarded by a short critical
//! section so that a timer interrupt and application code may touch it at any time, and a task
//! half, [`Link`], which is polled with the inbound and outbound byte rings and the application
//! callbacks. No call ever blocks.
//!
//! [`LinkState`]: link/struct.LinkState.html
//! [`Link`]: link/struct.Link.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

// tests should be able to use `std`
#![cfg_attr(all(
    not(feature = "std"),
    not(test)),
no_std)]

#[macro_use] mod macros;

pub mod link;
pub mod managed;
pub mod serial;
pub mod time;
pub mod wire;
