/*! Time structures.

The `time` module contains the countdown timers of a link. A periodic tick source of millisecond
granularity decrements every armed timer; expiry is observed, not pushed, by the next poll of the
link task.

 - [Timer] is a single countdown which is either idle or armed.

[Timer]: enum.Timer.html
*/
use core::fmt;

/// A millisecond countdown.
///
/// An armed timer with zero milliseconds left has expired and stays expired until it is stopped
/// or re-armed. Ticking an idle or expired timer has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// The timer is not running.
    Idle,
    /// The timer runs out after the contained number of ticks.
    Armed(u16),
}

impl Timer {
    /// A timer that has already expired.
    pub const NOW: Timer = Timer::Armed(0);

    /// Create a timer expiring after `millis` ticks.
    pub fn armed(millis: u16) -> Self {
        Timer::Armed(millis)
    }

    /// Advance by one tick.
    pub fn tick(&mut self) {
        if let Timer::Armed(left) = self {
            *left = left.saturating_sub(1);
        }
    }

    /// Arm the timer, replacing any previous deadline.
    pub fn arm(&mut self, millis: u16) {
        *self = Timer::Armed(millis);
    }

    /// Expire the timer immediately.
    pub fn fire(&mut self) {
        *self = Timer::NOW;
    }

    /// Stop the timer.
    pub fn stop(&mut self) {
        *self = Timer::Idle;
    }

    /// Query whether the timer ran out.
    pub fn is_expired(&self) -> bool {
        *self == Timer::NOW
    }

    /// Query whether the timer is stopped.
    pub fn is_idle(&self) -> bool {
        *self == Timer::Idle
    }

    /// The number of ticks until expiry, if armed.
    pub fn remaining(&self) -> Option<u16> {
        match self {
            Timer::Idle => None,
            Timer::Armed(left) => Some(*left),
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::Idle
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Timer::Idle => write!(f, "idle"),
            Timer::Armed(left) => write!(f, "{}ms", left),
        }
    }
}
