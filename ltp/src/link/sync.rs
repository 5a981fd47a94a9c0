use core::fmt;

use heapless::Deque;

use crate::time::Timer;
use crate::wire::SyncCode;

use super::Lifecycle;
use super::state::State;

/// Room for every handshake code at once, so a code to send is never dropped.
const PENDING_CODES: usize = 5;

/// The liveness of a link as seen from this side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// No contact with the peer. `Sync` is repeated until the peer answers.
    Shy,
    /// The peer answered. `Conf` is repeated until it is confirmed.
    Curious,
    /// Both sides confirmed the link; payloads flow and keep-alives supervise it.
    Garrulous,
}

#[derive(Clone, Debug)]
pub(crate) struct Sync {
    pub(crate) state: SyncState,
    pub(crate) timer: Timer,
    /// Keep-alive periods since anything was heard from the peer.
    pub(crate) misses: u8,
    /// Handshake octets to send, ahead of any payload and outside of the packet arena.
    pub(crate) pending: Deque<SyncCode, PENDING_CODES>,
}

impl Sync {
    pub(crate) fn new(period: u16) -> Self {
        Sync {
            state: SyncState::Shy,
            timer: Timer::armed(period),
            misses: 0,
            pending: Deque::new(),
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncState::Shy => write!(f, "shy"),
            SyncState::Curious => write!(f, "curious"),
            SyncState::Garrulous => write!(f, "garrulous"),
        }
    }
}

impl<const N: usize> State<N> {
    /// React to a single octet frame from the peer.
    pub(crate) fn sync_receive(&mut self, code: SyncCode) -> Option<Lifecycle> {
        let id = self.config.id;
        net_trace!("LTP{}: rx {:?} while {}", id, code, self.sync.state);

        match (self.sync.state, code) {
            (SyncState::Shy, SyncCode::Sync) | (SyncState::Curious, SyncCode::Sync) => {
                self.queue_sync(SyncCode::SyncResp);
            },
            (SyncState::Shy, SyncCode::SyncResp) => {
                net_debug!("LTP{}: peer answered, now curious", id);
                self.sync.state = SyncState::Curious;
                self.sync.timer.fire();
            },
            (SyncState::Curious, SyncCode::Conf) | (SyncState::Garrulous, SyncCode::Conf) => {
                self.queue_sync(SyncCode::ConfResp);
            },
            (SyncState::Curious, SyncCode::ConfResp) => {
                net_debug!("LTP{}: link active", id);
                self.sync.state = SyncState::Garrulous;
                self.sync.timer.arm(self.config.keep_alive_period);
                self.sync.misses = 0;
                self.control_start();
                return Some(Lifecycle::Active);
            },
            (SyncState::Garrulous, SyncCode::Sync) => {
                net_debug!("LTP{}: peer restarted", id);
                self.reset();
                return Some(Lifecycle::Reset);
            },
            (SyncState::Garrulous, _) => (),
            _ => return None,
        }

        if self.sync.state == SyncState::Garrulous {
            self.sync.misses = 0;
        }

        None
    }

    /// Run the handshake timer.
    pub(crate) fn sync_poll(&mut self) -> Option<Lifecycle> {
        if self.is_garrulous() {
            self.control_retry();
        }

        if !self.sync.timer.is_expired() {
            return None;
        }

        match self.sync.state {
            SyncState::Shy => {
                self.queue_sync(SyncCode::Sync);
                self.sync.timer.arm(self.config.sync_period);
            },
            SyncState::Curious => {
                self.queue_sync(SyncCode::Conf);
                self.sync.timer.arm(self.config.sync_period);
            },
            SyncState::Garrulous => {
                self.queue_sync(SyncCode::KeepAlive);
                self.sync.timer.arm(self.config.keep_alive_period);
                self.sync.misses = self.sync.misses.saturating_add(1);
                if self.sync.misses >= self.config.keep_alive_limit {
                    net_debug!("LTP{}: no keep-alive from peer", self.config.id);
                    self.reset();
                    return Some(Lifecycle::Reset);
                }
            },
        }

        None
    }

    /// Note traffic from the peer.
    pub(crate) fn sync_heard(&mut self) {
        if self.sync.state == SyncState::Garrulous {
            self.sync.misses = 0;
        }
    }

    pub(crate) fn is_garrulous(&self) -> bool {
        self.sync.state == SyncState::Garrulous
    }

    /// Queue a handshake octet unless the same one is still waiting.
    fn queue_sync(&mut self, code: SyncCode) {
        if self.sync.pending.iter().any(|waiting| *waiting == code) {
            return;
        }

        if self.sync.pending.push_back(code).is_err() {
            net_debug!("LTP{}: dropping handshake code {:?}", self.config.id, code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Config;

    fn state() -> State<8> {
        State::new(Config::default())
    }

    fn queued(state: &State<8>) -> Vec<SyncCode> {
        state.sync.pending.iter().copied().collect()
    }

    fn expire(state: &mut State<8>) {
        while !state.sync.timer.is_expired() {
            state.tick();
        }
    }

    #[test]
    fn shy_sends_sync() {
        let mut state = state();
        assert_eq!(state.sync_poll(), None);
        expire(&mut state);
        assert_eq!(state.sync_poll(), None);
        assert_eq!(queued(&state), [SyncCode::Sync]);
        // Not queued twice while the first is still waiting.
        expire(&mut state);
        state.sync_poll();
        assert_eq!(queued(&state), [SyncCode::Sync]);
    }

    #[test]
    fn sync_resp_makes_curious() {
        let mut state = state();
        assert_eq!(state.sync_receive(SyncCode::SyncResp), None);
        assert_eq!(state.sync.state, SyncState::Curious);
        assert!(state.sync.timer.is_expired());
        state.sync_poll();
        assert_eq!(queued(&state), [SyncCode::Conf]);
    }

    #[test]
    fn answers() {
        let mut state = state();
        state.sync_receive(SyncCode::Sync);
        assert_eq!(queued(&state), [SyncCode::SyncResp]);
        // Conf is ignored while shy.
        state.sync_receive(SyncCode::Conf);
        assert_eq!(queued(&state), [SyncCode::SyncResp]);

        state.sync_receive(SyncCode::SyncResp);
        state.sync_receive(SyncCode::Conf);
        assert_eq!(queued(&state), [SyncCode::SyncResp, SyncCode::ConfResp]);
    }

    #[test]
    fn conf_resp_activates() {
        let mut state = state();
        state.sync_receive(SyncCode::SyncResp);
        assert_eq!(state.sync_receive(SyncCode::ConfResp), Some(Lifecycle::Active));
        assert!(state.is_garrulous());
        assert_eq!(state.sync.timer, Timer::Armed(state.config.keep_alive_period));
    }

    #[test]
    fn keep_alive_timeout() {
        let mut state = state();
        state.sync_receive(SyncCode::SyncResp);
        state.sync_receive(SyncCode::ConfResp);

        for _ in 0..3 {
            expire(&mut state);
            assert_eq!(state.sync_poll(), None);
        }
        assert_eq!(state.sync.misses, 3);

        // Anything from the peer clears the count.
        state.sync_receive(SyncCode::KeepAlive);
        assert_eq!(state.sync.misses, 0);

        for _ in 0..3 {
            expire(&mut state);
            assert_eq!(state.sync_poll(), None);
        }
        expire(&mut state);
        assert_eq!(state.sync_poll(), Some(Lifecycle::Reset));
        assert_eq!(state.sync.state, SyncState::Shy);
        assert_eq!(state.stats.resets, 1);
        assert!(queued(&state).is_empty());
    }

    #[test]
    fn handshake_ignores_full_arena() {
        use crate::link::Payload;
        use crate::link::packet::Packet;
        use crate::wire::Channel;

        let mut state = state();
        while !state.arena.is_full() {
            state.enqueue(Packet::new(Channel::new(1).unwrap(), Payload::Static(&[1]))).unwrap();
        }

        expire(&mut state);
        state.sync_poll();
        state.sync_receive(SyncCode::Sync);
        assert_eq!(queued(&state), [SyncCode::Sync, SyncCode::SyncResp]);
        assert_eq!(state.stats.alloc_failures, 0);
    }

    #[test]
    fn sync_while_garrulous_resets() {
        let mut state = state();
        state.sync_receive(SyncCode::SyncResp);
        state.sync_receive(SyncCode::ConfResp);
        assert_eq!(state.sync_receive(SyncCode::Sync), Some(Lifecycle::Reset));
        assert_eq!(state.sync.state, SyncState::Shy);
    }
}
