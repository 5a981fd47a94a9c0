//! Simulates octet loss on a wire.
use super::{RxStream, TxStream};

/// Simple pseudo-random loss.
///
/// Can simulate burst-losses and uniform losses by dropping octets based on a pulse design.
#[derive(Copy, Clone, Debug, Hash)]
pub struct PrngLoss {
    /// Threshold for dropping the octet.
    pub threshold: u32,
    /// The octet is never dropped while `count` at least as large as `threshold`.
    pub count: u32,
    /// Reset value for `count` when it reaches `0`.
    pub reset: u32,
    /// Loss rate as a (0, 32)-bit fixed point number.
    ///
    /// Or `None` for no loss at all, which can be used to temporarily turn loss off.
    pub lossrate: Option<u32>,
    /// The current prng state (or seed at the start).
    pub prng: Xoroshiro256,
}

/// The xoroshiro256** generator.
#[derive(Copy, Clone, Debug, Hash)]
pub struct Xoroshiro256 {
    state: [u64; 4],
}

impl PrngLoss {
    /// A uniform loss simulator.
    pub fn uniform(rate: Option<u32>, seed: u64) -> Self {
        PrngLoss {
            // Threshold always greater than count
            threshold: 1,
            count: 0,
            reset: 0,
            lossrate: rate,
            prng: Xoroshiro256::new(seed),
        }
    }

    /// A uniform loss simulator dropping roughly `percent` out of a hundred octets.
    pub fn percent(percent: u8, seed: u64) -> Self {
        let rate = match percent {
            0 => None,
            p if p >= 100 => Some(u32::MAX),
            p => Some((u64::from(u32::MAX) * u64::from(p) / 100) as u32),
        };
        Self::uniform(rate, seed)
    }

    /// Simulate burst losses as pulses.
    ///
    /// Drops all octets while in a high state, lets octets pass while in low state. Returns `None`
    /// for a zero length or a high state longer than the pulse.
    pub fn pulsed(high: u32, length: u32) -> Option<Self> {
        if length == 0 || high > length {
            return None;
        }

        Some(PrngLoss {
            threshold: high,
            count: length - 1,
            reset: length - 1,
            // Octet always lost when pulse condition is true.
            lossrate: Some(u32::MAX),
            prng: Xoroshiro256::new(0),
        })
    }

    /// Determine the fate for the next octet, `true` if it is lost.
    pub fn next(&mut self) -> bool {
        let in_window = self.count < self.threshold;
        let fate = Some(self.roll()) <= self.lossrate;

        let ncount = self.count.checked_sub(1)
            .unwrap_or(self.reset);
        self.count = ncount;

        fate & in_window
    }

    /// Generate the next value of the prng.
    fn roll(&mut self) -> u32 {
        (self.prng.next() & u64::from(!0u32)) as u32
    }
}

impl Xoroshiro256 {
    /// Seed the generator.
    pub fn new(seed: u64) -> Self {
        Xoroshiro256 {
            state: [seed, seed.rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15, 0, 0],
        }
    }

    /// The next pseudo-random value.
    pub fn next(&mut self) -> u64 {
        let s = &mut self.state;
        let result_starstar = s[1]
            .wrapping_mul(5)
            .rotate_left(7)
            .wrapping_mul(9);

        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;

        s[3] = s[3].rotate_left(45);

        result_starstar
    }
}

/// Move as many octets as possible, dropping those the loss model decides to lose.
///
/// Returns the number of octets delivered.
pub fn transfer_lossy<R, T>(from: &mut R, to: &mut T, loss: &mut PrngLoss) -> usize
where
    R: RxStream + ?Sized,
    T: TxStream + ?Sized,
{
    let mut delivered = 0;
    while to.space() > 0 {
        let byte = match from.read() {
            Some(byte) => byte,
            None => break,
        };

        if loss.next() {
            continue;
        }

        to.write(byte);
        delivered += 1;
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::Ring;

    #[test]
    fn pulsed() {
        // Drops one out of 10 octets.
        let mut prng = PrngLoss::pulsed(1, 10).unwrap();
        let count = (0..100)
            .filter(|_| prng.next())
            .count();
        assert_eq!(count, 10);

        // Drops all octets.
        prng = PrngLoss::pulsed(1, 1).unwrap();
        let count = (0..100)
            .filter(|_| prng.next())
            .count();
        assert_eq!(count, 100);

        // Drops at most one out of 10 octets.
        prng = PrngLoss::pulsed(1, 10).unwrap();
        prng.lossrate = Some(!0 >> 1);
        let count = (0..100)
            .filter(|_| prng.next())
            .count();
        assert!(count <= 10);

        assert!(PrngLoss::pulsed(2, 1).is_none());
    }

    #[test]
    fn lossless_transfer() {
        let mut from = Ring::<16>::new();
        let mut to = Ring::<16>::new();
        from.extend_from_slice(&[1, 2, 3, 4]);
        let mut loss = PrngLoss::percent(0, 7);
        assert_eq!(transfer_lossy(&mut from, &mut to, &mut loss), 4);
        assert_eq!(to.len(), 4);
    }

    #[test]
    fn total_loss() {
        let mut from = Ring::<16>::new();
        let mut to = Ring::<16>::new();
        from.extend_from_slice(&[1, 2, 3, 4]);
        let mut loss = PrngLoss::percent(100, 7);
        assert_eq!(transfer_lossy(&mut from, &mut to, &mut loss), 0);
        assert!(from.is_empty());
        assert!(to.is_empty());
    }
}
