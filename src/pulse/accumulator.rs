use core::sync::atomic::{AtomicU32, Ordering};

/// Marks "no edge accepted yet". Real timestamps are clamped below it.
const NO_EDGE: u32 = u32::MAX;

/// Debounced pulse counter shared between the edge ISR and the meter loop.
///
/// Everything is a 32-bit atomic so the ISR path stays lock-free on cores
/// without 64-bit atomics. Timestamps are microseconds truncated to 32 bits
/// and compared with wrapping arithmetic, so gaps are measured correctly as
/// long as two edges are less than ~71 minutes apart. The meter loop calls
/// [`PulseAccumulator::release_stale_edge`] every cycle so the reference
/// never gets that old.
pub struct PulseAccumulator {
    debounce_us: u32,
    count: AtomicU32,
    last_accepted_us: AtomicU32,
    accepted_total: AtomicU32,
    rejected_total: AtomicU32,
}

impl PulseAccumulator {
    pub fn new(debounce_us: u32) -> Self {
        Self {
            debounce_us,
            count: AtomicU32::new(0),
            last_accepted_us: AtomicU32::new(NO_EDGE),
            accepted_total: AtomicU32::new(0),
            rejected_total: AtomicU32::new(0),
        }
    }

    pub fn debounce_us(&self) -> u32 {
        self.debounce_us
    }

    /// Record one raw edge observed at `now_us`.
    ///
    /// ISR-safe: only atomics, no allocation, no logging. Edges closer than
    /// the debounce window to the last accepted edge are dropped silently.
    /// Returns `true` if the edge was counted.
    pub fn on_edge(&self, now_us: u64) -> bool {
        let now = (now_us as u32).min(NO_EDGE - 1);
        let mut last = self.last_accepted_us.load(Ordering::Acquire);

        loop {
            if last != NO_EDGE && now.wrapping_sub(last) < self.debounce_us {
                self.rejected_total.fetch_add(1, Ordering::Relaxed);
                return false;
            }

            match self.last_accepted_us.compare_exchange_weak(
                last,
                now,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => last = actual,
            }
        }

        self.count.fetch_add(1, Ordering::AcqRel);
        self.accepted_total.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Take the pulses counted since the previous drain.
    ///
    /// A single atomic swap, so an edge landing concurrently is either in
    /// this result or in the next one, never both and never neither.
    pub fn drain_and_reset(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Forget the last accepted edge once its debounce window has passed.
    ///
    /// Loop context only. After a release the next edge is accepted
    /// unconditionally. A reference that appears to be ahead of `now_us` is
    /// left alone. Returns `true` if it was released.
    pub fn release_stale_edge(&self, now_us: u64) -> bool {
        let now = (now_us as u32).min(NO_EDGE - 1);
        let last = self.last_accepted_us.load(Ordering::Acquire);
        if last == NO_EDGE {
            return false;
        }

        let age = now.wrapping_sub(last);
        if age < self.debounce_us || age > u32::MAX / 2 {
            return false;
        }

        // Fails if the ISR accepted a newer edge in the meantime
        self.last_accepted_us
            .compare_exchange(last, NO_EDGE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Pulses counted since the last drain, without resetting.
    pub fn pending(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    pub fn accepted_total(&self) -> u32 {
        self.accepted_total.load(Ordering::Relaxed)
    }

    pub fn rejected_total(&self) -> u32 {
        self.rejected_total.load(Ordering::Relaxed)
    }
}

impl Default for PulseAccumulator {
    fn default() -> Self {
        Self::new(crate::meter::DEFAULT_DEBOUNCE_MS * 1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW_US: u32 = 50_000;

    #[test]
    fn first_edge_is_always_accepted() {
        let acc = PulseAccumulator::new(WINDOW_US);
        assert!(acc.on_edge(10));
        assert_eq!(acc.pending(), 1);
    }

    #[test]
    fn edge_exactly_one_window_later_counts() {
        let acc = PulseAccumulator::new(WINDOW_US);
        assert!(acc.on_edge(1_000));
        assert!(!acc.on_edge(1_000 + WINDOW_US as u64 - 1));
        assert!(acc.on_edge(1_000 + WINDOW_US as u64));
        assert_eq!(acc.drain_and_reset(), 2);
        assert_eq!(acc.rejected_total(), 1);
    }

    #[test]
    fn bounce_is_measured_from_last_accepted_edge() {
        let acc = PulseAccumulator::new(WINDOW_US);
        acc.on_edge(0);
        // A stream of bounces every 10ms never moves the reference point
        for t in (10_000..50_000).step_by(10_000) {
            assert!(!acc.on_edge(t));
        }
        assert!(acc.on_edge(50_000));
        assert_eq!(acc.accepted_total(), 2);
    }

    #[test]
    fn drain_resets_count_but_not_debounce_reference() {
        let acc = PulseAccumulator::new(WINDOW_US);
        acc.on_edge(100_000);
        assert_eq!(acc.drain_and_reset(), 1);
        assert_eq!(acc.drain_and_reset(), 0);
        assert!(!acc.on_edge(120_000));
        assert_eq!(acc.pending(), 0);
    }

    #[test]
    fn timestamp_wraparound_is_handled() {
        let acc = PulseAccumulator::new(WINDOW_US);
        let near_wrap = (u32::MAX - 5_000) as u64;
        assert!(acc.on_edge(near_wrap));
        // Both of these land after the 32-bit timestamp wrapped
        assert!(!acc.on_edge(near_wrap + 10_000));
        assert!(acc.on_edge(near_wrap + 60_000));
        assert_eq!(acc.pending(), 2);
    }

    const CLOCK_PERIOD_US: u64 = 1 << 32;

    #[test]
    fn edge_one_clock_period_later_aliases_without_release() {
        let acc = PulseAccumulator::new(WINDOW_US);
        assert!(acc.on_edge(1_000));
        // 71.6 minutes later the truncated timestamp lands inside the window
        assert!(!acc.on_edge(1_000 + CLOCK_PERIOD_US + 10_000));
        assert!(acc.on_edge(1_000 + CLOCK_PERIOD_US + WINDOW_US as u64));
    }

    #[test]
    fn released_reference_accepts_edge_after_a_full_clock_period() {
        let acc = PulseAccumulator::new(WINDOW_US);
        assert!(acc.on_edge(1_000));
        assert!(acc.release_stale_edge(60_000_000));
        assert!(acc.on_edge(1_000 + CLOCK_PERIOD_US + 10_000));
        assert_eq!(acc.drain_and_reset(), 2);
    }

    #[test]
    fn release_keeps_a_reference_still_inside_the_window() {
        let acc = PulseAccumulator::new(WINDOW_US);
        assert!(!acc.release_stale_edge(5_000));
        assert!(acc.on_edge(100_000));
        assert!(!acc.release_stale_edge(120_000));
        assert!(!acc.on_edge(130_000));
        // A reference stamped after the loop's clock reading stays put
        assert!(!acc.release_stale_edge(90_000));
        assert!(!acc.on_edge(140_000));
    }
}
