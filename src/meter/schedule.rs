/// Fixed-cadence tick deadlines.
///
/// Each deadline is the previous deadline plus the interval, so time spent
/// processing a cycle never pushes later cycles back.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval_ms: u64,
    next_deadline_ms: u64,
    ticks: u64,
}

impl TickSchedule {
    pub fn new(start_ms: u64, interval_ms: u64) -> Self {
        let interval_ms = interval_ms.max(1);
        Self {
            interval_ms,
            next_deadline_ms: start_ms + interval_ms,
            ticks: 0,
        }
    }

    /// Fire at most one tick if `now_ms` has reached the next deadline.
    ///
    /// Returns the deadline that fired. A loop that fell behind by several
    /// intervals catches up one tick per call.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        if now_ms < self.next_deadline_ms {
            return None;
        }
        let fired = self.next_deadline_ms;
        self.next_deadline_ms += self.interval_ms;
        self.ticks += 1;
        Some(fired)
    }

    pub fn next_deadline_ms(&self) -> u64 {
        self.next_deadline_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
