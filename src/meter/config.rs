use super::volume::Volume;

pub const DEFAULT_LITERS_PER_PULSE: u32 = 10;
pub const DEFAULT_DEBOUNCE_MS: u32 = 50;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_INITIAL_VOLUME: Volume = Volume::from_liters(123_456);

#[derive(Debug, Clone)]
pub struct MeterConfig {
    /// Volume represented by one debounced pulse (liters)
    pub liters_per_pulse: u32,

    /// Minimum spacing between two counted edges (ms)
    pub debounce_ms: u32,

    /// Aggregation cadence (ms)
    pub tick_interval_ms: u64,

    /// Volume used when the persisted value is absent or invalid
    pub initial_volume: Volume,
}

impl MeterConfig {
    pub fn debounce_micros(&self) -> u32 {
        self.debounce_ms.saturating_mul(1_000)
    }

    /// Liters measured over one cycle scaled to liters per minute.
    ///
    /// With the default 60 s interval this is the cycle volume itself.
    pub fn liters_per_minute(&self, liters_in_cycle: u64) -> u32 {
        let interval_ms = self.tick_interval_ms.max(1);
        let per_minute = liters_in_cycle.saturating_mul(60_000) / interval_ms;
        per_minute.min(u32::MAX as u64) as u32
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            liters_per_pulse: DEFAULT_LITERS_PER_PULSE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            initial_volume: DEFAULT_INITIAL_VOLUME,
        }
    }
}
