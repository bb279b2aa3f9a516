use super::config::MeterConfig;
use super::volume::Volume;
use crate::store::{VolumeSlot, VolumeStore};
use crate::telemetry::TelemetryRecord;

/// Owns the cumulative volume and its persistence.
pub struct Aggregator<S: VolumeSlot> {
    config: MeterConfig,
    store: VolumeStore<S>,
    volume: Volume,
    flow_rate_lpm: u32,
    persisted: bool,
}

impl<S: VolumeSlot> Aggregator<S> {
    pub fn new(config: MeterConfig, mut store: VolumeStore<S>) -> Self {
        let volume = store.load(config.initial_volume);
        log::info!(
            "Meter: Starting at {} m3 ({} L/pulse, {} ms cycle)",
            volume,
            config.liters_per_pulse,
            config.tick_interval_ms
        );

        Self {
            config,
            store,
            volume,
            flow_rate_lpm: 0,
            persisted: true,
        }
    }

    /// Fold one cycle's pulses into flow rate and cumulative volume.
    ///
    /// The volume is persisted before returning. A failed write is logged
    /// and the in-memory value stays authoritative until a later write
    /// succeeds.
    pub fn tick(&mut self, pulses: u32, uptime_secs: u64) -> TelemetryRecord {
        let liters = pulses as u64 * self.config.liters_per_pulse as u64;

        self.flow_rate_lpm = self.config.liters_per_minute(liters);
        self.volume = self.volume.saturating_add_liters(liters);
        self.persist();

        log::info!(
            "Meter: {} pulses -> {} L/min, total {} m3",
            pulses,
            self.flow_rate_lpm,
            self.volume
        );

        TelemetryRecord {
            flow_rate_lpm: self.flow_rate_lpm,
            volume: self.volume,
            uptime_secs,
        }
    }

    /// Replace the cumulative volume and persist it immediately.
    pub fn set_volume(&mut self, volume: Volume) {
        log::info!("Meter: Volume set {} -> {} m3", self.volume, volume);
        self.volume = volume;
        self.persist();
    }

    /// Like [`Aggregator::set_volume`] for a raw m³ value. Negative, NaN and
    /// out-of-range values are ignored. Returns whether the value was applied.
    pub fn set_volume_m3(&mut self, m3: f64) -> bool {
        match Volume::from_cubic_meters(m3) {
            Some(volume) => {
                self.set_volume(volume);
                true
            }
            None => {
                log::warn!("Meter: Ignoring invalid volume {}", m3);
                false
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(self.volume) {
            Ok(()) => self.persisted = true,
            Err(e) => {
                self.persisted = false;
                log::warn!("❌ Meter: {} ({} m3 kept in memory)", e, self.volume);
            }
        }
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn flow_rate_lpm(&self) -> u32 {
        self.flow_rate_lpm
    }

    /// Whether the last write reached the store.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn store(&self) -> &VolumeStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VolumeStore<S> {
        &mut self.store
    }
}
