use super::aggregator::Aggregator;
use super::schedule::TickSchedule;
use crate::pulse::PulseAccumulator;
use crate::store::VolumeSlot;
use crate::telemetry::{CommandChannel, TelemetryRecord, Transport};
use std::sync::Arc;

/// The cooperative meter loop, one [`MeterService::poll`] per iteration.
pub struct MeterService<S: VolumeSlot, T: Transport> {
    pulses: Arc<PulseAccumulator>,
    aggregator: Aggregator<S>,
    channel: CommandChannel<T>,
    schedule: TickSchedule,
}

impl<S: VolumeSlot, T: Transport> MeterService<S, T> {
    pub fn new(
        pulses: Arc<PulseAccumulator>,
        aggregator: Aggregator<S>,
        channel: CommandChannel<T>,
        start_ms: u64,
    ) -> Self {
        let schedule = TickSchedule::new(start_ms, aggregator.config().tick_interval_ms);
        Self {
            pulses,
            aggregator,
            channel,
            schedule,
        }
    }

    /// Run one loop iteration at `now_ms` (milliseconds since boot).
    ///
    /// Commands are applied first, then a due cycle drains the pulse count,
    /// updates the aggregator and publishes. Returns the record of the cycle
    /// if one ran.
    pub fn poll(&mut self, now_ms: u64) -> Option<TelemetryRecord> {
        self.channel.maintain_subscription();
        self.channel.dispatch(&mut self.aggregator);

        self.schedule.poll(now_ms)?;

        let pulses = self.pulses.drain_and_reset();
        self.pulses.release_stale_edge(now_ms.saturating_mul(1000));
        let record = self.aggregator.tick(pulses, now_ms / 1000);

        if let Err(e) = self.channel.publish(&record) {
            log::warn!("❌ Meter: {}, next cycle will publish again", e);
        }

        if self.schedule.ticks() % 60 == 0 {
            log::info!(
                "Meter: {} cycles of {} ms, last flow {} L/min, published {}, overrides rejected {}, edges accepted {} / debounced {}",
                self.schedule.ticks(),
                self.schedule.interval_ms(),
                self.aggregator.flow_rate_lpm(),
                self.channel.publish_count(),
                self.channel.rejected_commands(),
                self.pulses.accepted_total(),
                self.pulses.rejected_total()
            );
        }

        Some(record)
    }

    pub fn aggregator(&self) -> &Aggregator<S> {
        &self.aggregator
    }

    pub fn channel(&self) -> &CommandChannel<T> {
        &self.channel
    }

    pub fn schedule(&self) -> &TickSchedule {
        &self.schedule
    }
}
