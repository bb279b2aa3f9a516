mod common;

use common::RecordingBroker;
use proptest::prelude::*;
use pulse_water_meter::{
    Aggregator, CommandChannel, MemorySlot, MeterConfig, MeterService, MeterTopics,
    PulseAccumulator, TickSchedule, VolumeStore,
};
use std::sync::{mpsc, Arc};

const INTERVAL_MS: u64 = 60_000;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn processing_delay_never_accumulates_drift(
        delays in proptest::collection::vec(0u64..=500, 1000),
        start in 0u64..1_000_000,
    ) {
        let mut schedule = TickSchedule::new(start, INTERVAL_MS);
        let mut now = start;
        let mut fired = Vec::with_capacity(delays.len());

        for delay in &delays {
            // Sleep until the deadline, then lose some time to processing
            now = now.max(schedule.next_deadline_ms());
            let deadline = schedule.poll(now);
            prop_assert!(deadline.is_some());
            fired.push(deadline.unwrap());
            now += delay;
        }

        prop_assert_eq!(*fired.last().unwrap() - start, 1000 * INTERVAL_MS);
        for pair in fired.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], INTERVAL_MS);
        }
    }
}

#[test]
fn service_ticks_stay_on_the_grid_with_a_jittery_loop() {
    let (_tx, rx) = mpsc::channel();
    let channel = CommandChannel::new(
        Arc::new(RecordingBroker::connected()),
        MeterTopics::from_base("water").unwrap(),
        rx,
    );
    let aggregator = Aggregator::new(MeterConfig::default(), VolumeStore::new(MemorySlot::new()));
    let mut service = MeterService::new(Arc::new(PulseAccumulator::default()), aggregator, channel, 0);

    // A 10ms loop that occasionally stalls for up to 700ms
    let mut now = 0u64;
    let mut uptimes = Vec::new();
    while uptimes.len() < 100 {
        if let Some(record) = service.poll(now) {
            uptimes.push(record.uptime_secs);
        }
        now += if now % 7_000 == 0 { 700 } else { 10 };
    }

    assert_eq!(service.schedule().ticks(), 100);
    assert_eq!(service.schedule().next_deadline_ms(), 101 * INTERVAL_MS);
    for (i, uptime) in uptimes.iter().enumerate() {
        assert_eq!(*uptime, (i as u64 + 1) * 60);
    }
}
