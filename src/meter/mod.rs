pub mod aggregator;
pub mod config;
pub mod schedule;
pub mod service;
pub mod volume;

pub use aggregator::Aggregator;
pub use config::{
    MeterConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_INITIAL_VOLUME, DEFAULT_LITERS_PER_PULSE,
    DEFAULT_TICK_INTERVAL_MS,
};
pub use schedule::TickSchedule;
pub use service::MeterService;
pub use volume::Volume;
