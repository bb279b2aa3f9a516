pub mod accumulator;
#[cfg(target_os = "espidf")]
pub mod gpio;

pub use accumulator::PulseAccumulator;
#[cfg(target_os = "espidf")]
pub use gpio::spawn_pulse_thread;
