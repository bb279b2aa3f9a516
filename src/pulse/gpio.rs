use super::accumulator::PulseAccumulator;
use esp_idf_hal::gpio::{Input, InterruptType, Pin, PinDriver};
use esp_idf_hal::task::notification::Notification;
use esp_idf_svc::sys;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Spawn the pulse capture thread for a flow meter output on `pulse_pin`.
///
/// The ISR timestamps each falling edge and feeds it to the accumulator
/// directly. The HAL disarms a pin interrupt after every trigger, so the
/// thread only exists to re-arm it. It never touches the meter loop, which
/// keeps counting alive while the loop is blocked on the network.
pub fn spawn_pulse_thread<P>(
    accumulator: Arc<PulseAccumulator>,
    mut pulse_pin: PinDriver<'static, P, Input>,
) -> anyhow::Result<()>
where
    P: Pin,
{
    std::thread::Builder::new()
        .stack_size(4096)
        .name("pulse_thread".to_string())
        .spawn(move || {
            log::info!("Pulse: Background thread started");

            let notification = Notification::new();
            let notifier = notification.notifier();
            let isr_accumulator = Arc::clone(&accumulator);

            if let Err(e) = pulse_pin.set_interrupt_type(InterruptType::NegEdge) {
                log::warn!("❌ Pulse: Failed to set falling-edge interrupt: {:?}", e);
                return;
            }

            // Safety: the closure only touches the accumulator's atomics and
            // the notifier, both of which are ISR-safe
            let subscribed = unsafe {
                pulse_pin.subscribe(move || {
                    let now_us = sys::esp_timer_get_time() as u64;
                    isr_accumulator.on_edge(now_us);
                    if let Some(bits) = NonZeroU32::new(1) {
                        notifier.notify_and_yield(bits);
                    }
                })
            };
            if let Err(e) = subscribed {
                log::warn!("❌ Pulse: Failed to subscribe to pulse pin interrupt: {:?}", e);
                return;
            }

            log::info!(
                "✅ Pulse: Falling-edge interrupt armed (debounce {} us)",
                accumulator.debounce_us()
            );

            loop {
                if let Err(e) = pulse_pin.enable_interrupt() {
                    log::warn!("❌ Pulse: Failed to re-arm interrupt: {:?}", e);
                }
                notification.wait(u32::MAX);
            }
        })?;

    log::info!("Pulse: Background thread spawned successfully");
    Ok(())
}
