#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::gpio::{Gpio12, Input, PinDriver, Pull};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};
    use esp_idf_svc::sys;
    use pulse_water_meter::meter::{Aggregator, MeterService};
    use pulse_water_meter::network_config::ProvisionedConfig;
    use pulse_water_meter::pulse::{spawn_pulse_thread, PulseAccumulator};
    use pulse_water_meter::store::{NvsSlot, VolumeStore};
    use pulse_water_meter::telemetry::{CommandChannel, MqttTransport};
    use pulse_water_meter::wifi::WifiLink;
    use std::sync::{mpsc, Arc};

    /// Written by the provisioning portal, read-only here.
    const PROVISION_NAMESPACE: &str = "provision";
    const PROVISION_KEY: &str = "config";
    const WIFI_CHECK_INTERVAL_MS: u64 = 10_000;

    fn now_ms() -> u64 {
        // Safety: esp_timer_get_time has no preconditions
        (unsafe { sys::esp_timer_get_time() }).max(0) as u64 / 1000
    }

    fn load_provisioned(partition: EspDefaultNvsPartition) -> ProvisionedConfig {
        let mut buf = [0u8; 512];
        let record = EspNvs::new(partition, PROVISION_NAMESPACE, false)
            .ok()
            .and_then(|nvs| {
                nvs.get_blob(PROVISION_KEY, &mut buf)
                    .ok()
                    .flatten()
                    .map(|bytes| bytes.to_vec())
            });

        match record.map(|bytes| ProvisionedConfig::from_json(&bytes)) {
            Some(Ok(config)) => {
                log::info!("✅ Provisioned configuration loaded");
                config
            }
            Some(Err(e)) => {
                log::warn!("❌ Provisioned configuration unusable ({}), using defaults", e);
                ProvisionedConfig::default()
            }
            None => {
                log::warn!("No provisioned configuration, using defaults");
                ProvisionedConfig::default()
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        log::info!("ESP32 Pulse Water Meter");
        log::info!("Initializing...");

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let provisioned = load_provisioned(nvs.clone());
        let meter_config = provisioned.meter_config();
        let topics = provisioned.mqtt.topics()?;

        // Counting starts before the network so no flow is missed at boot
        log::info!("Initializing pulse input on GPIO12 (pull-up, falling edge)...");
        let mut pulse_pin: PinDriver<'static, Gpio12, Input> =
            PinDriver::input(peripherals.pins.gpio12)?;
        pulse_pin.set_pull(Pull::Up)?;

        let pulses = Arc::new(PulseAccumulator::new(meter_config.debounce_micros()));
        spawn_pulse_thread(Arc::clone(&pulses), pulse_pin)?;

        let mut wifi = WifiLink::connect(peripherals.modem, sysloop, nvs.clone(), &provisioned.wifi)?;

        let (inbound_tx, inbound_rx) = mpsc::channel();
        let transport = MqttTransport::new(&provisioned.mqtt, inbound_tx)?;

        let store = VolumeStore::new(NvsSlot::new(nvs)?);
        let aggregator = Aggregator::new(meter_config, store);
        let channel = CommandChannel::new(transport, topics, inbound_rx);

        let mut last_wifi_check = now_ms();
        let mut service = MeterService::new(pulses, aggregator, channel, last_wifi_check);

        log::info!(
            "✅ Meter running: state '{}', commands '{}'",
            service.channel().topics().state,
            service.channel().topics().set
        );

        loop {
            let now = now_ms();
            service.poll(now);

            if now - last_wifi_check >= WIFI_CHECK_INTERVAL_MS {
                wifi.reconnect_if_dropped();
                last_wifi_check = now;
            }

            FreeRtos::delay_ms(10);
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("pulse_meter is ESP-IDF firmware; build it for an espidf target")
}
