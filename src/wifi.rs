use crate::network_config::WifiConfig;
use anyhow::Result;
use esp_idf_hal::modem::Modem;
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

/// Station-mode link to the provisioned access point.
pub struct WifiLink {
    wifi: Box<BlockingWifi<EspWifi<'static>>>,
}

impl WifiLink {
    pub fn connect(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        config: &WifiConfig,
    ) -> Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let auth_method = if config.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config.ssid.clone(),
            auth_method,
            password: config.password.clone(),
            ..Default::default()
        }))?;

        info!("🌐 WiFi: Connecting to '{}'...", config.ssid);
        wifi.start()?;
        wifi.connect()?;
        wifi.wait_netif_up()?;

        let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
        info!("✅ WiFi: Connected, IP address: {}", ip_info.ip);

        Ok(Self {
            wifi: Box::new(wifi),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Blocking re-join when the station dropped. Pulse capture keeps
    /// running meanwhile on its own thread.
    pub fn reconnect_if_dropped(&mut self) {
        if self.is_connected() {
            return;
        }

        warn!("🔌 WiFi: Link lost, reconnecting...");
        match self.wifi.connect().and_then(|_| self.wifi.wait_netif_up()) {
            Ok(()) => info!("✅ WiFi: Reconnected"),
            Err(e) => warn!("❌ WiFi: Reconnect failed: {:?}", e),
        }
    }
}
