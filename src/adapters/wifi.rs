//! WiFi adapter: station plus setup access point.
//!
//! Implements [`NetworkPort`], the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi` (mixed STA + AP mode when both are wanted).
//! - **all other targets**: simulation stubs for host-side runs and tests.

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::app::ports::{NetworkError, NetworkPort};
use crate::config::{validate_essid, validate_password};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    essid: heapless::String<32>,
    password: heapless::String<64>,
}

impl Credentials {
    fn new(essid: &str, password: &str) -> Result<Self, NetworkError> {
        validate_essid(essid).map_err(|_| NetworkError::InvalidSsid)?;
        validate_password(password).map_err(|_| NetworkError::InvalidPassword)?;
        let mut creds = Self {
            essid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds.essid.push_str(essid).map_err(|_| NetworkError::InvalidSsid)?;
        creds.password.push_str(password).map_err(|_| NetworkError::InvalidPassword)?;
        Ok(creds)
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    station: Option<Credentials>,
    access_point: Option<Credentials>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: fail the next connect attempt.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next: bool,
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, NetworkError> {
        let driver = EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|e| {
            error!("WiFi: driver init failed: {}", e);
            NetworkError::HardwareError
        })?;
        let wifi = BlockingWifi::wrap(driver, sysloop).map_err(|_| NetworkError::HardwareError)?;
        info!("WiFi: ESP-IDF driver ready");
        Ok(Self {
            state: WifiState::Disconnected,
            station: None,
            access_point: None,
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("WiFi: simulation backend");
        Self {
            state: WifiState::Disconnected,
            station: None,
            access_point: None,
            sim_fail_next: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Make the next simulated connect fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_next_connect(&mut self) {
        self.sim_fail_next = true;
    }

    // ── Platform-specific ─────────────────────────────────────

    /// Push the wanted STA/AP combination to the driver.
    #[cfg(target_os = "espidf")]
    fn apply_configuration(&mut self) -> Result<(), NetworkError> {
        let client = self.station.as_ref().map(|c| ClientConfiguration {
            ssid: c.essid.clone(),
            password: c.password.clone(),
            auth_method: if c.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        let ap = self.access_point.as_ref().map(|c| AccessPointConfiguration {
            ssid: c.essid.clone(),
            password: c.password.clone(),
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });
        let configuration = match (client, ap) {
            (Some(client), Some(ap)) => Configuration::Mixed(client, ap),
            (Some(client), None) => Configuration::Client(client),
            (None, Some(ap)) => Configuration::AccessPoint(ap),
            (None, None) => Configuration::None,
        };
        self.wifi.set_configuration(&configuration).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            NetworkError::HardwareError
        })?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| NetworkError::HardwareError)?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn apply_configuration(&mut self) -> Result<(), NetworkError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), NetworkError> {
        self.wifi.connect().map_err(|_| NetworkError::ConnectFailed)?;
        self.wifi.wait_netif_up().map_err(|_| NetworkError::ConnectFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), NetworkError> {
        if core::mem::take(&mut self.sim_fail_next) {
            warn!("WiFi(sim): simulated association failure");
            return Err(NetworkError::ConnectFailed);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_station_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.wifi().sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_station_ip(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 1, 50))
    }

    #[cfg(target_os = "espidf")]
    fn platform_ap_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.wifi().ap_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ap_ip(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 4, 1))
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn connect(&mut self, essid: &str, password: &str) -> Result<(), NetworkError> {
        let creds = Credentials::new(essid, password)?;
        info!("WiFi: connecting to '{}'", creds.essid);
        self.station = Some(creds);
        self.state = WifiState::Connecting;

        let result = self.apply_configuration().and_then(|()| self.platform_connect());
        match result {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: connected ({:?})", self.station_ip());
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    fn start_ap(&mut self, essid: &str, password: &str) -> Result<(), NetworkError> {
        let creds = Credentials::new(essid, password).map_err(|_| NetworkError::AccessPointFailed)?;
        self.access_point = Some(creds);
        self.apply_configuration()
            .map_err(|_| NetworkError::AccessPointFailed)?;
        info!("WiFi: access point '{}' up", essid);
        Ok(())
    }

    fn stop_ap(&mut self) -> Result<(), NetworkError> {
        if self.access_point.take().is_none() {
            return Ok(());
        }
        self.apply_configuration()
            .map_err(|_| NetworkError::AccessPointFailed)?;
        info!("WiFi: access point down");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        if !self.is_connected() {
            return None;
        }
        self.platform_station_ip()
    }

    fn ap_ip(&self) -> Option<Ipv4Addr> {
        self.access_point.as_ref()?;
        self.platform_ap_ip()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
