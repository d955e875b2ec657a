use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KioskConfig {
    pub camera: CameraConfig,
    pub workflow: WorkflowConfig,
    pub transport: TransportConfig,
    pub geolocation: GeolocationConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Preferred camera facing ("user" for the front camera)
    #[serde(default = "default_facing_mode")]
    pub facing_mode: String,

    /// Ideal capture resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Countdown length for timed capture
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,

    /// Interval between countdown ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// How long a success message stays on screen before the kiosk resets
    #[serde(default = "default_success_window_seconds")]
    pub success_window_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransportConfig {
    /// Base URL of the recognition backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the scan endpoint
    #[serde(default = "default_scan_path")]
    pub scan_path: String,

    /// Request timeout in seconds
    #[serde(default = "default_transport_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct GeolocationConfig {
    /// Kiosk latitude; leave both coordinates unset when unknown
    pub latitude: Option<f64>,

    /// Kiosk longitude
    pub longitude: Option<f64>,

    /// Give up on a position after this many seconds
    #[serde(default = "default_geolocation_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl CameraConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl WorkflowConfig {
    pub fn success_window(&self) -> Duration {
        Duration::from_secs(self.success_window_seconds)
    }
}

impl TransportConfig {
    /// Full URL of the scan endpoint
    pub fn scan_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.scan_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl GeolocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Configured position, if both coordinates are set
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

impl KioskConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.facing_mode", default_facing_mode())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.countdown_seconds", default_countdown_seconds())?
            .set_default("camera.tick_interval_ms", default_tick_interval_ms())?
            .set_default(
                "workflow.success_window_seconds",
                default_success_window_seconds(),
            )?
            .set_default("transport.base_url", default_base_url())?
            .set_default("transport.scan_path", default_scan_path())?
            .set_default("transport.timeout_seconds", default_transport_timeout())?
            .set_default("geolocation.timeout_seconds", default_geolocation_timeout())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("KIOSK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: KioskConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.countdown_seconds == 0 {
            return Err(ConfigError::Message(
                "Camera countdown_seconds must be greater than 0".to_string(),
            ));
        }

        if self.camera.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Camera tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.workflow.success_window_seconds == 0 {
            return Err(ConfigError::Message(
                "Workflow success_window_seconds must be greater than 0".to_string(),
            ));
        }

        if self.transport.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Transport base_url must not be empty".to_string(),
            ));
        }

        if self.transport.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Transport timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.geolocation.latitude.is_some() != self.geolocation.longitude.is_some() {
            return Err(ConfigError::Message(
                "Geolocation latitude and longitude must be set together".to_string(),
            ));
        }

        if self.geolocation.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Geolocation timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                facing_mode: default_facing_mode(),
                resolution: default_camera_resolution(),
                countdown_seconds: default_countdown_seconds(),
                tick_interval_ms: default_tick_interval_ms(),
            },
            workflow: WorkflowConfig {
                success_window_seconds: default_success_window_seconds(),
            },
            transport: TransportConfig {
                base_url: default_base_url(),
                scan_path: default_scan_path(),
                timeout_seconds: default_transport_timeout(),
            },
            geolocation: GeolocationConfig {
                latitude: None,
                longitude: None,
                timeout_seconds: default_geolocation_timeout(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_facing_mode() -> String {
    "user".to_string()
}
fn default_camera_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_countdown_seconds() -> u32 {
    3
}
fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_success_window_seconds() -> u64 {
    5
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_scan_path() -> String {
    "/scan".to_string()
}
fn default_transport_timeout() -> u64 {
    30
}

fn default_geolocation_timeout() -> u64 {
    10
}

fn default_event_bus_capacity() -> usize {
    100
}
