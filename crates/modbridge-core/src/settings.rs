// Modbridge Settings Module
// Daemon configuration loaded from TOML with built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::input::{DeviceId, DeviceRole, RetryPolicy};
use crate::transport::{OverflowPolicy, DEFAULT_CAPACITY};

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// One physical device and the identity of its virtual counterpart
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSettings {
    pub vendor: u16,
    pub model: u16,
    /// Name given to the virtual output device
    #[serde(default)]
    pub name: Option<String>,
}

impl DeviceSettings {
    pub fn new(vendor: u16, model: u16) -> Self {
        Self {
            vendor,
            model,
            name: None,
        }
    }

    pub fn id(&self) -> DeviceId {
        DeviceId::new(self.vendor, self.model)
    }

    /// Configured virtual device name, or the built-in one for `role`
    pub fn name_for(&self, role: DeviceRole) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("modbridge (virtual) {}", role.as_str()))
    }
}

/// Shared transport sizing and overflow behaviour
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportSettings {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            overflow: OverflowPolicy::Abort,
        }
    }
}

/// Delays used when a device disappears
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectSettings {
    pub settle_ms: u64,
    pub backoff_ms: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            settle_ms: 1000,
            backoff_ms: 5000,
        }
    }
}

impl ReconnectSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.settle_ms),
            Duration::from_millis(self.backoff_ms),
        )
    }
}

/// Complete daemon configuration.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// G502 Hero mouse paired with the reference keyboard. A device section needs
/// only `vendor` and `model`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Pause before the first device lookup
    pub startup_delay_ms: u64,
    /// Factor applied to pointer X/Y motion
    pub motion_scale: f64,
    pub pointer: DeviceSettings,
    pub keyboard: DeviceSettings,
    pub transport: TransportSettings,
    pub reconnect: ReconnectSettings,

    /// Path to the settings file, if loaded from one
    #[serde(skip)]
    source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            startup_delay_ms: 1000,
            motion_scale: 0.5,
            pointer: DeviceSettings::new(0x046d, 0xc332),
            keyboard: DeviceSettings::new(0x17f6, 0x0862),
            transport: TransportSettings::default(),
            reconnect: ReconnectSettings::default(),
            source_path: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load and validate settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("modbridge").join("config.toml"))
    }

    /// Load from default location (~/.config/modbridge/config.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        // Return default settings if file doesn't exist
        Ok(Self::new())
    }

    /// Load from `path` when given, otherwise from the default location
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load_default(),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.motion_scale.is_finite() || self.motion_scale <= 0.0 {
            return Err(SettingsError::InvalidValue(format!(
                "motion_scale must be a positive number, got {}",
                self.motion_scale
            )));
        }
        let capacity = self.transport.capacity;
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(SettingsError::InvalidValue(format!(
                "transport.capacity must be a power of two of at least 2, got {}",
                capacity
            )));
        }
        if self.pointer.id() == self.keyboard.id() {
            return Err(SettingsError::InvalidValue(format!(
                "pointer and keyboard must be different devices, both are {}",
                self.pointer.id()
            )));
        }
        Ok(())
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.reconnect.retry_policy()
    }

    pub fn pointer_name(&self) -> String {
        self.pointer.name_for(DeviceRole::Pointer)
    }

    pub fn keyboard_name(&self) -> String {
        self.keyboard.name_for(DeviceRole::Keyboard)
    }

    /// File these settings were read from
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}
