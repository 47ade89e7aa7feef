// Modbridge Input Layer - Device Identity
// USB vendor/model pairs and the role each physical device plays

use std::fmt;

use serde::Deserialize;

/// Which side of the pipeline a physical device feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    Pointer,
    Keyboard,
}

impl DeviceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceRole::Pointer => "pointer",
            DeviceRole::Keyboard => "keyboard",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// USB vendor and product identifiers of a physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct DeviceId {
    pub vendor: u16,
    pub model: u16,
}

impl DeviceId {
    pub const fn new(vendor: u16, model: u16) -> Self {
        Self { vendor, model }
    }

    /// Vendor id as udev reports it in `ID_USB_VENDOR_ID` (e.g. "046d")
    pub fn vendor_hex(&self) -> String {
        format!("{:04x}", self.vendor)
    }

    /// Model id as udev reports it in `ID_MODEL_ID` (e.g. "c332")
    pub fn model_hex(&self) -> String {
        format!("{:04x}", self.model)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.model)
    }
}
