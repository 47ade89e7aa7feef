// Modbridge Input Layer - udev Locator
// Resolve USB vendor/model pairs to input event nodes

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::connection::{ConnectionError, ConnectionResult};
use super::device::DeviceId;

const PROP_VENDOR_ID: &str = "ID_USB_VENDOR_ID";
const PROP_MODEL_ID: &str = "ID_MODEL_ID";

/// Device lookup through the udev database
#[derive(Debug, Default, Clone, Copy)]
pub struct UdevLocator;

impl UdevLocator {
    /// Find the first `input/event*` node whose USB vendor and model match.
    pub fn find_device_path(&self, id: DeviceId) -> ConnectionResult<PathBuf> {
        let mut enumerator = event_enumerator()?;
        enumerator
            .match_property(PROP_VENDOR_ID, id.vendor_hex())
            .map_err(ConnectionError::Enumeration)?;
        enumerator
            .match_property(PROP_MODEL_ID, id.model_hex())
            .map_err(ConnectionError::Enumeration)?;

        let devices = enumerator
            .scan_devices()
            .map_err(ConnectionError::Enumeration)?;
        devices
            .filter_map(|device| device.devnode().map(Path::to_path_buf))
            .next()
            .ok_or(ConnectionError::DeviceNotFound { id })
    }
}

fn event_enumerator() -> ConnectionResult<udev::Enumerator> {
    let mut enumerator = udev::Enumerator::new().map_err(ConnectionError::Enumeration)?;
    enumerator
        .match_subsystem("input")
        .map_err(ConnectionError::Enumeration)?;
    enumerator
        .match_sysname("event*")
        .map_err(ConnectionError::Enumeration)?;
    Ok(enumerator)
}

/// Input event node as listed by `--list-devices`
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub path: Option<PathBuf>,
    pub vendor_id: Option<String>,
    pub model_id: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
}

/// List every input event node with its USB identity properties
pub fn list_input_devices() -> ConnectionResult<Vec<InputDeviceInfo>> {
    let mut enumerator = event_enumerator()?;
    let devices = enumerator
        .scan_devices()
        .map_err(ConnectionError::Enumeration)?;

    let property = |device: &udev::Device, name: &str| {
        device
            .property_value(name)
            .and_then(OsStr::to_str)
            .map(str::to_string)
    };

    Ok(devices
        .map(|device| InputDeviceInfo {
            path: device.devnode().map(Path::to_path_buf),
            vendor_id: property(&device, PROP_VENDOR_ID),
            model_id: property(&device, PROP_MODEL_ID),
            vendor: property(&device, "ID_VENDOR"),
            model: property(&device, "ID_MODEL"),
        })
        .collect())
}
