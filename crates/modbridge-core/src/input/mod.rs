// Modbridge Input Layer
// Device identity, exclusive capture and the reconnect state machine

mod connection;
mod device;
mod failure;

#[cfg(feature = "pure-rust")]
mod evdev_backend;
#[cfg(feature = "pure-rust")]
mod locator;

pub use connection::{
    ConnectionError, ConnectionResult, ConnectionState, DeviceBackend, DeviceConnection,
    InputSource, RetryPolicy,
};
pub use device::{DeviceId, DeviceRole};
pub use failure::{FailureKind, ReadFailure};

#[cfg(feature = "pure-rust")]
pub use evdev_backend::{EvdevBackend, EvdevSource};
#[cfg(feature = "pure-rust")]
pub use locator::{list_input_devices, InputDeviceInfo, UdevLocator};
