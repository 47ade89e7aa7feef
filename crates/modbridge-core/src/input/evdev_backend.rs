// Modbridge Input Layer - evdev Backend
// Exclusive capture and blocking reads on /dev/input/event* nodes

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use evdev::Device;

use super::connection::{ConnectionError, ConnectionResult, DeviceBackend, InputSource};
use super::device::DeviceId;
use super::locator::UdevLocator;
use crate::event::RawEvent;

/// Grabbed evdev device yielding one event per read.
///
/// `fetch_events` hands back whatever the kernel had buffered; the batch is
/// queued here so the connection sees events one at a time in order.
pub struct EvdevSource {
    device: Device,
    path: PathBuf,
    queued: VecDeque<RawEvent>,
    grabbed: bool,
}

impl EvdevSource {
    /// Open `path` and grab it
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut device = Device::open(path)?;
        device.grab()?;
        Ok(Self {
            device,
            path: path.to_path_buf(),
            queued: VecDeque::with_capacity(64),
            grabbed: true,
        })
    }

    pub fn name(&self) -> &str {
        self.device.name().unwrap_or("Unknown")
    }
}

impl InputSource for EvdevSource {
    fn read_event(&mut self) -> io::Result<RawEvent> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Ok(event);
            }
            let events = self.device.fetch_events()?;
            self.queued.extend(events.map(RawEvent::from));
        }
    }

    fn release(&mut self) -> io::Result<()> {
        if self.grabbed {
            self.grabbed = false;
            self.device.ungrab()?;
            log::debug!("Released {}", self.path.display());
        }
        Ok(())
    }
}

/// Ungrab on every exit path, including panic unwinding, so the physical
/// device is never left captured by a dead handle.
impl Drop for EvdevSource {
    fn drop(&mut self) {
        if self.grabbed {
            let _ = self.device.ungrab();
        }
    }
}

/// Host backend: udev for lookup, evdev for capture and reads
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevBackend {
    locator: UdevLocator,
}

impl EvdevBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceBackend for EvdevBackend {
    type Source = EvdevSource;

    fn find_device_path(&self, id: DeviceId) -> ConnectionResult<PathBuf> {
        self.locator.find_device_path(id)
    }

    fn open_and_grab(&self, path: &Path) -> ConnectionResult<EvdevSource> {
        let source = EvdevSource::open(path).map_err(|source| ConnectionError::AcquireFailed {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Grabbed '{}' at {}", source.name(), path.display());
        Ok(source)
    }
}
