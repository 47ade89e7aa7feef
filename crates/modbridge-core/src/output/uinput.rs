// Modbridge Output Layer - uinput Sinks
// Virtual device creation and frame-wise event emission

use std::io;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, BusType, InputEvent, InputId, Key, MiscType, RelativeAxisType};

use super::sink::{OutputSink, SinkError, SinkResult};
use crate::event::codes::{BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, KEY_LEFTCTRL, KEY_LEFTSHIFT};
use crate::event::RawEvent;
use crate::input::DeviceId;

/// Flush a frame that never received its `SYN_REPORT` once it gets this long
const MAX_FRAME_EVENTS: usize = 256;

/// Virtual uinput device fed one event at a time.
///
/// `VirtualDevice::emit` terminates every submission with its own
/// `SYN_REPORT`, so events are held until the incoming `SYN_REPORT` and the
/// whole frame is submitted at once. Other `EV_SYN` codes are host-internal
/// and are not re-injected.
pub struct UinputSink {
    device: VirtualDevice,
    name: String,
    frame: Vec<InputEvent>,
}

impl UinputSink {
    /// Virtual pointer: three buttons, both modifiers, X/Y motion and wheel
    pub fn pointer(name: &str, id: DeviceId) -> SinkResult<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in [BTN_LEFT, BTN_RIGHT, BTN_MIDDLE, KEY_LEFTSHIFT, KEY_LEFTCTRL] {
            keys.insert(Key::new(code));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);

        let device = VirtualDeviceBuilder::new()
            .map_err(SinkError::DeviceCreation)?
            .name(name)
            .input_id(usb_identity(id))
            .with_keys(&keys)
            .map_err(SinkError::DeviceCreation)?
            .with_relative_axes(&axes)
            .map_err(SinkError::DeviceCreation)?
            .build()
            .map_err(SinkError::DeviceCreation)?;

        log::info!("Virtual pointer device created: '{}' ({})", name, id);
        Ok(Self::wrap(device, name))
    }

    /// Virtual keyboard: key codes 0-255 plus `MSC_SCAN`
    pub fn keyboard(name: &str, id: DeviceId) -> SinkResult<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 0..256u16 {
            keys.insert(Key::new(code));
        }

        let mut misc = AttributeSet::<MiscType>::new();
        misc.insert(MiscType::MSC_SCAN);

        let device = VirtualDeviceBuilder::new()
            .map_err(SinkError::DeviceCreation)?
            .name(name)
            .input_id(usb_identity(id))
            .with_keys(&keys)
            .map_err(SinkError::DeviceCreation)?
            .with_msc(&misc)
            .map_err(SinkError::DeviceCreation)?
            .build()
            .map_err(SinkError::DeviceCreation)?;

        log::info!("Virtual keyboard device created: '{}' ({})", name, id);
        Ok(Self::wrap(device, name))
    }

    fn wrap(device: VirtualDevice, name: &str) -> Self {
        Self {
            device,
            name: name.to_string(),
            frame: Vec::with_capacity(16),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn flush(&mut self, closing: &RawEvent) -> SinkResult<()> {
        let result = self.device.emit(&self.frame);
        self.frame.clear();
        result.map_err(|source: io::Error| SinkError::Write {
            event: *closing,
            source,
        })
    }
}

impl OutputSink for UinputSink {
    fn write(&mut self, event: &RawEvent) -> SinkResult<()> {
        if event.is_sync_report() {
            return self.flush(event);
        }
        if event.is_sync() {
            log::trace!("{}: not forwarding {}", self.name, event);
            return Ok(());
        }

        self.frame.push(InputEvent::from(*event));
        if self.frame.len() >= MAX_FRAME_EVENTS {
            log::debug!("{}: frame exceeded {} events, flushing early", self.name, MAX_FRAME_EVENTS);
            return self.flush(event);
        }
        Ok(())
    }
}

fn usb_identity(id: DeviceId) -> InputId {
    InputId::new(BusType::BUS_USB, id.vendor, id.model, 0)
}
