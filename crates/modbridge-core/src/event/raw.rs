// Modbridge Raw Event
// Fixed-shape (type, code, value) record with an opaque timestamp

use std::fmt;

use super::codes::{self, EV_KEY, EV_MSC, EV_REL, EV_SYN};

/// Timestamp carried by an input event.
///
/// The pipeline never interprets it; it is copied through so the virtual
/// devices see the time the physical device reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventTime {
    pub seconds: i64,
    pub microseconds: i64,
}

impl EventTime {
    pub const fn new(seconds: i64, microseconds: i64) -> Self {
        Self {
            seconds,
            microseconds,
        }
    }
}

/// One atomic signal from an input device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
    pub time: EventTime,
}

impl RawEvent {
    /// Create an event with a zero timestamp
    pub const fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            event_type,
            code,
            value,
            time: EventTime::new(0, 0),
        }
    }

    pub const fn with_time(mut self, time: EventTime) -> Self {
        self.time = time;
        self
    }

    /// `EV_KEY` event for `code` with the given transition value
    pub const fn key(code: u16, value: i32) -> Self {
        Self::new(EV_KEY, code, value)
    }

    /// `EV_REL` event for `axis` with the given delta
    pub const fn rel(axis: u16, delta: i32) -> Self {
        Self::new(EV_REL, axis, delta)
    }

    /// `EV_MSC`/`MSC_SCAN` event carrying a scan value
    pub const fn scan(value: i32) -> Self {
        Self::new(EV_MSC, codes::MSC_SCAN, value)
    }

    /// `EV_SYN`/`SYN_REPORT` frame terminator
    pub const fn sync() -> Self {
        Self::new(EV_SYN, codes::SYN_REPORT, 0)
    }

    /// Same event with a different code, timestamp preserved
    pub const fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Same event with a different value, timestamp preserved
    pub const fn with_value(mut self, value: i32) -> Self {
        self.value = value;
        self
    }

    pub fn is_sync(&self) -> bool {
        self.event_type == EV_SYN
    }

    /// Whether this closes a frame (`SYN_REPORT`)
    pub fn is_sync_report(&self) -> bool {
        self.event_type == EV_SYN && self.code == codes::SYN_REPORT
    }

    pub fn is_key(&self) -> bool {
        self.event_type == EV_KEY
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} ({}), code={}, value={}",
            self.event_type,
            codes::type_name(self.event_type),
            self.code,
            self.value
        )
    }
}

#[cfg(feature = "pure-rust")]
mod evdev_conv {
    use super::{EventTime, RawEvent};
    use std::time::{Duration, UNIX_EPOCH};

    impl From<evdev::InputEvent> for RawEvent {
        fn from(event: evdev::InputEvent) -> Self {
            let since_epoch = event
                .timestamp()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO);
            RawEvent::new(event.event_type().0, event.code(), event.value()).with_time(
                EventTime::new(
                    since_epoch.as_secs() as i64,
                    i64::from(since_epoch.subsec_micros()),
                ),
            )
        }
    }

    impl From<RawEvent> for evdev::InputEvent {
        fn from(event: RawEvent) -> Self {
            evdev::InputEvent::from(libc::input_event {
                time: libc::timeval {
                    tv_sec: event.time.seconds as libc::time_t,
                    tv_usec: event.time.microseconds as libc::suseconds_t,
                },
                type_: event.event_type,
                code: event.code,
                value: event.value,
            })
        }
    }
}
