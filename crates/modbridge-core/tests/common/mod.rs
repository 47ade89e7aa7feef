// Shared fakes for pipeline tests: scripted devices and recording sinks

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use modbridge_core::input::{ConnectionError, ConnectionResult};
use modbridge_core::{
    DeviceBackend, DeviceConnection, DeviceId, DeviceRole, InputSource, OutputSink, RawEvent,
    RetryPolicy, SinkError,
};

pub type Feed = Sender<io::Result<RawEvent>>;

/// Device handle reading from a channel; a closed channel reads as ENODEV
pub struct ChannelSource {
    events: Receiver<io::Result<RawEvent>>,
    releases: Arc<AtomicUsize>,
}

impl InputSource for ChannelSource {
    fn read_event(&mut self) -> io::Result<RawEvent> {
        self.events
            .recv()
            .unwrap_or_else(|_| Err(io::Error::from_raw_os_error(libc::ENODEV)))
    }

    fn release(&mut self) -> io::Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Each successful open consumes one queued session; no sessions left
/// means the device is unplugged.
#[derive(Default)]
pub struct FakeBackend {
    sessions: Mutex<VecDeque<Receiver<io::Result<RawEvent>>>>,
    pub releases: Arc<AtomicUsize>,
    pub opens: Arc<AtomicUsize>,
    pub lookups: Arc<AtomicUsize>,
}

impl FakeBackend {
    /// One pre-filled session per entry; each ends in a read failure
    pub fn scripted(sessions: Vec<Vec<RawEvent>>) -> Self {
        let backend = Self::default();
        for events in sessions {
            let (feed, rx) = mpsc::channel();
            for event in events {
                feed.send(Ok(event)).unwrap();
            }
            backend.sessions.lock().push_back(rx);
        }
        backend
    }

    /// A single session fed live by the returned sender
    pub fn live() -> (Self, Feed) {
        let backend = Self::default();
        let (feed, rx) = mpsc::channel();
        backend.sessions.lock().push_back(rx);
        (backend, feed)
    }
}

impl DeviceBackend for FakeBackend {
    type Source = ChannelSource;

    fn find_device_path(&self, id: DeviceId) -> ConnectionResult<PathBuf> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.sessions.lock().is_empty() {
            return Err(ConnectionError::DeviceNotFound { id });
        }
        Ok(PathBuf::from("/dev/input/event-fake"))
    }

    fn open_and_grab(&self, path: &Path) -> ConnectionResult<ChannelSource> {
        match self.sessions.lock().pop_front() {
            Some(events) => {
                self.opens.fetch_add(1, Ordering::SeqCst);
                Ok(ChannelSource {
                    events,
                    releases: Arc::clone(&self.releases),
                })
            }
            None => Err(ConnectionError::AcquireFailed {
                path: path.to_path_buf(),
                source: io::Error::from_raw_os_error(libc::ENOENT),
            }),
        }
    }
}

pub fn pointer_connection(backend: FakeBackend, retry: RetryPolicy) -> DeviceConnection<FakeBackend> {
    DeviceConnection::new(DeviceRole::Pointer, DeviceId::new(0x046d, 0xc332), backend, retry)
}

pub fn keyboard_connection(backend: FakeBackend, retry: RetryPolicy) -> DeviceConnection<FakeBackend> {
    DeviceConnection::new(DeviceRole::Keyboard, DeviceId::new(0x17f6, 0x0862), backend, retry)
}

/// Sink that records every write; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RawEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RawEvent> {
        self.events.lock().clone()
    }

    /// Poll until `count` events were written or the timeout passes
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<RawEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let events = self.events();
            if events.len() >= count || Instant::now() >= deadline {
                return events;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl OutputSink for RecordingSink {
    fn write(&mut self, event: &RawEvent) -> Result<(), SinkError> {
        self.events.lock().push(*event);
        Ok(())
    }
}

/// Sink whose every write fails
#[derive(Default)]
pub struct FailingSink {
    pub attempts: usize,
}

impl OutputSink for FailingSink {
    fn write(&mut self, event: &RawEvent) -> Result<(), SinkError> {
        self.attempts += 1;
        Err(SinkError::Write {
            event: *event,
            source: io::Error::from_raw_os_error(libc::EIO),
        })
    }
}

/// Sink that blocks forever on its first write, starving the consumer
pub struct StalledSink {
    gate: Receiver<()>,
}

impl StalledSink {
    pub fn new() -> (Self, Sender<()>) {
        let (release, gate) = mpsc::channel();
        (Self { gate }, release)
    }
}

impl OutputSink for StalledSink {
    fn write(&mut self, _event: &RawEvent) -> Result<(), SinkError> {
        let _ = self.gate.recv();
        Ok(())
    }
}
