// Modbridge Input Layer - Device Connection
// Locate, grab, read and reconnect one physical device

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::device::{DeviceId, DeviceRole};
use super::failure::ReadFailure;
use crate::event::RawEvent;

/// Result type for connection operations
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Errors raised while locating or acquiring a device
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Device {id} not found")]
    DeviceNotFound { id: DeviceId },

    #[error("Failed to acquire device {}: {source}", .path.display())]
    AcquireFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Device enumeration failed: {0}")]
    Enumeration(#[source] io::Error),
}

/// An open, exclusively captured physical device.
///
/// Implementations release the capture when dropped, so a handle discarded on
/// any path (reconnect, panic, exit) never leaves the device grabbed.
pub trait InputSource: Send {
    /// Block until one event is available or the read fails
    fn read_event(&mut self) -> io::Result<RawEvent>;

    /// Release the exclusive capture ahead of dropping the handle
    fn release(&mut self) -> io::Result<()>;
}

/// Host services needed to bind a `DeviceConnection`.
pub trait DeviceBackend: Send {
    type Source: InputSource;

    /// Resolve a vendor/model pair to a device node path
    fn find_device_path(&self, id: DeviceId) -> ConnectionResult<PathBuf>;

    /// Open `path` for reading and request exclusive capture
    fn open_and_grab(&self, path: &Path) -> ConnectionResult<Self::Source>;
}

/// Lifecycle position of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unbound,
    Located,
    Grabbed,
    Reading,
    Failed,
    Releasing,
    Retrying,
}

/// Delays applied while recovering a lost device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait after releasing, before re-enumerating
    pub settle: Duration,
    /// Wait after a failed re-acquisition
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(settle: Duration, backoff: Duration) -> Self {
        Self { settle, backoff }
    }

    /// No delays at all, for tests and simulations
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(5))
    }
}

/// Exclusive ownership of one physical device node.
///
/// Owned by a single producer thread. Read failures never end the
/// connection: the owner calls `recover`, which retries until the device is
/// back.
pub struct DeviceConnection<B: DeviceBackend> {
    role: DeviceRole,
    id: DeviceId,
    backend: B,
    retry: RetryPolicy,
    path: Option<PathBuf>,
    source: Option<B::Source>,
    state: ConnectionState,
    consecutive_failures: u32,
    reconnects: u64,
}

impl<B: DeviceBackend> DeviceConnection<B> {
    pub fn new(role: DeviceRole, id: DeviceId, backend: B, retry: RetryPolicy) -> Self {
        Self {
            role,
            id,
            backend,
            retry,
            path: None,
            source: None,
            state: ConnectionState::Unbound,
            consecutive_failures: 0,
            reconnects: 0,
        }
    }

    /// Resolve the device node for this connection's vendor/model pair.
    pub fn locate(&mut self) -> ConnectionResult<&Path> {
        match self.backend.find_device_path(self.id) {
            Ok(path) => {
                log::info!("{} device found: {}", self.role, path.display());
                self.state = ConnectionState::Located;
                Ok(self.path.insert(path).as_path())
            }
            Err(e) => {
                log::warn!("{} device not found ({}): {}", self.role, self.id, e);
                Err(e)
            }
        }
    }

    /// Open the located node and take exclusive capture.
    ///
    /// Locates first if no path is known yet.
    pub fn acquire(&mut self) -> ConnectionResult<()> {
        let path = match self.path.clone() {
            Some(path) => path,
            None => self.locate()?.to_path_buf(),
        };

        match self.backend.open_and_grab(&path) {
            Ok(source) => {
                log::info!("Opened and grabbed {} device: {}", self.role, path.display());
                self.source = Some(source);
                self.state = ConnectionState::Grabbed;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to grab {} device: {}", self.role, e);
                Err(e)
            }
        }
    }

    /// Fresh locate followed by acquire
    pub fn connect(&mut self) -> ConnectionResult<()> {
        self.locate()?;
        self.acquire()
    }

    /// Block until the next event arrives or the read fails.
    ///
    /// Reading an unbound connection fails as a bad handle, which sends the
    /// owner through the same recovery as a lost device.
    pub fn read_next(&mut self) -> Result<RawEvent, ReadFailure> {
        let result = match self.source.as_mut() {
            Some(source) => source.read_event(),
            None => Err(io::Error::from_raw_os_error(libc::EBADF)),
        };

        match result {
            Ok(event) => {
                self.state = ConnectionState::Reading;
                self.consecutive_failures = 0;
                Ok(event)
            }
            Err(e) => {
                let failure = ReadFailure::from(e);
                self.state = ConnectionState::Failed;
                log::warn!(
                    "Failed to read {} event: errno={:?} ({}), bound={}, consecutive_failures={}",
                    self.role,
                    failure.errno(),
                    failure.kind,
                    self.source.is_some(),
                    self.consecutive_failures
                );
                Err(failure)
            }
        }
    }

    /// Release the exclusive capture and close the handle.
    pub fn release(&mut self) {
        self.state = ConnectionState::Releasing;
        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.release() {
                log::debug!("Releasing {} device reported: {}", self.role, e);
            }
            drop(source);
            log::info!("Released and closed {} device", self.role);
        }
    }

    /// Release the device and re-acquire it, retrying until it succeeds.
    ///
    /// Returns the number of attempts the reconnect took.
    pub fn recover(&mut self) -> u32 {
        log::warn!("{} device appears lost, attempting to reopen", self.role);
        self.release();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            thread::sleep(self.retry.settle);
            self.state = ConnectionState::Retrying;

            match self.connect() {
                Ok(()) => {
                    self.consecutive_failures = 0;
                    self.reconnects += 1;
                    log::info!(
                        "Successfully reopened and grabbed {} device (attempt {})",
                        self.role,
                        attempt
                    );
                    return attempt;
                }
                Err(e) => {
                    self.consecutive_failures += 1;
                    self.state = ConnectionState::Retrying;
                    log::warn!(
                        "Failed to reopen {} device, will retry in {:?} (attempt {}, consecutive_failures={}): {}",
                        self.role,
                        self.retry.backoff,
                        attempt,
                        self.consecutive_failures,
                        e
                    );
                    thread::sleep(self.retry.backoff);
                }
            }
        }
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Device node from the most recent successful locate
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether a handle is currently held
    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Successful reconnects since creation
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::codes::KEY_PRESS;
    use crate::input::FailureKind;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedSource {
        reads: VecDeque<io::Result<RawEvent>>,
        releases: Arc<AtomicUsize>,
    }

    impl InputSource for ScriptedSource {
        fn read_event(&mut self) -> io::Result<RawEvent> {
            self.reads
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::from_raw_os_error(libc::ENODEV)))
        }

        fn release(&mut self) -> io::Result<()> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Backend whose locate fails `missing` times before succeeding
    struct ScriptedBackend {
        missing: AtomicUsize,
        opens: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
        script: Vec<Vec<i32>>,
    }

    impl ScriptedBackend {
        fn new(missing: usize, script: Vec<Vec<i32>>) -> Self {
            Self {
                missing: AtomicUsize::new(missing),
                opens: Arc::new(AtomicUsize::new(0)),
                releases: Arc::new(AtomicUsize::new(0)),
                script,
            }
        }
    }

    impl DeviceBackend for ScriptedBackend {
        type Source = ScriptedSource;

        fn find_device_path(&self, id: DeviceId) -> ConnectionResult<PathBuf> {
            if self.missing.load(Ordering::SeqCst) > 0 {
                self.missing.fetch_sub(1, Ordering::SeqCst);
                return Err(ConnectionError::DeviceNotFound { id });
            }
            Ok(PathBuf::from("/dev/input/event7"))
        }

        fn open_and_grab(&self, _path: &Path) -> ConnectionResult<ScriptedSource> {
            let session = self.opens.fetch_add(1, Ordering::SeqCst);
            let values = self.script.get(session).cloned().unwrap_or_default();
            Ok(ScriptedSource {
                reads: values.into_iter().map(|v| Ok(RawEvent::key(30, v))).collect(),
                releases: Arc::clone(&self.releases),
            })
        }
    }

    fn connection(backend: ScriptedBackend) -> DeviceConnection<ScriptedBackend> {
        DeviceConnection::new(
            DeviceRole::Keyboard,
            DeviceId::new(0x17f6, 0x0862),
            backend,
            RetryPolicy::immediate(),
        )
    }

    #[test]
    fn test_starts_unbound() {
        let conn = connection(ScriptedBackend::new(0, vec![]));
        assert_eq!(conn.state(), ConnectionState::Unbound);
        assert!(!conn.is_bound());
        assert!(conn.path().is_none());
    }

    #[test]
    fn test_locate_not_found() {
        let mut conn = connection(ScriptedBackend::new(1, vec![]));
        let err = conn.locate().unwrap_err();
        assert!(matches!(err, ConnectionError::DeviceNotFound { .. }));
        assert_eq!(conn.state(), ConnectionState::Unbound);
    }

    #[test]
    fn test_connect_then_read() {
        let mut conn = connection(ScriptedBackend::new(0, vec![vec![KEY_PRESS]]));
        conn.connect().unwrap();
        assert_eq!(conn.state(), ConnectionState::Grabbed);
        assert_eq!(conn.path(), Some(Path::new("/dev/input/event7")));

        let event = conn.read_next().unwrap();
        assert_eq!(event.value, KEY_PRESS);
        assert_eq!(conn.state(), ConnectionState::Reading);
    }

    #[test]
    fn test_read_unbound_is_bad_handle() {
        let mut conn = connection(ScriptedBackend::new(0, vec![]));
        let failure = conn.read_next().unwrap_err();
        assert_eq!(failure.kind, FailureKind::BadHandle);
        assert_eq!(conn.state(), ConnectionState::Failed);
    }

    #[test]
    fn test_read_failure_then_recover() {
        let backend = ScriptedBackend::new(0, vec![vec![1], vec![0]]);
        let releases = Arc::clone(&backend.releases);
        let mut conn = connection(backend);
        conn.connect().unwrap();

        assert_eq!(conn.read_next().unwrap().value, 1);
        let failure = conn.read_next().unwrap_err();
        assert_eq!(failure.kind, FailureKind::DeviceRemoved);

        assert_eq!(conn.recover(), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(conn.reconnects(), 1);
        assert_eq!(conn.state(), ConnectionState::Grabbed);
        assert_eq!(conn.read_next().unwrap().value, 0);
    }

    #[test]
    fn test_recover_retries_until_device_returns() {
        let backend = ScriptedBackend::new(0, vec![vec![], vec![2]]);
        let mut conn = connection(backend);
        conn.connect().unwrap();
        assert!(conn.read_next().is_err());

        // Device stays gone for three attempts
        conn.backend.missing.store(3, Ordering::SeqCst);
        assert_eq!(conn.recover(), 4);
        assert_eq!(conn.consecutive_failures(), 0);
        assert!(conn.is_bound());
        assert_eq!(conn.read_next().unwrap().value, 2);
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = ScriptedBackend::new(0, vec![]);
        let releases = Arc::clone(&backend.releases);
        let mut conn = connection(backend);
        conn.connect().unwrap();

        conn.release();
        conn.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(conn.state(), ConnectionState::Releasing);
        assert!(!conn.is_bound());
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.settle, Duration::from_secs(1));
        assert_eq!(policy.backoff, Duration::from_secs(5));
    }
}
