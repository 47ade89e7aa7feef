// Modbridge Input Layer - Read Failures
// Diagnostic classification of device read errors

use std::fmt;
use std::io;

/// Cause of a failed device read.
///
/// Used for log lines only; every kind goes through the same recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BadHandle,
    DeviceRemoved,
    Interrupted,
    IoFault,
    WouldBlock,
    NoSuchFile,
    PermissionDenied,
    ShortRead,
    Other,
}

impl FailureKind {
    pub fn classify(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EBADF) => FailureKind::BadHandle,
            Some(libc::ENODEV) => FailureKind::DeviceRemoved,
            Some(libc::EINTR) => FailureKind::Interrupted,
            Some(libc::EIO) => FailureKind::IoFault,
            Some(libc::EAGAIN) => FailureKind::WouldBlock,
            Some(libc::ENOENT) => FailureKind::NoSuchFile,
            Some(libc::EACCES) | Some(libc::EPERM) => FailureKind::PermissionDenied,
            Some(_) => FailureKind::Other,
            None if err.kind() == io::ErrorKind::UnexpectedEof => FailureKind::ShortRead,
            None => FailureKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::BadHandle => "EBADF (Bad file descriptor)",
            FailureKind::DeviceRemoved => "ENODEV (No such device)",
            FailureKind::Interrupted => "EINTR (Interrupted)",
            FailureKind::IoFault => "EIO (I/O error)",
            FailureKind::WouldBlock => "EAGAIN (Would block)",
            FailureKind::NoSuchFile => "ENOENT (No such file)",
            FailureKind::PermissionDenied => "EACCES (Permission denied)",
            FailureKind::ShortRead => "short read",
            FailureKind::Other => "UNKNOWN",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read on an acquired device failed
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {source}")]
pub struct ReadFailure {
    pub kind: FailureKind,
    #[source]
    pub source: io::Error,
}

impl ReadFailure {
    pub fn errno(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}

impl From<io::Error> for ReadFailure {
    fn from(source: io::Error) -> Self {
        Self {
            kind: FailureKind::classify(&source),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_errno() {
        let cases = [
            (libc::EBADF, FailureKind::BadHandle),
            (libc::ENODEV, FailureKind::DeviceRemoved),
            (libc::EINTR, FailureKind::Interrupted),
            (libc::EIO, FailureKind::IoFault),
            (libc::EAGAIN, FailureKind::WouldBlock),
            (libc::ENOENT, FailureKind::NoSuchFile),
            (libc::EACCES, FailureKind::PermissionDenied),
            (libc::EPERM, FailureKind::PermissionDenied),
            (libc::ENOSPC, FailureKind::Other),
        ];
        for (errno, expected) in cases {
            let err = io::Error::from_raw_os_error(errno);
            assert_eq!(FailureKind::classify(&err), expected, "errno {}", errno);
        }
    }

    #[test]
    fn test_classify_short_read() {
        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "partial event");
        assert_eq!(FailureKind::classify(&err), FailureKind::ShortRead);
    }

    #[test]
    fn test_read_failure_from_io_error() {
        let failure = ReadFailure::from(io::Error::from_raw_os_error(libc::ENODEV));
        assert_eq!(failure.kind, FailureKind::DeviceRemoved);
        assert_eq!(failure.errno(), Some(libc::ENODEV));
        assert!(failure.to_string().starts_with("ENODEV (No such device)"));
    }
}
