// Modbridge Output Layer - Sink Contract

use std::io;

use crate::event::RawEvent;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors raised by output sinks
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(#[source] io::Error),

    #[error("Failed to write event ({event}): {source}")]
    Write {
        event: RawEvent,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    pub fn errno(&self) -> Option<i32> {
        match self {
            SinkError::DeviceCreation(source) | SinkError::Write { source, .. } => {
                source.raw_os_error()
            }
        }
    }
}

/// Writer for one virtual device stream.
///
/// Each sink is owned by exactly one thread. Callers log failures and carry
/// on; a failed write never stops the pipeline.
pub trait OutputSink: Send {
    fn write(&mut self, event: &RawEvent) -> SinkResult<()>;
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write(&mut self, event: &RawEvent) -> SinkResult<()> {
        (**self).write(event)
    }
}
