// Modbridge Pipeline
// Producer/consumer threads wiring devices, translator, transport and sinks

mod supervisor;
mod workers;

pub use supervisor::{start, Pipeline, PipelineHandle};
pub use workers::{KeyboardInputWorker, KeyboardOutputWorker, PointerWorker};

use crate::input::ConnectionError;
use crate::output::SinkError;
use crate::transport::TransportError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Conditions that prevent startup or stop a pipeline thread
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Failed to create virtual devices: {0}")]
    Sink(#[from] SinkError),

    #[error("{thread} thread panicked: {message}")]
    ThreadPanicked {
        thread: &'static str,
        message: String,
    },

    #[error("Failed to spawn {thread} thread: {source}")]
    Spawn {
        thread: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline threads exited without reporting")]
    Disconnected,
}
