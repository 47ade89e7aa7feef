// Modbridge Core Library
// Event remapping pipeline: pointer side buttons become keyboard modifiers

pub mod event;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod transform;
pub mod transport;

pub use event::{EventTime, RawEvent};
pub use input::{
    ConnectionError, ConnectionState, DeviceBackend, DeviceConnection, DeviceId, DeviceRole,
    FailureKind, InputSource, ReadFailure, RetryPolicy,
};
pub use output::{OutputSink, SinkError};
pub use pipeline::{Pipeline, PipelineError, PipelineHandle};
pub use settings::{Settings, SettingsError};
pub use transform::{EventTranslator, RemapRule, Route};
pub use transport::{EventTransport, OverflowPolicy, TransportError};

#[cfg(feature = "pure-rust")]
pub use input::{EvdevBackend, UdevLocator};
#[cfg(feature = "pure-rust")]
pub use output::UinputSink;
