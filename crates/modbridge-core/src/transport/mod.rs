// Modbridge Event Transport
// Bounded single-consumer queue between the producer threads and the keyboard writer

mod queue;
mod signal;

pub use queue::{EventTransport, OverflowPolicy, TransportError, TransportResult, DEFAULT_CAPACITY};
pub use signal::PendingSignal;
