// Modbridge Output Layer
// One-way writers to the virtual pointer and keyboard

mod sink;

#[cfg(feature = "pure-rust")]
mod uinput;

pub use sink::{OutputSink, SinkError, SinkResult};

#[cfg(feature = "pure-rust")]
pub use uinput::UinputSink;
