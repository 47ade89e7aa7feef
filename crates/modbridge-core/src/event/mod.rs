// Modbridge Event Model
// Raw input events and the Linux input-event-codes the pipeline inspects

pub mod codes;
mod raw;

pub use raw::{EventTime, RawEvent};
