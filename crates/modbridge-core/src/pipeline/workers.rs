// Modbridge Pipeline - Workers
// Per-thread loops: pointer I/O, keyboard input, keyboard output

use std::sync::Arc;

use super::{PipelineError, PipelineResult};
use crate::event::RawEvent;
use crate::input::{DeviceBackend, DeviceConnection};
use crate::output::OutputSink;
use crate::transform::{EventTranslator, Route};
use crate::transport::EventTransport;

/// Write to a sink, logging and dropping on failure
fn write_logged<S: OutputSink>(sink: &mut S, label: &str, event: &RawEvent) {
    if let Err(e) = sink.write(event) {
        log::warn!(
            "Failed to write {} event ({}): errno={:?}: {}",
            label,
            event,
            e.errno(),
            e
        );
    }
}

/// Bind a connection on thread start.
///
/// The device was located once at startup, so a failure here is treated as
/// transient. Returns true when a recovery cycle was needed.
fn ensure_bound<B: DeviceBackend>(connection: &mut DeviceConnection<B>) -> bool {
    if connection.is_bound() {
        return false;
    }
    match connection.acquire() {
        Ok(()) => false,
        Err(e) => {
            log::warn!("Initial acquire of {} device failed: {}", connection.role(), e);
            connection.recover();
            true
        }
    }
}

/// Reads the pointer, writes pointer output, routes modifiers to the transport
pub struct PointerWorker<B: DeviceBackend, S: OutputSink> {
    connection: DeviceConnection<B>,
    translator: EventTranslator,
    sink: S,
    transport: Arc<EventTransport>,
}

impl<B: DeviceBackend, S: OutputSink> PointerWorker<B, S> {
    pub fn new(
        connection: DeviceConnection<B>,
        translator: EventTranslator,
        sink: S,
        transport: Arc<EventTransport>,
    ) -> Self {
        Self {
            connection,
            translator,
            sink,
            transport,
        }
    }

    /// Read and dispatch one event, or recover from one read failure.
    pub fn step(&mut self) -> PipelineResult<()> {
        match self.connection.read_next() {
            Ok(event) => self.dispatch(event),
            Err(_) => {
                self.connection.recover();
                self.translator.reset();
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, event: RawEvent) -> PipelineResult<()> {
        match self.translator.translate_pointer(event) {
            Route::Pointer(event) => write_logged(&mut self.sink, "pointer", &event),
            Route::Keyboard(event) => {
                log::trace!("pointer -> keyboard: {}", event);
                self.transport.push(event)?;
            }
            Route::Both(event) => {
                self.transport.push(event)?;
                write_logged(&mut self.sink, "pointer", &event);
            }
        }
        Ok(())
    }

    /// Run until a fatal condition; never returns otherwise
    pub fn run(mut self) -> PipelineError {
        if ensure_bound(&mut self.connection) {
            self.translator.reset();
        }
        loop {
            if let Err(e) = self.step() {
                log::error!("Pointer thread stopping: {}", e);
                return e;
            }
        }
    }

    pub fn connection(&self) -> &DeviceConnection<B> {
        &self.connection
    }

    pub fn translator(&self) -> &EventTranslator {
        &self.translator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Reads the keyboard and forwards every event to the transport
pub struct KeyboardInputWorker<B: DeviceBackend> {
    connection: DeviceConnection<B>,
    transport: Arc<EventTransport>,
}

impl<B: DeviceBackend> KeyboardInputWorker<B> {
    pub fn new(connection: DeviceConnection<B>, transport: Arc<EventTransport>) -> Self {
        Self {
            connection,
            transport,
        }
    }

    /// Forward one event, or purge and recover after a read failure.
    ///
    /// The purge comes first so nothing read before the gap is written
    /// after the device returns.
    pub fn step(&mut self) -> PipelineResult<()> {
        match self.connection.read_next() {
            Ok(event) => {
                self.transport.push(event)?;
                Ok(())
            }
            Err(_) => {
                self.transport.purge();
                self.connection.recover();
                Ok(())
            }
        }
    }

    pub fn run(mut self) -> PipelineError {
        if ensure_bound(&mut self.connection) {
            self.transport.purge();
        }
        loop {
            if let Err(e) = self.step() {
                log::error!("Keyboard input thread stopping: {}", e);
                return e;
            }
        }
    }

    pub fn connection(&self) -> &DeviceConnection<B> {
        &self.connection
    }
}

/// Sole consumer of the transport and sole writer of the virtual keyboard
pub struct KeyboardOutputWorker<S: OutputSink> {
    transport: Arc<EventTransport>,
    sink: S,
}

impl<S: OutputSink> KeyboardOutputWorker<S> {
    pub fn new(transport: Arc<EventTransport>, sink: S) -> Self {
        Self { transport, sink }
    }

    /// Wait for the next queued event and write it
    pub fn step(&mut self) {
        let event = self.transport.pop();
        write_logged(&mut self.sink, "keyboard", &event);
    }

    /// Write everything already queued without blocking; returns the count
    pub fn drain_ready(&mut self) -> usize {
        let mut written = 0;
        while let Some(event) = self.transport.try_pop() {
            write_logged(&mut self.sink, "keyboard", &event);
            written += 1;
        }
        written
    }

    pub fn run(mut self) -> PipelineError {
        loop {
            self.step();
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
