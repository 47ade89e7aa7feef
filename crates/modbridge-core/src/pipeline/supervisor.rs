// Modbridge Pipeline - Supervisor
// Spawn the three long-lived threads and report the first one to stop

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::workers::{KeyboardInputWorker, KeyboardOutputWorker, PointerWorker};
use super::{PipelineError, PipelineResult};
use crate::input::{DeviceBackend, DeviceConnection, DeviceRole};
use crate::output::{OutputSink, SinkResult};
use crate::settings::Settings;
use crate::transform::EventTranslator;
use crate::transport::EventTransport;

const POINTER_THREAD: &str = "pointer";
const KEYBOARD_IN_THREAD: &str = "keyboard-in";
const KEYBOARD_OUT_THREAD: &str = "keyboard-out";

/// Fully wired pipeline, ready to be started.
///
/// Everything shared between threads (only the transport) is built by the
/// caller and handed in; each worker owns the rest.
pub struct Pipeline<PB, KB, PS, KS>
where
    PB: DeviceBackend,
    KB: DeviceBackend,
    PS: OutputSink,
    KS: OutputSink,
{
    pointer: PointerWorker<PB, PS>,
    keyboard_in: KeyboardInputWorker<KB>,
    keyboard_out: KeyboardOutputWorker<KS>,
}

impl<PB, KB, PS, KS> Pipeline<PB, KB, PS, KS>
where
    PB: DeviceBackend + 'static,
    KB: DeviceBackend + 'static,
    PS: OutputSink + 'static,
    KS: OutputSink + 'static,
{
    pub fn new(
        pointer: DeviceConnection<PB>,
        keyboard: DeviceConnection<KB>,
        pointer_sink: PS,
        keyboard_sink: KS,
        transport: Arc<EventTransport>,
        motion_scale: f64,
    ) -> Self {
        Self {
            pointer: PointerWorker::new(
                pointer,
                EventTranslator::new(motion_scale),
                pointer_sink,
                Arc::clone(&transport),
            ),
            keyboard_in: KeyboardInputWorker::new(keyboard, Arc::clone(&transport)),
            keyboard_out: KeyboardOutputWorker::new(transport, keyboard_sink),
        }
    }

    /// Start the consumer, then the keyboard producer, then the pointer.
    pub fn spawn(self) -> PipelineResult<PipelineHandle> {
        let (exits, reports) = mpsc::channel();
        let mut threads = Vec::with_capacity(3);

        let Pipeline {
            pointer,
            keyboard_in,
            keyboard_out,
        } = self;

        threads.push(supervised(KEYBOARD_OUT_THREAD, exits.clone(), move || {
            keyboard_out.run()
        })?);
        threads.push(supervised(KEYBOARD_IN_THREAD, exits.clone(), move || {
            keyboard_in.run()
        })?);
        threads.push(supervised(POINTER_THREAD, exits, move || pointer.run())?);

        log::info!("Pipeline started ({} threads)", threads.len());
        Ok(PipelineHandle { reports, threads })
    }
}

/// Locate both devices, create the virtual devices and spawn the threads.
///
/// A device missing here is fatal: nothing is opened, `make_sinks` is never
/// called and no thread is started. Later disappearances are recovered by the
/// workers instead.
pub fn start<PB, KB, PS, KS, F>(
    settings: &Settings,
    pointer_backend: PB,
    keyboard_backend: KB,
    make_sinks: F,
) -> PipelineResult<PipelineHandle>
where
    PB: DeviceBackend + 'static,
    KB: DeviceBackend + 'static,
    PS: OutputSink + 'static,
    KS: OutputSink + 'static,
    F: FnOnce(&Settings) -> SinkResult<(PS, KS)>,
{
    thread::sleep(settings.startup_delay());

    let mut pointer = DeviceConnection::new(
        DeviceRole::Pointer,
        settings.pointer.id(),
        pointer_backend,
        settings.retry_policy(),
    );
    pointer.locate()?;

    let mut keyboard = DeviceConnection::new(
        DeviceRole::Keyboard,
        settings.keyboard.id(),
        keyboard_backend,
        settings.retry_policy(),
    );
    keyboard.locate()?;

    let (pointer_sink, keyboard_sink) = make_sinks(settings)?;

    let transport = Arc::new(EventTransport::new(
        settings.transport.capacity,
        settings.transport.overflow,
    )?);
    log::debug!(
        "Keyboard event buffer: {} slots, overflow={}",
        transport.capacity(),
        transport.policy().as_str()
    );

    Pipeline::new(
        pointer,
        keyboard,
        pointer_sink,
        keyboard_sink,
        transport,
        settings.motion_scale,
    )
    .spawn()
}

/// Running pipeline
pub struct PipelineHandle {
    reports: Receiver<(&'static str, PipelineError)>,
    threads: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Block until any thread stops and return why.
    ///
    /// Under normal operation no thread ever stops, so this only returns on
    /// a fatal condition.
    pub fn wait(self) -> PipelineError {
        match self.reports.recv() {
            Ok((thread, error)) => {
                log::error!("{} thread exited: {}", thread, error);
                error
            }
            Err(_) => PipelineError::Disconnected,
        }
    }

    /// Names of the spawned threads, in start order
    pub fn thread_names(&self) -> Vec<&str> {
        self.threads
            .iter()
            .filter_map(|handle| handle.thread().name())
            .collect()
    }
}

fn supervised<F>(
    name: &'static str,
    exits: Sender<(&'static str, PipelineError)>,
    body: F,
) -> PipelineResult<JoinHandle<()>>
where
    F: FnOnce() -> PipelineError + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let error = match panic::catch_unwind(AssertUnwindSafe(body)) {
                Ok(error) => error,
                Err(payload) => PipelineError::ThreadPanicked {
                    thread: name,
                    message: panic_message(payload.as_ref()),
                },
            };
            let _ = exits.send((name, error));
        })
        .map_err(|source| PipelineError::Spawn {
            thread: name,
            source,
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
