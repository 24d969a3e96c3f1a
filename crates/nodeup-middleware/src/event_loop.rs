//! Platform event loop – the device layer's single event dispatch context.
//!
//! Events raised anywhere on the node (mesh stack, DNS-SD, commissioning) are
//! queued on a bounded [`tokio::sync::mpsc`] channel and dispatched by one
//! task, one event at a time, to every registered handler in registration
//! order. Handlers therefore never run concurrently with each other and must
//! not block: a slow handler stalls all event processing.
//!
//! # Lifecycle
//!
//! 1. [`PlatformManager::init_chip_stack`] – makes the loop ready.
//! 2. [`PlatformManager::add_event_handler`] – any number of times.
//! 3. [`PlatformManager::start_event_loop_task`] – spawns the dispatch task.
//!
//! Events posted before step 3 wait in the queue.

use std::sync::{Arc, Mutex};

use nodeup_hal::EventSink;
use nodeup_types::{DeviceEvent, DeviceEventType, NodeError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Default queue depth of the event loop.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 32;

/// Largest queue depth the event loop accepts; larger requests are clamped.
pub const MAX_EVENT_QUEUE_CAPACITY: usize = 4096;

/// Callback invoked for every dispatched event with the `arg` supplied at
/// registration.
pub type EventHandlerFn = Arc<dyn Fn(&DeviceEvent, usize) + Send + Sync>;

/// Device-layer platform manager as seen by the bring-up sequencer.
pub trait PlatformManager: Send {
    /// Initialize the platform layer and its event queue.
    fn init_chip_stack(&mut self) -> Result<(), NodeError>;

    /// Register `handler`; it receives `arg` alongside every event.
    fn add_event_handler(&mut self, handler: EventHandlerFn, arg: usize) -> Result<(), NodeError>;

    /// Hand the event loop to its own task and return immediately.
    fn start_event_loop_task(&mut self) -> Result<(), NodeError>;

    /// Where other subsystems post events.
    fn event_sink(&self) -> Arc<dyn EventSink>;
}

// ────────────────────────────────────────────────────────────────────────────
// Sender side
// ────────────────────────────────────────────────────────────────────────────

/// Cloneable handle for posting events to the loop from any context.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<DeviceEvent>,
}

impl EventSender {
    /// Queue `event` without waiting.
    ///
    /// # Errors
    ///
    /// [`NodeError::NoMemory`] when the queue is full,
    /// [`NodeError::IncorrectState`] when the loop is gone.
    pub fn post_event(&self, event: DeviceEvent) -> Result<(), NodeError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => NodeError::NoMemory,
            TrySendError::Closed(_) => NodeError::IncorrectState,
        })
    }
}

impl EventSink for EventSender {
    fn post(&self, source: &str, kind: DeviceEventType) -> Result<(), NodeError> {
        self.post_event(DeviceEvent::new(source, kind))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PlatformEventLoop
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Registration {
    handler: EventHandlerFn,
    arg: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Created,
    Initialized,
    Running,
}

/// Tokio-backed implementation of [`PlatformManager`].
pub struct PlatformEventLoop {
    spawner: Handle,
    sender: EventSender,
    receiver: Option<mpsc::Receiver<DeviceEvent>>,
    handlers: Arc<Mutex<Vec<Registration>>>,
    state: LoopState,
}

impl PlatformEventLoop {
    /// Create a loop whose task will be spawned on `spawner` with a queue of
    /// `capacity` events, clamped to `1..=MAX_EVENT_QUEUE_CAPACITY`.
    pub fn new(spawner: Handle, capacity: usize) -> Self {
        let clamped = capacity.clamp(1, MAX_EVENT_QUEUE_CAPACITY);
        if clamped != capacity {
            warn!(requested = capacity, capacity = clamped, "event queue capacity clamped");
        }
        let (sender, receiver) = mpsc::channel(clamped);
        Self {
            spawner,
            sender: EventSender { sender },
            receiver: Some(receiver),
            handlers: Arc::new(Mutex::new(Vec::new())),
            state: LoopState::Created,
        }
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Queue depth in effect.
    pub fn capacity(&self) -> usize {
        self.sender.sender.max_capacity()
    }

    pub fn handler_count(&self) -> usize {
        snapshot(&self.handlers).len()
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }
}

impl PlatformManager for PlatformEventLoop {
    fn init_chip_stack(&mut self) -> Result<(), NodeError> {
        if self.state != LoopState::Created {
            return Err(NodeError::IncorrectState);
        }
        self.state = LoopState::Initialized;
        Ok(())
    }

    fn add_event_handler(&mut self, handler: EventHandlerFn, arg: usize) -> Result<(), NodeError> {
        let registration = Registration { handler, arg };
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.push(registration),
            Err(poisoned) => poisoned.into_inner().push(registration),
        }
        Ok(())
    }

    fn start_event_loop_task(&mut self) -> Result<(), NodeError> {
        if self.state != LoopState::Initialized {
            return Err(NodeError::IncorrectState);
        }
        let receiver = self.receiver.take().ok_or(NodeError::IncorrectState)?;
        let handlers = Arc::clone(&self.handlers);
        // Detached: the loop lives as long as the scheduler.
        self.spawner.spawn(run_event_loop(receiver, handlers));
        self.state = LoopState::Running;
        Ok(())
    }

    fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::new(self.sender.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch task
// ────────────────────────────────────────────────────────────────────────────

async fn run_event_loop(
    mut receiver: mpsc::Receiver<DeviceEvent>,
    handlers: Arc<Mutex<Vec<Registration>>>,
) {
    info!("platform event loop running");
    while let Some(event) = receiver.recv().await {
        debug!(kind = ?event.kind, source = %event.source, "dispatching device event");
        // Handlers registered while an event is in flight see the next one.
        for registration in snapshot(&handlers) {
            (registration.handler)(&event, registration.arg);
        }
    }
    info!("platform event loop stopped");
}

fn snapshot(handlers: &Mutex<Vec<Registration>>) -> Vec<Registration> {
    match handlers.lock() {
        Ok(handlers) => handlers.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
