//! Application tasks – the code that owns the node once bring-up is done.
//!
//! Exactly one task variant is compiled into a build:
//!
//! | Cargo feature | Variant | Behaviour |
//! |---|---|---|
//! | `base-app` | [`BaseAppTask`] | status LED, identify, factory reset |
//! | *(default)* | [`AppTask`] | the base behaviour plus an on/off light |
//!
//! [`SelectedAppTask`] names whichever variant is linked. Both follow the
//! same lifecycle: construct, [`init`][ApplicationTask::init] once, then
//! [`start_app_task`][ApplicationTask::start_app_task] once. The running
//! task consumes [`AppEvent`]s from a bounded queue and drives the
//! [`Board`].

use std::time::Duration;

use nodeup_hal::Board;
use nodeup_types::NodeError;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(feature = "base-app")]
mod base;
#[cfg(not(feature = "base-app"))]
mod full;

#[cfg(feature = "base-app")]
pub use base::BaseAppTask;
#[cfg(not(feature = "base-app"))]
pub use full::AppTask;

/// The application task linked into this build.
#[cfg(feature = "base-app")]
pub type SelectedAppTask = BaseAppTask;
/// The application task linked into this build.
#[cfg(not(feature = "base-app"))]
pub type SelectedAppTask = AppTask;

/// Depth of the application event queue.
pub const APP_EVENT_QUEUE_SIZE: usize = 10;

/// How long the function button must be held to request a factory reset.
pub const FACTORY_RESET_HOLD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppVariant {
    Base,
    Full,
}

/// Input to the application task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The function button was released after being held for `held`.
    FunctionButton { held: Duration },
    /// The application button was pressed.
    AppButton,
    /// An identify request started or stopped.
    Identify { active: bool },
}

/// Two-phase startup contract shared by both task variants.
pub trait ApplicationTask {
    const VARIANT: AppVariant;

    /// Prepare the board and the event queue.
    ///
    /// # Errors
    ///
    /// The board's own error, or [`NodeError::IncorrectState`] when already
    /// initialized.
    fn init(&mut self) -> Result<(), NodeError>;

    /// Arm the board buttons and spawn the task on `spawner`.
    ///
    /// # Errors
    ///
    /// The board's own error, or [`NodeError::IncorrectState`] before
    /// [`init`][Self::init] or when already started.
    fn start_app_task(&mut self, spawner: &Handle) -> Result<(), NodeError>;

    /// Queue an event for the task without waiting.
    fn post_event(&self, event: AppEvent) -> Result<(), NodeError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Shared task machinery
// ────────────────────────────────────────────────────────────────────────────

/// Variant-specific event handling run on the application task.
pub(crate) trait AppEventHandler: Send + 'static {
    /// Called once from [`ApplicationTask::init`] after the board is ready.
    fn on_init(&mut self, _board: &mut dyn Board) {}

    fn on_event(&mut self, board: &mut dyn Board, event: AppEvent);
}

/// Behaviour common to every variant. Returns `false` for events it does
/// not own.
pub(crate) fn handle_common_event(board: &mut dyn Board, event: AppEvent) -> bool {
    match event {
        AppEvent::FunctionButton { held } if held >= FACTORY_RESET_HOLD => {
            warn!(held_ms = held.as_millis() as u64, "factory reset requested");
            board.factory_reset();
            true
        }
        AppEvent::FunctionButton { held } => {
            debug!(held_ms = held.as_millis() as u64, "function button released early");
            true
        }
        AppEvent::Identify { active } => {
            info!(active, "identify");
            board.set_status_led(active);
            true
        }
        AppEvent::AppButton => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Constructed,
    Initialized,
    Running,
}

pub(crate) struct AppTaskCore<H: AppEventHandler> {
    name: &'static str,
    board: Option<Box<dyn Board>>,
    handler: Option<H>,
    sender: Option<mpsc::Sender<AppEvent>>,
    receiver: Option<mpsc::Receiver<AppEvent>>,
    state: TaskState,
    task: Option<JoinHandle<()>>,
}

impl<H: AppEventHandler> AppTaskCore<H> {
    pub(crate) fn new(name: &'static str, board: Box<dyn Board>, handler: H) -> Self {
        Self {
            name,
            board: Some(board),
            handler: Some(handler),
            sender: None,
            receiver: None,
            state: TaskState::Constructed,
            task: None,
        }
    }

    pub(crate) fn init(&mut self) -> Result<(), NodeError> {
        if self.state != TaskState::Constructed {
            return Err(NodeError::IncorrectState);
        }
        let board = self.board.as_mut().ok_or(NodeError::IncorrectState)?;
        let handler = self.handler.as_mut().ok_or(NodeError::IncorrectState)?;
        board.init()?;
        board.set_status_led(false);
        handler.on_init(&mut **board);

        let (sender, receiver) = mpsc::channel(APP_EVENT_QUEUE_SIZE);
        self.sender = Some(sender);
        self.receiver = Some(receiver);
        self.state = TaskState::Initialized;
        info!(task = self.name, "application task initialized");
        Ok(())
    }

    pub(crate) fn start(&mut self, spawner: &Handle) -> Result<(), NodeError> {
        if self.state != TaskState::Initialized {
            return Err(NodeError::IncorrectState);
        }
        self.board
            .as_mut()
            .ok_or(NodeError::IncorrectState)?
            .enable_buttons()?;
        let (Some(board), Some(handler), Some(receiver)) =
            (self.board.take(), self.handler.take(), self.receiver.take())
        else {
            return Err(NodeError::IncorrectState);
        };
        self.task = Some(spawner.spawn(run_app_task(self.name, board, handler, receiver)));
        self.state = TaskState::Running;
        Ok(())
    }

    pub(crate) fn post_event(&self, event: AppEvent) -> Result<(), NodeError> {
        let sender = self.sender.as_ref().ok_or(NodeError::IncorrectState)?;
        sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => NodeError::NoMemory,
            TrySendError::Closed(_) => NodeError::IncorrectState,
        })
    }

    /// Close the queue and wait for the task to drain it.
    pub(crate) async fn shutdown(mut self) {
        self.sender = None;
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(task = self.name, error = %e, "application task ended abnormally");
        }
    }
}

async fn run_app_task<H: AppEventHandler>(
    name: &'static str,
    mut board: Box<dyn Board>,
    mut handler: H,
    mut receiver: mpsc::Receiver<AppEvent>,
) {
    info!(task = name, "application task running");
    while let Some(event) = receiver.recv().await {
        debug!(task = name, ?event, "app event");
        handler.on_event(&mut *board, event);
    }
    info!(task = name, "application task stopped");
}
