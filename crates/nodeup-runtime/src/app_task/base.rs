//! [`BaseAppTask`] – the minimal application: identify and factory reset,
//! nothing endpoint-specific.

use nodeup_hal::Board;
use nodeup_types::NodeError;
use tokio::runtime::Handle;
use tracing::debug;

use super::{AppEvent, AppEventHandler, AppTaskCore, AppVariant, ApplicationTask, handle_common_event};

struct BaseHandler;

impl AppEventHandler for BaseHandler {
    fn on_event(&mut self, board: &mut dyn Board, event: AppEvent) {
        if !handle_common_event(board, event) {
            debug!(?event, "event not handled by base application");
        }
    }
}

pub struct BaseAppTask {
    core: AppTaskCore<BaseHandler>,
}

impl BaseAppTask {
    pub fn new(board: Box<dyn Board>) -> Self {
        Self {
            core: AppTaskCore::new("base-app", board, BaseHandler),
        }
    }

    /// Close the event queue and wait for the task to finish.
    pub async fn shutdown(self) {
        self.core.shutdown().await;
    }
}

impl ApplicationTask for BaseAppTask {
    const VARIANT: AppVariant = AppVariant::Base;

    fn init(&mut self) -> Result<(), NodeError> {
        self.core.init()
    }

    fn start_app_task(&mut self, spawner: &Handle) -> Result<(), NodeError> {
        self.core.start(spawner)
    }

    fn post_event(&self, event: AppEvent) -> Result<(), NodeError> {
        self.core.post_event(event)
    }
}
