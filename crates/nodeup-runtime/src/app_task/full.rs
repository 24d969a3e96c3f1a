//! [`AppTask`] – the full application: everything the base task does, plus
//! an on/off light toggled by the application button.

use nodeup_hal::Board;
use nodeup_types::NodeError;
use tokio::runtime::Handle;
use tracing::info;

use super::{AppEvent, AppEventHandler, AppTaskCore, AppVariant, ApplicationTask, handle_common_event};

#[derive(Default)]
struct LightingHandler {
    light_on: bool,
}

impl AppEventHandler for LightingHandler {
    fn on_init(&mut self, board: &mut dyn Board) {
        board.set_light(self.light_on);
    }

    fn on_event(&mut self, board: &mut dyn Board, event: AppEvent) {
        if handle_common_event(board, event) {
            return;
        }
        if event == AppEvent::AppButton {
            self.light_on = !self.light_on;
            info!(on = self.light_on, "light toggled");
            board.set_light(self.light_on);
        }
    }
}

pub struct AppTask {
    core: AppTaskCore<LightingHandler>,
}

impl AppTask {
    pub fn new(board: Box<dyn Board>) -> Self {
        Self {
            core: AppTaskCore::new("app", board, LightingHandler::default()),
        }
    }

    /// Close the event queue and wait for the task to finish.
    pub async fn shutdown(self) {
        self.core.shutdown().await;
    }
}

impl ApplicationTask for AppTask {
    const VARIANT: AppVariant = AppVariant::Full;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_task::SelectedAppTask;
    use nodeup_hal::sim::SimHardware;

    #[test]
    fn full_variant_is_selected() {
        assert_eq!(<SelectedAppTask as ApplicationTask>::VARIANT, AppVariant::Full);
    }

    #[test]
    fn init_turns_light_off() {
        let hw = SimHardware::default();
        let mut task = AppTask::new(hw.board());
        task.init().unwrap();
        assert_eq!(
            hw.log().entries(),
            vec!["board.init", "board.status_led(false)", "board.light(false)"]
        );
    }

    #[tokio::test]
    async fn app_button_toggles_light() {
        let hw = SimHardware::default();
        let mut task = AppTask::new(hw.board());
        task.init().unwrap();
        task.start_app_task(&Handle::current()).unwrap();

        task.post_event(AppEvent::AppButton).unwrap();
        task.post_event(AppEvent::Identify { active: true }).unwrap();
        task.post_event(AppEvent::AppButton).unwrap();
        task.shutdown().await;

        assert_eq!(
            &hw.log().entries()[4..],
            ["board.light(true)", "board.status_led(true)", "board.light(false)"]
        );
    }
}
