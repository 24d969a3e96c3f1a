//! [`SimPlatformManager`] – a real [`PlatformEventLoop`] wrapped with the
//! sim layer's call log and fault plan.
//!
//! Events still flow through the genuine loop; only the three bring-up
//! entry points are recorded and can be made to fail.

use std::sync::Arc;

use nodeup_hal::EventSink;
use nodeup_hal::sim::{CallLog, FaultPlan, SimHardware};
use nodeup_types::{NodeError, Stage};
use tokio::runtime::Handle;

use crate::event_loop::{EventHandlerFn, PlatformEventLoop, PlatformManager};

pub struct SimPlatformManager {
    inner: PlatformEventLoop,
    log: CallLog,
    faults: FaultPlan,
}

impl SimPlatformManager {
    pub fn new(hw: &SimHardware, spawner: Handle, capacity: usize) -> Box<Self> {
        Box::new(Self {
            inner: PlatformEventLoop::new(spawner, capacity),
            log: hw.log().clone(),
            faults: hw.faults().clone(),
        })
    }

    pub fn event_loop(&self) -> &PlatformEventLoop {
        &self.inner
    }
}

impl PlatformManager for SimPlatformManager {
    fn init_chip_stack(&mut self) -> Result<(), NodeError> {
        self.log.record("platform.init_chip_stack");
        self.faults.stage_result(Stage::PlatformStack)?;
        self.inner.init_chip_stack()
    }

    fn add_event_handler(&mut self, handler: EventHandlerFn, arg: usize) -> Result<(), NodeError> {
        self.log.record("platform.add_event_handler");
        self.faults.stage_result(Stage::EventHandler)?;
        self.inner.add_event_handler(handler, arg)
    }

    fn start_event_loop_task(&mut self) -> Result<(), NodeError> {
        self.log.record("platform.start_event_loop");
        self.faults.stage_result(Stage::EventLoopTask)?;
        self.inner.start_event_loop_task()
    }

    fn event_sink(&self) -> Arc<dyn EventSink> {
        self.inner.event_sink()
    }
}
