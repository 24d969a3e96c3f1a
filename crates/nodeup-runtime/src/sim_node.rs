//! [`SimNodeBuilder`] – wires a complete node out of sim-layer
//! collaborators for host runs and tests.
//!
//! Every collaborator shares one [`SimHardware`], so a single call log
//! shows the whole boot in order. The Thread stack posts its attach events
//! into the real platform event loop.

use nodeup_hal::sim::{FaultPlan, SimHardware};
use nodeup_kernel::{BuildConfig, Subsystems};
use nodeup_middleware::sim::SimPlatformManager;
use nodeup_middleware::{DEFAULT_EVENT_QUEUE_CAPACITY, PlatformManager, Scheduler};
use tokio::runtime::Handle;

use crate::app_task::SelectedAppTask;
use crate::application::{AppFeatures, ApplicationContext};
use crate::entry::ProcessEntry;

/// Application name used when none is configured.
pub const DEFAULT_APP_NAME: &str = "nodeup Light";

#[derive(Debug, Clone)]
pub struct SimNodeBuilder {
    app_name: String,
    build: BuildConfig,
    features: AppFeatures,
    faults: FaultPlan,
    event_queue_capacity: usize,
}

impl Default for SimNodeBuilder {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            build: BuildConfig::CURRENT,
            features: AppFeatures::CURRENT,
            faults: FaultPlan::new(),
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl SimNodeBuilder {
    /// A builder for this build's configuration with no injected faults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn build_config(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    pub fn app_features(mut self, features: AppFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    /// Application context whose tasks spawn onto `spawner`, plus the
    /// hardware handle for inspecting the call log.
    pub fn build_context(&self, spawner: Handle) -> (ApplicationContext, SimHardware) {
        let hw = SimHardware::new(self.faults.clone());
        let platform = SimPlatformManager::new(&hw, spawner.clone(), self.event_queue_capacity);
        let thread = hw.thread_stack(Some(platform.event_sink()));

        let subsystems = Subsystems {
            rpc: hw.rpc(),
            memory: hw.memory(),
            shell: hw.shell(),
            platform,
            thread,
            sleep: hw.sleep(),
            commissioning: hw.commissioning(),
            ota: hw.ota_requestor(),
        };

        let context = ApplicationContext {
            app_name: self.app_name.clone(),
            build: self.build,
            features: self.features,
            power_cycle: hw.power_cycle_counter(),
            crypto: hw.crypto(),
            clearbox: hw.clearbox_hook(),
            subsystems,
            app_task: SelectedAppTask::new(hw.board()),
            spawner,
        };
        (context, hw)
    }

    /// Full process entry point on `scheduler`.
    pub fn build_entry(&self, scheduler: Scheduler) -> (ProcessEntry, SimHardware) {
        let (context, hw) = self.build_context(scheduler.handle());
        let entry = ProcessEntry::new(hw.vendor(), scheduler, context);
        (entry, hw)
    }
}
