//! Application entry point – runs once the vendor platform has finished
//! low-level hardware init.
//!
//! Order of work:
//!
//! 1. power-cycle counting reset logic (`power-cycle-counting`),
//! 2. crypto provider init (`psa-crypto`),
//! 3. [`bring_up`] of every subsystem,
//! 4. application task [`init`][ApplicationTask::init] then
//!    [`start_app_task`][ApplicationTask::start_app_task],
//! 5. the clearbox testing hook (`clearbox-hook`), last, so it never runs
//!    after a failed step.
//!
//! Every failure is logged where it happens and ends application init for
//! this boot. Nothing is retried. The outcome is returned to the caller as
//! an [`AppInitError`] instead of being swallowed, so a supervisor can
//! decide whether to reboot.

use std::fmt;

use nodeup_hal::{ClearboxHook, CryptoProvider, PowerCycleCounter};
use nodeup_kernel::{BringUpError, BringUpReport, BuildConfig, Subsystems, bring_up};
use nodeup_types::NodeError;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{error, info};

use crate::app_task::{ApplicationTask, SelectedAppTask};

/// Application-level diversity fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppFeatures {
    pub psa_crypto: bool,
    pub power_cycle_counting: bool,
    pub clearbox_hook: bool,
}

impl AppFeatures {
    pub const CURRENT: AppFeatures = AppFeatures {
        psa_crypto: cfg!(feature = "psa-crypto"),
        power_cycle_counting: cfg!(feature = "power-cycle-counting"),
        clearbox_hook: cfg!(feature = "clearbox-hook"),
    };

    pub const fn all() -> Self {
        Self {
            psa_crypto: true,
            power_cycle_counting: true,
            clearbox_hook: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            psa_crypto: false,
            power_cycle_counting: false,
            clearbox_hook: false,
        }
    }
}

impl Default for AppFeatures {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Everything application init consumes. Built once per boot and moved in.
pub struct ApplicationContext {
    pub app_name: String,
    pub build: BuildConfig,
    pub features: AppFeatures,
    pub power_cycle: Box<dyn PowerCycleCounter>,
    pub crypto: Box<dyn CryptoProvider>,
    pub clearbox: Box<dyn ClearboxHook>,
    pub subsystems: Subsystems,
    pub app_task: SelectedAppTask,
    /// Where the application task is spawned.
    pub spawner: Handle,
}

/// A node whose application init completed. Owns every long-lived object
/// for the rest of the process.
pub struct Node {
    pub app_task: SelectedAppTask,
    pub bring_up: BringUpReport,
    pub subsystems: Subsystems,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("app_task", &<SelectedAppTask as ApplicationTask>::VARIANT)
            .field("bring_up", &self.bring_up)
            .finish_non_exhaustive()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppInitError {
    #[error("Crypto provider init failed with status {status}")]
    Crypto { status: i32 },

    #[error(transparent)]
    BringUp(#[from] BringUpError),

    #[error("Application task init failed: {0}")]
    TaskInit(#[source] NodeError),

    #[error("Application task start failed: {0}")]
    TaskStart(#[source] NodeError),
}

/// Run application init to completion or to its first failure.
///
/// # Errors
///
/// The first failing step as an [`AppInitError`]; it has already been
/// logged.
pub fn application_init(ctx: ApplicationContext) -> Result<Node, AppInitError> {
    let ApplicationContext {
        app_name,
        build,
        features,
        mut power_cycle,
        mut crypto,
        mut clearbox,
        mut subsystems,
        mut app_task,
        spawner,
    } = ctx;

    if features.power_cycle_counting {
        power_cycle.reset_init();
    }

    if features.psa_crypto {
        let status = crypto.init();
        if status != 0 {
            error!(status, "crypto provider init failed");
            return Err(AppInitError::Crypto { status });
        }
    }

    let report = bring_up(&build, &mut subsystems).inspect_err(|e| {
        error!(stage = %e.stage(), error = %e, "bring-up failed");
    })?;

    info!("============================");
    info!("{app_name} Launching");
    info!("============================");

    app_task.init().map_err(|e| {
        error!(error = %e, "application task init failed");
        AppInitError::TaskInit(e)
    })?;

    app_task.start_app_task(&spawner).map_err(|e| {
        error!(error = %e, "application task start failed");
        AppInitError::TaskStart(e)
    })?;

    if features.clearbox_hook {
        clearbox.on_application_init();
    }

    Ok(Node {
        app_task,
        bring_up: report,
        subsystems,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_node::SimNodeBuilder;
    use nodeup_hal::sim::FaultPlan;
    use nodeup_middleware::Scheduler;
    use nodeup_types::{DeviceRole, Stage};

    fn builder(faults: FaultPlan) -> SimNodeBuilder {
        SimNodeBuilder::new()
            .build_config(BuildConfig::full(DeviceRole::Router))
            .app_features(AppFeatures::all())
            .faults(faults)
    }

    #[test]
    fn crypto_failure_skips_bring_up() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, hw) = builder(FaultPlan::new().crypto_status(-134)).build_context(scheduler.handle());

        let err = application_init(ctx).unwrap_err();

        assert_eq!(err, AppInitError::Crypto { status: -134 });
        assert_eq!(hw.log().entries(), vec!["power_cycle.reset_init", "crypto.init"]);
    }

    #[test]
    fn crypto_is_skipped_without_feature() {
        let scheduler = Scheduler::new().unwrap();
        let mut features = AppFeatures::all();
        features.psa_crypto = false;
        let (ctx, hw) = builder(FaultPlan::new().crypto_status(-1))
            .app_features(features)
            .build_context(scheduler.handle());

        application_init(ctx).unwrap();
        assert!(!hw.log().contains("crypto.init"));
    }

    #[test]
    fn bring_up_failure_stops_before_app_task() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, hw) = builder(FaultPlan::new().fail_stage(Stage::ThreadTask, NodeError::NoMemory))
            .build_context(scheduler.handle());

        let err = application_init(ctx).unwrap_err();

        match err {
            AppInitError::BringUp(e) => assert_eq!(e.stage(), Stage::ThreadTask),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!hw.log().contains("board.init"));
        assert!(!hw.log().contains("clearbox.application_init"));
    }

    #[test]
    fn task_init_failure_skips_start_and_hook() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, hw) = builder(FaultPlan::new().fail_board_init(NodeError::Internal("gpio".into())))
            .build_context(scheduler.handle());

        let err = application_init(ctx).unwrap_err();

        assert_eq!(err, AppInitError::TaskInit(NodeError::Internal("gpio".into())));
        assert!(!hw.log().contains("clearbox.application_init"));
    }

    #[test]
    fn task_start_failure_skips_hook() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, hw) = builder(FaultPlan::new().fail_task_start(NodeError::NoMemory))
            .build_context(scheduler.handle());

        let err = application_init(ctx).unwrap_err();

        assert_eq!(err, AppInitError::TaskStart(NodeError::NoMemory));
        assert!(hw.log().contains("board.init"));
        assert!(hw.log().contains("board.enable_buttons"));
        assert!(!hw.log().contains("clearbox.application_init"));
    }

    #[test]
    fn clearbox_hook_runs_last() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, hw) = builder(FaultPlan::new()).build_context(scheduler.handle());

        let node = application_init(ctx).unwrap();

        let entries = hw.log().entries();
        assert_eq!(entries.first().map(String::as_str), Some("power_cycle.reset_init"));
        assert_eq!(entries.last().map(String::as_str), Some("clearbox.application_init"));
        assert_eq!(hw.log().count("clearbox.application_init"), 1);
        assert_eq!(node.bring_up.executed, Stage::ALL.to_vec());
    }

    #[test]
    fn no_optional_hooks_without_features() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, hw) = builder(FaultPlan::new())
            .app_features(AppFeatures::none())
            .build_context(scheduler.handle());

        application_init(ctx).unwrap();

        let entries = hw.log().entries();
        assert_eq!(entries.first().map(String::as_str), Some("rpc.init"));
        assert!(!hw.log().contains("clearbox.application_init"));
        assert!(!hw.log().contains("power_cycle.reset_init"));
    }

    #[test]
    fn app_task_is_started_on_the_scheduler() {
        let scheduler = Scheduler::new().unwrap();
        let (ctx, _hw) = builder(FaultPlan::new()).build_context(scheduler.handle());

        let node = application_init(ctx).unwrap();

        // Started once: a second start is refused.
        let mut app_task = node.app_task;
        assert_eq!(
            app_task.start_app_task(&scheduler.handle()),
            Err(NodeError::IncorrectState)
        );
    }
}
