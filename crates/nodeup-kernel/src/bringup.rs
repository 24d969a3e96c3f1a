//! Bring-up sequencer – takes the node's subsystems from power-on to a
//! running event loop.
//!
//! Stages run strictly in [`Stage::ALL`] order. A stage whose feature is not
//! part of the build is skipped; the first stage that fails stops the
//! sequence and is reported as [`BringUpError::StageFailed`]. Nothing is
//! retried and nothing already started is torn down: a failed bring-up
//! leaves the node unusable for this boot and the caller decides what
//! happens next.
//!
//! | Stage | Collaborator call |
//! |---|---|
//! | `rpc-transport` | [`RpcTransport::init`] |
//! | `memory-init` | [`MemoryManager::memory_init`] |
//! | `shell-task` | [`ShellTask::start`] |
//! | `platform-stack` | [`PlatformManager::init_chip_stack`] |
//! | `thread-stack` | [`ThreadStack::init_thread_stack`] |
//! | `thread-device-type` | [`ThreadStack::set_device_type`], then [`SleepControl::apply`] |
//! | `network-commissioning` | [`CommissioningDriver::init`] on the root endpoint |
//! | `thread-task` | [`ThreadStack::start_thread_task`] |
//! | `event-handler` | [`PlatformManager::add_event_handler`] with the [`EventDispatchHook`] |
//! | `event-loop-task` | [`PlatformManager::start_event_loop_task`] |

use std::sync::Arc;

use nodeup_hal::{
    CommissioningDriver, MemoryManager, OtaRequestor, RpcTransport, ShellTask, SleepControl,
    ThreadStack,
};
use nodeup_middleware::PlatformManager;
use nodeup_types::{DeviceRole, NodeError, ROOT_ENDPOINT_ID, Stage};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::event_hook::EventDispatchHook;
use crate::features::BuildConfig;

/// The collaborators bring-up drives, one per subsystem.
pub struct Subsystems {
    pub rpc: Box<dyn RpcTransport>,
    pub memory: Box<dyn MemoryManager>,
    pub shell: Box<dyn ShellTask>,
    pub platform: Box<dyn PlatformManager>,
    pub thread: Box<dyn ThreadStack>,
    pub sleep: Box<dyn SleepControl>,
    pub commissioning: Box<dyn CommissioningDriver>,
    pub ota: Arc<dyn OtaRequestor>,
}

/// What a successful bring-up did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BringUpReport {
    /// Stages run, in order.
    pub executed: Vec<Stage>,
    /// Stages left out of this build.
    pub skipped: Vec<Stage>,
    /// Thread role applied, when the mesh stack is part of the build.
    pub role: Option<DeviceRole>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BringUpError {
    #[error("Bring-up stage {stage} failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: NodeError,
    },
}

impl BringUpError {
    /// The stage that stopped the sequence.
    pub fn stage(&self) -> Stage {
        match self {
            BringUpError::StageFailed { stage, .. } => *stage,
        }
    }

    /// Status code reported by the failing collaborator.
    pub fn code(&self) -> u32 {
        match self {
            BringUpError::StageFailed { source, .. } => source.code(),
        }
    }
}

/// Run every stage enabled in `config` against `subsystems`.
///
/// # Errors
///
/// [`BringUpError::StageFailed`] naming the first stage whose collaborator
/// reported an error; no later stage has been touched.
pub fn bring_up(
    config: &BuildConfig,
    subsystems: &mut Subsystems,
) -> Result<BringUpReport, BringUpError> {
    let mut report = BringUpReport::default();

    for stage in Stage::ALL {
        if !config.stage_enabled(stage) {
            debug!(stage = %stage, "stage not in this build");
            report.skipped.push(stage);
            continue;
        }

        if let Err(source) = run_stage(stage, config, subsystems) {
            error!(stage = %stage, code = source.code(), error = %source, "bring-up stage failed");
            return Err(BringUpError::StageFailed { stage, source });
        }

        debug!(stage = %stage, "stage complete");
        if stage == Stage::ThreadDeviceType {
            report.role = Some(config.role);
        }
        report.executed.push(stage);
    }

    info!(stages = report.executed.len(), "bring-up complete");
    Ok(report)
}

fn run_stage(
    stage: Stage,
    config: &BuildConfig,
    subsystems: &mut Subsystems,
) -> Result<(), NodeError> {
    match stage {
        Stage::RpcTransport => subsystems.rpc.init(),
        Stage::MemoryInit => subsystems.memory.memory_init(),
        Stage::ShellTask => subsystems.shell.start(),
        Stage::PlatformStack => subsystems.platform.init_chip_stack(),
        Stage::ThreadStack => {
            info!("Initializing OpenThread stack");
            subsystems.thread.init_thread_stack()
        }
        Stage::ThreadDeviceType => {
            info!(role = %config.role, "setting Thread device type");
            let result = subsystems.thread.set_device_type(config.role);
            // Sleep policy follows the requested role even if the request failed.
            subsystems.sleep.apply(config.role.sleep_policy());
            result
        }
        Stage::NetworkCommissioning => {
            subsystems.commissioning.init(ROOT_ENDPOINT_ID);
            Ok(())
        }
        Stage::ThreadTask => {
            info!("Starting OpenThread task");
            subsystems.thread.start_thread_task()
        }
        Stage::EventHandler => {
            info!("Starting Platform Manager Event Loop");
            let hook = EventDispatchHook::new(config, Arc::clone(&subsystems.ota));
            subsystems.platform.add_event_handler(hook.into_handler(), 0)
        }
        Stage::EventLoopTask => subsystems.platform.start_event_loop_task(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nodeup_hal::sim::{FaultPlan, SimHardware};
    use nodeup_middleware::Scheduler;
    use nodeup_middleware::sim::SimPlatformManager;

    fn sim_subsystems(hw: &SimHardware, scheduler: &Scheduler) -> Subsystems {
        let platform = SimPlatformManager::new(hw, scheduler.handle(), 8);
        let events = platform.event_sink();
        Subsystems {
            rpc: hw.rpc(),
            memory: hw.memory(),
            shell: hw.shell(),
            thread: hw.thread_stack(Some(events)),
            platform,
            sleep: hw.sleep(),
            commissioning: hw.commissioning(),
            ota: hw.ota_requestor(),
        }
    }

    /// First sim call made by each stage.
    fn first_call(stage: Stage) -> &'static str {
        match stage {
            Stage::RpcTransport => "rpc.init",
            Stage::MemoryInit => "memory.init",
            Stage::ShellTask => "shell.start",
            Stage::PlatformStack => "platform.init_chip_stack",
            Stage::ThreadStack => "thread.init",
            Stage::ThreadDeviceType => "thread.set_device_type(router)",
            Stage::NetworkCommissioning => "commissioning.init(0)",
            Stage::ThreadTask => "thread.start_task",
            Stage::EventHandler => "platform.add_event_handler",
            Stage::EventLoopTask => "platform.start_event_loop",
        }
    }

    #[test]
    fn full_build_runs_every_stage_in_order() {
        let scheduler = Scheduler::new().unwrap();
        let hw = SimHardware::default();
        let mut subsystems = sim_subsystems(&hw, &scheduler);

        let report = bring_up(&BuildConfig::full(DeviceRole::Router), &mut subsystems).unwrap();

        assert_eq!(report.executed, Stage::ALL.to_vec());
        assert!(report.skipped.is_empty());
        assert_eq!(report.role, Some(DeviceRole::Router));
        assert_eq!(
            hw.log().entries(),
            vec![
                "rpc.init",
                "memory.init",
                "shell.start",
                "platform.init_chip_stack",
                "thread.init",
                "thread.set_device_type(router)",
                "sleep.disable_always",
                "commissioning.init(0)",
                "thread.start_task",
                "platform.add_event_handler",
                "platform.start_event_loop",
            ]
        );
    }

    #[test]
    fn failing_stage_stops_every_later_stage() {
        for (index, failing) in Stage::ALL.into_iter().enumerate() {
            // The commissioning driver cannot fail.
            if failing == Stage::NetworkCommissioning {
                continue;
            }
            let scheduler = Scheduler::new().unwrap();
            let hw = SimHardware::new(
                FaultPlan::new().fail_stage(failing, NodeError::Internal(failing.to_string())),
            );
            let mut subsystems = sim_subsystems(&hw, &scheduler);

            let err = bring_up(&BuildConfig::full(DeviceRole::Router), &mut subsystems)
                .expect_err("bring-up must fail");
            assert_eq!(err.stage(), failing);
            assert_eq!(err.code(), 0xAC);

            assert!(hw.log().contains(first_call(failing)), "{failing} was not attempted");
            for later in &Stage::ALL[index + 1..] {
                assert!(
                    !hw.log().contains(first_call(*later)),
                    "{later} ran after {failing} failed"
                );
            }
        }
    }

    #[test]
    fn platform_stack_failure_never_reaches_thread_stack() {
        let scheduler = Scheduler::new().unwrap();
        let hw = SimHardware::new(
            FaultPlan::new().fail_stage(Stage::PlatformStack, NodeError::NoMemory),
        );
        let mut subsystems = sim_subsystems(&hw, &scheduler);

        let err = bring_up(&BuildConfig::full(DeviceRole::Router), &mut subsystems).unwrap_err();

        assert_eq!(
            err,
            BringUpError::StageFailed {
                stage: Stage::PlatformStack,
                source: NodeError::NoMemory,
            }
        );
        assert!(!hw.log().contains("thread.init"));
        assert!(err.to_string().contains("platform-stack"));
    }

    #[test]
    fn rejected_role_still_applies_sleep_policy() {
        let scheduler = Scheduler::new().unwrap();
        let hw = SimHardware::new(
            FaultPlan::new().fail_stage(Stage::ThreadDeviceType, NodeError::InvalidArgument("role".into())),
        );
        let mut subsystems = sim_subsystems(&hw, &scheduler);

        let err = bring_up(
            &BuildConfig::full(DeviceRole::SleepyEndDevice),
            &mut subsystems,
        )
        .unwrap_err();

        assert_eq!(err.stage(), Stage::ThreadDeviceType);
        let entries = hw.log().entries();
        assert_eq!(
            &entries[entries.len() - 2..],
            ["thread.set_device_type(sleepy-end-device)", "sleep.enable"]
        );
    }

    #[test]
    fn minimal_build_skips_optional_stages() {
        let scheduler = Scheduler::new().unwrap();
        let hw = SimHardware::default();
        let mut subsystems = sim_subsystems(&hw, &scheduler);

        let report = bring_up(&BuildConfig::minimal(), &mut subsystems).unwrap();

        assert_eq!(report.role, None);
        assert_eq!(
            report.skipped,
            vec![
                Stage::RpcTransport,
                Stage::ShellTask,
                Stage::ThreadStack,
                Stage::ThreadDeviceType,
                Stage::NetworkCommissioning,
                Stage::ThreadTask,
            ]
        );
        assert_eq!(
            hw.log().entries(),
            vec![
                "memory.init",
                "platform.init_chip_stack",
                "platform.add_event_handler",
                "platform.start_event_loop",
            ]
        );
    }

    #[test]
    fn each_role_maps_to_its_sleep_policy() {
        let cases = [
            (DeviceRole::MinimalEndDevice, "sleep.disable_always"),
            (DeviceRole::SleepyEndDevice, "sleep.enable"),
            (DeviceRole::SynchronizedSleepyEndDevice, "sleep.enable"),
            (DeviceRole::Router, "sleep.disable_always"),
        ];
        for (role, sleep_call) in cases {
            let scheduler = Scheduler::new().unwrap();
            let hw = SimHardware::default();
            let mut subsystems = sim_subsystems(&hw, &scheduler);

            let report = bring_up(&BuildConfig::full(role), &mut subsystems).unwrap();

            assert_eq!(report.role, Some(role));
            let role_call = format!("thread.set_device_type({role})");
            let role_at = hw.log().position(&role_call).unwrap();
            assert_eq!(hw.log().entries()[role_at + 1], sleep_call);
        }
    }

    #[test]
    fn registered_hook_initializes_ota_once_loop_runs() {
        let scheduler = Scheduler::new().unwrap();
        let hw = SimHardware::default();
        let mut subsystems = sim_subsystems(&hw, &scheduler);

        bring_up(&BuildConfig::full(DeviceRole::Router), &mut subsystems).unwrap();
        // The loop task exists but the scheduler has not started it yet.
        assert!(!hw.log().contains("ota.initialize"));

        let log = hw.log().clone();
        let delivered = scheduler.run_until(async move {
            tokio::time::timeout(Duration::from_secs(1), async {
                while !log.contains("ota.initialize") {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .is_ok()
        });

        assert!(delivered, "DNS-SD event never reached the hook");
        assert_eq!(hw.log().count("ota.initialize"), 1);
        drop(subsystems);
    }
}
