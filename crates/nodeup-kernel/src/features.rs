//! [`BuildConfig`] – bring-up diversity fixed at build time.
//!
//! Cargo features decide which optional stages exist and which Thread role
//! the node takes. [`BuildConfig::CURRENT`] captures them as a constant so
//! the sequencer never consults anything that can change at run time; tests
//! construct other configurations explicitly.

use nodeup_types::{DeviceRole, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    pub rpc: bool,
    pub shell: bool,
    pub openthread: bool,
    pub ota_requestor: bool,
    pub role: DeviceRole,
}

impl BuildConfig {
    /// Configuration of this build.
    pub const CURRENT: BuildConfig = BuildConfig {
        rpc: cfg!(feature = "rpc"),
        shell: cfg!(feature = "shell"),
        openthread: cfg!(feature = "openthread"),
        ota_requestor: cfg!(feature = "ota-requestor"),
        role: DeviceRole::from_flags(
            cfg!(feature = "ssed"),
            cfg!(feature = "sed"),
            cfg!(feature = "ftd"),
        ),
    };

    /// Every optional stage enabled, with the given role.
    pub const fn full(role: DeviceRole) -> Self {
        Self {
            rpc: true,
            shell: true,
            openthread: true,
            ota_requestor: true,
            role,
        }
    }

    /// Only the mandatory stages.
    pub const fn minimal() -> Self {
        Self {
            rpc: false,
            shell: false,
            openthread: false,
            ota_requestor: false,
            role: DeviceRole::MinimalEndDevice,
        }
    }

    /// Whether `stage` is part of this build.
    pub const fn stage_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::RpcTransport => self.rpc,
            Stage::ShellTask => self.shell,
            Stage::ThreadStack
            | Stage::ThreadDeviceType
            | Stage::NetworkCommissioning
            | Stage::ThreadTask => self.openthread,
            Stage::MemoryInit
            | Stage::PlatformStack
            | Stage::EventHandler
            | Stage::EventLoopTask => true,
        }
    }

    /// Enabled stages in bring-up order.
    pub fn plan(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| self.stage_enabled(*stage))
            .collect()
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::CURRENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_plan_keeps_mandatory_stages_in_order() {
        assert_eq!(
            BuildConfig::minimal().plan(),
            vec![
                Stage::MemoryInit,
                Stage::PlatformStack,
                Stage::EventHandler,
                Stage::EventLoopTask,
            ]
        );
    }

    #[test]
    fn full_plan_contains_every_stage() {
        assert_eq!(BuildConfig::full(DeviceRole::Router).plan(), Stage::ALL.to_vec());
    }

    #[test]
    fn thread_stages_follow_openthread_flag() {
        let mut config = BuildConfig::minimal();
        config.openthread = true;
        let plan = config.plan();
        assert!(plan.contains(&Stage::ThreadStack));
        assert!(plan.contains(&Stage::NetworkCommissioning));
        assert!(!plan.contains(&Stage::RpcTransport));
        assert!(!plan.contains(&Stage::ShellTask));
    }

    #[test]
    fn current_role_matches_feature_precedence() {
        let expected = if cfg!(feature = "ssed") {
            DeviceRole::SynchronizedSleepyEndDevice
        } else if cfg!(feature = "sed") {
            DeviceRole::SleepyEndDevice
        } else if cfg!(feature = "ftd") {
            DeviceRole::Router
        } else {
            DeviceRole::MinimalEndDevice
        };
        assert_eq!(BuildConfig::CURRENT.role, expected);
    }
}
