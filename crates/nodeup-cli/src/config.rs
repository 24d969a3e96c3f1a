//! Host run configuration – reads `~/.nodeup/config.toml`.
//!
//! Everything here shapes the simulated node the binary boots; build
//! diversity itself stays in Cargo features.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use nodeup_hal::sim::FaultPlan;
use nodeup_middleware::{DEFAULT_EVENT_QUEUE_CAPACITY, MAX_EVENT_QUEUE_CAPACITY};
use nodeup_runtime::sim_node::DEFAULT_APP_NAME;
use nodeup_types::{NodeError, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Name shown in the launch banner.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Depth of the platform event queue.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Bring-up stage whose collaborator is made to fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_stage: Option<Stage>,

    /// Status returned by the simulated vendor platform init.
    #[serde(default)]
    pub vendor_status: i32,

    /// Status returned by the simulated crypto provider init.
    #[serde(default)]
    pub crypto_status: i32,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}
fn default_event_queue_capacity() -> usize {
    DEFAULT_EVENT_QUEUE_CAPACITY
}

fn queue_capacity_in_range(capacity: usize) -> bool {
    (1..=MAX_EVENT_QUEUE_CAPACITY).contains(&capacity)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            event_queue_capacity: default_event_queue_capacity(),
            fail_stage: None,
            vendor_status: 0,
            crypto_status: 0,
        }
    }
}

impl Config {
    /// Reject values the node cannot be built with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if !queue_capacity_in_range(self.event_queue_capacity) {
            return Err(NodeError::InvalidArgument(format!(
                "event_queue_capacity must be within 1..={MAX_EVENT_QUEUE_CAPACITY}, got {}",
                self.event_queue_capacity
            )));
        }
        Ok(())
    }

    /// Fault plan for the sim layer.
    pub fn fault_plan(&self) -> FaultPlan {
        let mut plan = FaultPlan::new()
            .vendor_status(self.vendor_status)
            .crypto_status(self.crypto_status);
        if let Some(stage) = self.fail_stage {
            plan = plan.fail_stage(stage, NodeError::Internal(format!("injected fault at {stage}")));
        }
        plan
    }
}

/// `$NODEUP_CONFIG` when set, otherwise `~/.nodeup/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("NODEUP_CONFIG") {
        return PathBuf::from(path);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".nodeup").join("config.toml")
}

/// Load the config, falling back to defaults when no file exists.
/// Environment overrides apply either way.
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path. `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    cfg.validate()
        .map_err(|e| format!("Invalid config at {}: {}", path.display(), e))?;
    Ok(Some(cfg))
}

/// Apply `NODEUP_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `NODEUP_APP_NAME` | `app_name` |
/// | `NODEUP_EVENT_QUEUE_CAPACITY` | `event_queue_capacity` |
/// | `NODEUP_FAIL_STAGE` | `fail_stage` (stage label, e.g. `thread-task`) |
///
/// Unparseable values are ignored, as are queue capacities outside
/// `1..=MAX_EVENT_QUEUE_CAPACITY`.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("NODEUP_APP_NAME") {
        cfg.app_name = v;
    }
    if let Ok(v) = std::env::var("NODEUP_EVENT_QUEUE_CAPACITY")
        && let Ok(capacity) = v.parse::<usize>()
        && queue_capacity_in_range(capacity)
    {
        cfg.event_queue_capacity = capacity;
    }
    if let Ok(v) = std::env::var("NODEUP_FAIL_STAGE")
        && let Ok(stage) = v.parse::<Stage>()
    {
        cfg.fail_stage = Some(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).expect("config dir");
        fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    #[test]
    fn config_path_points_to_nodeup_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".nodeup"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let (_dir, path) = write_config("app_name = \"Bench Light\"\n");
        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.app_name, "Bench Light");
        assert_eq!(cfg.event_queue_capacity, DEFAULT_EVENT_QUEUE_CAPACITY);
        assert_eq!(cfg.fail_stage, None);
        assert_eq!(cfg.vendor_status, 0);
    }

    #[test]
    fn fail_stage_uses_stage_labels() {
        let (_dir, path) = write_config("fail_stage = \"thread-device-type\"\ncrypto_status = -3\n");
        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.fail_stage, Some(Stage::ThreadDeviceType));
        assert_eq!(cfg.crypto_status, -3);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (_dir, path) = write_config("event_queue_capacity = \"lots\"\n");
        let err = load_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }

    #[test]
    fn oversized_queue_capacity_is_rejected() {
        let (_dir, path) = write_config(&format!("event_queue_capacity = {}\n", u32::MAX));
        let err = load_from(&path).unwrap_err();
        assert!(err.starts_with("Invalid config"));
        assert!(err.contains("event_queue_capacity"));
    }

    #[test]
    fn validate_bounds_queue_capacity() {
        let mut cfg = Config::default();
        assert_eq!(cfg.validate(), Ok(()));

        cfg.event_queue_capacity = MAX_EVENT_QUEUE_CAPACITY;
        assert_eq!(cfg.validate(), Ok(()));

        cfg.event_queue_capacity = 0;
        assert!(matches!(cfg.validate(), Err(NodeError::InvalidArgument(_))));

        cfg.event_queue_capacity = usize::MAX;
        assert!(matches!(cfg.validate(), Err(NodeError::InvalidArgument(_))));
    }

    #[test]
    fn fault_plan_follows_config() {
        let cfg = Config {
            fail_stage: Some(Stage::ShellTask),
            ..Config::default()
        };
        let plan = cfg.fault_plan();
        assert!(plan.stage_result(Stage::ShellTask).is_err());
        assert!(plan.stage_result(Stage::MemoryInit).is_ok());
    }

    // Every override lives in one test: the variables are process-wide.
    #[test]
    fn apply_env_overrides_reads_nodeup_vars() {
        // SAFETY: no other test in this crate touches these variables.
        unsafe {
            std::env::set_var("NODEUP_APP_NAME", "Env Light");
            std::env::set_var("NODEUP_EVENT_QUEUE_CAPACITY", "0");
            std::env::set_var("NODEUP_FAIL_STAGE", "event-loop-task");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.app_name, "Env Light");
        assert_eq!(cfg.event_queue_capacity, DEFAULT_EVENT_QUEUE_CAPACITY);
        assert_eq!(cfg.fail_stage, Some(Stage::EventLoopTask));

        unsafe {
            std::env::set_var("NODEUP_EVENT_QUEUE_CAPACITY", "64");
            std::env::set_var("NODEUP_FAIL_STAGE", "no-such-stage");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.event_queue_capacity, 64);
        assert_eq!(cfg.fail_stage, None);

        unsafe {
            std::env::set_var("NODEUP_EVENT_QUEUE_CAPACITY", "999999999999");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.event_queue_capacity, DEFAULT_EVENT_QUEUE_CAPACITY);

        unsafe {
            std::env::remove_var("NODEUP_APP_NAME");
            std::env::remove_var("NODEUP_EVENT_QUEUE_CAPACITY");
            std::env::remove_var("NODEUP_FAIL_STAGE");
        }
    }
}
