//! In-process simulated collaborators for host builds and CI.
//!
//! Every stub records its calls into a shared [`CallLog`] so tests can
//! assert on exactly which subsystems were touched and in which order, and
//! consults a [`FaultPlan`] so any bring-up stage, the crypto provider, the
//! vendor platform, the board or the application task start can be made
//! to fail on demand.
//!
//! # Example
//!
//! ```rust
//! use nodeup_hal::sim::{FaultPlan, SimHardware};
//! use nodeup_hal::MemoryManager;
//! use nodeup_types::{NodeError, Stage};
//!
//! let hw = SimHardware::new(FaultPlan::new().fail_stage(Stage::MemoryInit, NodeError::NoMemory));
//! let mut memory = hw.memory();
//!
//! assert_eq!(memory.memory_init(), Err(NodeError::NoMemory));
//! assert_eq!(hw.log().entries(), vec!["memory.init"]);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nodeup_types::{DeviceEventType, DeviceRole, EndpointId, NodeError, SleepPolicy, Stage};
use tracing::{debug, warn};

use crate::board::Board;
use crate::platform::{ClearboxHook, CryptoProvider, PowerCycleCounter, SleepControl, VendorPlatform};
use crate::stack::{
    CommissioningDriver, EventSink, MemoryManager, OtaRequestor, RpcTransport, ShellTask,
    ThreadStack,
};

// ────────────────────────────────────────────────────────────────────────────
// Call log
// ────────────────────────────────────────────────────────────────────────────

/// Ordered record of every call made into a simulated collaborator.
///
/// Clones share the same underlying log.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        let entry = entry.into();
        debug!(call = %entry, "sim call");
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    /// Snapshot of all entries in call order.
    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    /// Index of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fault plan
// ────────────────────────────────────────────────────────────────────────────

/// Which simulated calls fail, and how.
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    stages: HashMap<Stage, NodeError>,
    crypto_status: i32,
    vendor_status: i32,
    board_init: Option<NodeError>,
    task_start: Option<NodeError>,
}

impl FaultPlan {
    /// A plan where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the collaborator call behind `stage` return `error`.
    pub fn fail_stage(mut self, stage: Stage, error: NodeError) -> Self {
        self.stages.insert(stage, error);
        self
    }

    /// Status returned by the simulated crypto provider (`0` is success).
    pub fn crypto_status(mut self, status: i32) -> Self {
        self.crypto_status = status;
        self
    }

    /// Status returned by the simulated vendor platform (negative is fatal).
    pub fn vendor_status(mut self, status: i32) -> Self {
        self.vendor_status = status;
        self
    }

    pub fn fail_board_init(mut self, error: NodeError) -> Self {
        self.board_init = Some(error);
        self
    }

    /// Make arming the board buttons fail, which fails the application
    /// task start.
    pub fn fail_task_start(mut self, error: NodeError) -> Self {
        self.task_start = Some(error);
        self
    }

    /// Outcome the simulated collaborator behind `stage` reports.
    pub fn stage_result(&self, stage: Stage) -> Result<(), NodeError> {
        match self.stages.get(&stage) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vendor layer stubs
// ────────────────────────────────────────────────────────────────────────────

/// Simulated vendor platform. Calls the application callback unless the
/// fault plan sets a negative status.
pub struct SimVendorPlatform {
    log: CallLog,
    status: i32,
}

impl VendorPlatform for SimVendorPlatform {
    fn init(&mut self, app_init: &mut dyn FnMut()) -> i32 {
        self.log.record("vendor.init");
        if self.status >= 0 {
            app_init();
        }
        self.status
    }
}

pub struct SimSleepControl {
    log: CallLog,
}

impl SleepControl for SimSleepControl {
    fn apply(&mut self, policy: SleepPolicy) {
        match policy {
            SleepPolicy::Enabled => self.log.record("sleep.enable"),
            SleepPolicy::AlwaysDisabled => self.log.record("sleep.disable_always"),
        }
    }
}

pub struct SimCrypto {
    log: CallLog,
    status: i32,
}

impl CryptoProvider for SimCrypto {
    fn init(&mut self) -> i32 {
        self.log.record("crypto.init");
        self.status
    }
}

pub struct SimPowerCycleCounter {
    log: CallLog,
}

impl PowerCycleCounter for SimPowerCycleCounter {
    fn reset_init(&mut self) {
        self.log.record("power_cycle.reset_init");
    }
}

pub struct SimClearboxHook {
    log: CallLog,
}

impl ClearboxHook for SimClearboxHook {
    fn on_application_init(&mut self) {
        self.log.record("clearbox.application_init");
    }
}

/// Simulated board. LED and light changes are logged with their new state.
pub struct SimBoard {
    log: CallLog,
    init_error: Option<NodeError>,
    buttons_error: Option<NodeError>,
}

impl Board for SimBoard {
    fn init(&mut self) -> Result<(), NodeError> {
        self.log.record("board.init");
        match &self.init_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn enable_buttons(&mut self) -> Result<(), NodeError> {
        self.log.record("board.enable_buttons");
        match &self.buttons_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn set_status_led(&mut self, on: bool) {
        self.log.record(format!("board.status_led({on})"));
    }

    fn set_light(&mut self, on: bool) {
        self.log.record(format!("board.light({on})"));
    }

    fn factory_reset(&mut self) {
        self.log.record("board.factory_reset");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stack stubs
// ────────────────────────────────────────────────────────────────────────────

pub struct SimRpcTransport {
    log: CallLog,
    faults: FaultPlan,
}

impl RpcTransport for SimRpcTransport {
    fn init(&mut self) -> Result<(), NodeError> {
        self.log.record("rpc.init");
        self.faults.stage_result(Stage::RpcTransport)
    }
}

pub struct SimMemory {
    log: CallLog,
    faults: FaultPlan,
}

impl MemoryManager for SimMemory {
    fn memory_init(&mut self) -> Result<(), NodeError> {
        self.log.record("memory.init");
        self.faults.stage_result(Stage::MemoryInit)
    }
}

pub struct SimShell {
    log: CallLog,
    faults: FaultPlan,
}

impl ShellTask for SimShell {
    fn start(&mut self) -> Result<(), NodeError> {
        self.log.record("shell.start");
        self.faults.stage_result(Stage::ShellTask)
    }
}

/// Simulated Thread stack.
///
/// Starting the Thread task "attaches" immediately: a `ThreadStateChange`
/// and then a `DnssdInitialized` event are posted to the event sink, where
/// they wait until the event loop runs. A queue too small to hold both
/// fails the Thread task stage with the sink's error.
pub struct SimThreadStack {
    log: CallLog,
    faults: FaultPlan,
    events: Option<Arc<dyn EventSink>>,
}

impl SimThreadStack {
    const SOURCE: &'static str = "thread-stack";

    /// Events posted, in order, when the Thread task starts.
    pub const ATTACH_EVENTS: [DeviceEventType; 2] =
        [DeviceEventType::ThreadStateChange, DeviceEventType::DnssdInitialized];
}

impl ThreadStack for SimThreadStack {
    fn init_thread_stack(&mut self) -> Result<(), NodeError> {
        self.log.record("thread.init");
        self.faults.stage_result(Stage::ThreadStack)
    }

    fn set_device_type(&mut self, role: DeviceRole) -> Result<(), NodeError> {
        self.log.record(format!("thread.set_device_type({role})"));
        self.faults.stage_result(Stage::ThreadDeviceType)
    }

    fn start_thread_task(&mut self) -> Result<(), NodeError> {
        self.log.record("thread.start_task");
        self.faults.stage_result(Stage::ThreadTask)?;
        if let Some(events) = &self.events {
            for kind in Self::ATTACH_EVENTS {
                events.post(Self::SOURCE, kind).inspect_err(|e| {
                    warn!(error = %e, ?kind, "sim thread stack could not post event");
                })?;
            }
        }
        Ok(())
    }
}

pub struct SimCommissioningDriver {
    log: CallLog,
}

impl CommissioningDriver for SimCommissioningDriver {
    fn init(&mut self, endpoint: EndpointId) {
        self.log.record(format!("commissioning.init({endpoint})"));
    }
}

pub struct SimOtaRequestor {
    log: CallLog,
}

impl OtaRequestor for SimOtaRequestor {
    fn initialize(&self) {
        self.log.record("ota.initialize");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimHardware factory
// ────────────────────────────────────────────────────────────────────────────

/// Factory for simulated collaborators sharing one [`CallLog`] and
/// [`FaultPlan`].
#[derive(Clone, Debug, Default)]
pub struct SimHardware {
    log: CallLog,
    faults: FaultPlan,
}

impl SimHardware {
    pub fn new(faults: FaultPlan) -> Self {
        Self {
            log: CallLog::new(),
            faults,
        }
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    pub fn vendor(&self) -> Box<SimVendorPlatform> {
        Box::new(SimVendorPlatform {
            log: self.log.clone(),
            status: self.faults.vendor_status,
        })
    }

    pub fn sleep(&self) -> Box<SimSleepControl> {
        Box::new(SimSleepControl {
            log: self.log.clone(),
        })
    }

    pub fn crypto(&self) -> Box<SimCrypto> {
        Box::new(SimCrypto {
            log: self.log.clone(),
            status: self.faults.crypto_status,
        })
    }

    pub fn power_cycle_counter(&self) -> Box<SimPowerCycleCounter> {
        Box::new(SimPowerCycleCounter {
            log: self.log.clone(),
        })
    }

    pub fn clearbox_hook(&self) -> Box<SimClearboxHook> {
        Box::new(SimClearboxHook {
            log: self.log.clone(),
        })
    }

    pub fn board(&self) -> Box<SimBoard> {
        Box::new(SimBoard {
            log: self.log.clone(),
            init_error: self.faults.board_init.clone(),
            buttons_error: self.faults.task_start.clone(),
        })
    }

    pub fn rpc(&self) -> Box<SimRpcTransport> {
        Box::new(SimRpcTransport {
            log: self.log.clone(),
            faults: self.faults.clone(),
        })
    }

    pub fn memory(&self) -> Box<SimMemory> {
        Box::new(SimMemory {
            log: self.log.clone(),
            faults: self.faults.clone(),
        })
    }

    pub fn shell(&self) -> Box<SimShell> {
        Box::new(SimShell {
            log: self.log.clone(),
            faults: self.faults.clone(),
        })
    }

    /// Thread stack that posts attach events to `events` once its task starts.
    pub fn thread_stack(&self, events: Option<Arc<dyn EventSink>>) -> Box<SimThreadStack> {
        Box::new(SimThreadStack {
            log: self.log.clone(),
            faults: self.faults.clone(),
            events,
        })
    }

    pub fn commissioning(&self) -> Box<SimCommissioningDriver> {
        Box::new(SimCommissioningDriver {
            log: self.log.clone(),
        })
    }

    pub fn ota_requestor(&self) -> Arc<SimOtaRequestor> {
        Arc::new(SimOtaRequestor {
            log: self.log.clone(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
