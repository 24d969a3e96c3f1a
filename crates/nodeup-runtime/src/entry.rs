//! Process entry point – vendor platform init, then scheduler takeover.
//!
//! [`ProcessEntry::run`] hands the vendor layer a callback that runs
//! [`application_init`] exactly once. A negative vendor status ends the
//! boot before the scheduler starts. Otherwise the application outcome is
//! kept, good or bad, and the scheduler owns the boot thread until the
//! shutdown future resolves. On a device it never does.

use std::fmt;
use std::future::Future;

use nodeup_hal::VendorPlatform;
use nodeup_middleware::Scheduler;
use tracing::{error, info, warn};

use crate::application::{AppInitError, ApplicationContext, Node, application_init};

/// How the process entry point ended.
#[derive(Debug)]
pub enum EntryOutcome {
    /// The vendor platform reported a negative status. The scheduler was
    /// never started.
    VendorInitFailed { status: i32 },
    /// The scheduler ran and has stopped. `boot` is the application init
    /// outcome, or `None` if the vendor layer never called back.
    SchedulerStopped {
        boot: Option<Result<Node, AppInitError>>,
    },
}

impl EntryOutcome {
    /// Process exit status. Always 0: failures are reported through the log
    /// and the outcome itself, not through the exit code.
    pub fn exit_code(&self) -> i32 {
        0
    }

    /// The node, when application init completed.
    pub fn node(&self) -> Option<&Node> {
        match self {
            EntryOutcome::SchedulerStopped { boot: Some(Ok(node)) } => Some(node),
            _ => None,
        }
    }
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryOutcome::VendorInitFailed { status } => {
                write!(f, "vendor platform init failed with status {status}")
            }
            EntryOutcome::SchedulerStopped { boot: Some(Ok(_)) } => {
                write!(f, "scheduler stopped after a successful boot")
            }
            EntryOutcome::SchedulerStopped { boot: Some(Err(e)) } => {
                write!(f, "scheduler stopped; application init failed: {e}")
            }
            EntryOutcome::SchedulerStopped { boot: None } => {
                write!(f, "scheduler stopped; application init never ran")
            }
        }
    }
}

pub struct ProcessEntry {
    vendor: Box<dyn VendorPlatform>,
    scheduler: Scheduler,
    context: ApplicationContext,
}

impl ProcessEntry {
    pub fn new(
        vendor: Box<dyn VendorPlatform>,
        scheduler: Scheduler,
        context: ApplicationContext,
    ) -> Self {
        Self {
            vendor,
            scheduler,
            context,
        }
    }

    /// Boot the node and run the scheduler until `shutdown` resolves.
    pub fn run<F: Future>(self, shutdown: F) -> EntryOutcome {
        let Self {
            mut vendor,
            scheduler,
            context,
        } = self;

        let mut context = Some(context);
        let mut boot = None;
        let status = vendor.init(&mut || {
            // A vendor layer calling back twice gets nothing the second time.
            if let Some(ctx) = context.take() {
                boot = Some(application_init(ctx));
            }
        });

        if status < 0 {
            error!(status, "vendor platform init failed");
            return EntryOutcome::VendorInitFailed { status };
        }

        match &boot {
            Some(Ok(node)) => info!(stages = node.bring_up.executed.len(), "node booted"),
            Some(Err(e)) => warn!(error = %e, "application init failed; scheduler starts anyway"),
            None => warn!("vendor platform did not run application init"),
        }

        scheduler.run_until(shutdown);
        EntryOutcome::SchedulerStopped { boot }
    }
}
