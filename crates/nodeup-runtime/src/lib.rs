//! `nodeup-runtime` – Application and process entry points
//!
//! Everything between the vendor platform handing over control and the
//! scheduler taking the boot thread.
//!
//! # Modules
//!
//! - [`application`] – [`application_init`][application::application_init]:
//!   power-cycle counting, crypto provider, bring-up, application task
//!   start and the clearbox hook, failing fast into an
//!   [`AppInitError`][application::AppInitError].
//! - [`entry`] – [`ProcessEntry`][entry::ProcessEntry]: vendor platform init
//!   with the application callback, then scheduler takeover.
//! - [`app_task`] – the application task variant linked into this build
//!   ([`SelectedAppTask`][app_task::SelectedAppTask]) and its event queue.
//! - [`sim_node`] – [`SimNodeBuilder`][sim_node::SimNodeBuilder]: a whole
//!   node wired from sim-layer collaborators.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging and optional OTLP span export.
//!
//! Build diversity is fixed by Cargo features. Kernel features (`rpc`,
//! `shell`, `openthread`, `ota-requestor`, `sed`, `ssed`, `ftd`) are
//! forwarded to `nodeup-kernel`; `psa-crypto`, `power-cycle-counting`,
//! `clearbox-hook` and `base-app` belong to this crate.

pub mod app_task;
pub mod application;
pub mod entry;
pub mod sim_node;
pub mod telemetry;

pub use app_task::{AppEvent, AppVariant, ApplicationTask, SelectedAppTask};
pub use application::{AppFeatures, AppInitError, ApplicationContext, Node, application_init};
pub use entry::{EntryOutcome, ProcessEntry};
pub use sim_node::SimNodeBuilder;
pub use telemetry::{TracerProviderGuard, init_tracing};

// Re-exported so the binary can name the build without depending on the
// kernel directly.
pub use nodeup_kernel::BuildConfig;
