//! `nodeup-kernel` – Bring-up orchestration
//!
//! Takes the node from power-on to a running event loop in dependency
//! order and stops at the first failure.
//!
//! # Modules
//!
//! - [`features`] – [`BuildConfig`][features::BuildConfig]: which optional
//!   stages and which Thread role this build carries, fixed by Cargo
//!   features.
//! - [`bringup`] – [`bring_up`][bringup::bring_up]: the fail-fast stage
//!   sequencer over [`Subsystems`][bringup::Subsystems].
//! - [`event_hook`] – [`EventDispatchHook`][event_hook::EventDispatchHook]:
//!   the device event handler that starts the OTA requestor once DNS-SD is
//!   ready.

pub mod bringup;
pub mod event_hook;
pub mod features;

pub use bringup::{BringUpError, BringUpReport, Subsystems, bring_up};
pub use event_hook::EventDispatchHook;
pub use features::BuildConfig;
