//! `nodeup-hal` – Collaborator boundary
//!
//! Every subsystem the node orchestrates but does not implement is reached
//! through a trait in this crate. Real firmware links vendor and protocol
//! stack bindings behind them; host builds and tests link [`sim`].
//!
//! # Modules
//!
//! - [`platform`] – vendor-layer services: platform init with the
//!   application callback, sleep control, crypto provider, power-cycle
//!   counting and the clearbox test hook.
//! - [`board`] – [`Board`][board::Board]: buttons, LEDs and factory reset as
//!   seen by the application task.
//! - [`stack`] – protocol and mesh stack services started during bring-up
//!   (RPC transport, memory, shell, Thread stack, commissioning driver, OTA
//!   requestor) and the [`EventSink`][stack::EventSink] they post through.
//! - [`sim`] – in-process stubs for all of the above, recording every call
//!   into a shared [`CallLog`][sim::CallLog] with per-stage fault injection.

pub mod board;
pub mod platform;
pub mod sim;
pub mod stack;

pub use board::Board;
pub use platform::{ClearboxHook, CryptoProvider, PowerCycleCounter, SleepControl, VendorPlatform};
pub use stack::{
    CommissioningDriver, EventSink, MemoryManager, OtaRequestor, RpcTransport, ShellTask,
    ThreadStack,
};
