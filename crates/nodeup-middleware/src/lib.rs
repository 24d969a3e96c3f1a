//! `nodeup-middleware` – Device layer runtime
//!
//! The execution substrate the bring-up sequencer builds on: the platform
//! event loop that serializes device events, and the scheduler that takes
//! over the boot thread once bring-up is done.
//!
//! # Modules
//!
//! - [`event_loop`] – [`PlatformManager`] trait and its Tokio-backed
//!   [`PlatformEventLoop`]: bounded event queue, ordered handler registry,
//!   single dispatch task.
//! - [`scheduler`] – [`Scheduler`]: current-thread Tokio runtime standing in
//!   for the RTOS scheduler.
//! - [`sim`] – [`SimPlatformManager`][sim::SimPlatformManager]: the real
//!   event loop with sim-layer call recording and fault injection.

pub mod event_loop;
pub mod scheduler;
pub mod sim;

pub use event_loop::{
    DEFAULT_EVENT_QUEUE_CAPACITY, EventHandlerFn, EventSender, MAX_EVENT_QUEUE_CAPACITY,
    PlatformEventLoop, PlatformManager,
};
pub use scheduler::Scheduler;
