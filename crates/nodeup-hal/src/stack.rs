//! Protocol and mesh stack services started by the bring-up sequencer.
//!
//! Each service exposes the single entry point bring-up needs and reports
//! failures in the shared [`NodeError`] domain. What happens behind the
//! entry point (commissioning, routing, OTA transfers) is the service's own
//! business.

use nodeup_types::{DeviceEventType, DeviceRole, EndpointId, NodeError};

/// Remote-procedure transport used by host tooling.
pub trait RpcTransport: Send {
    fn init(&mut self) -> Result<(), NodeError>;
}

/// Heap and allocator used by the protocol stack.
pub trait MemoryManager: Send {
    fn memory_init(&mut self) -> Result<(), NodeError>;
}

/// Debug shell running on its own task.
pub trait ShellTask: Send {
    fn start(&mut self) -> Result<(), NodeError>;
}

/// Thread mesh networking stack.
pub trait ThreadStack: Send {
    fn init_thread_stack(&mut self) -> Result<(), NodeError>;

    /// Configure the role the node takes in the mesh.
    fn set_device_type(&mut self, role: DeviceRole) -> Result<(), NodeError>;

    /// Start the task that runs the mesh stack.
    fn start_thread_task(&mut self) -> Result<(), NodeError>;
}

/// Network commissioning driver exposing Thread credentials to a
/// provisioning process.
pub trait CommissioningDriver: Send {
    fn init(&mut self, endpoint: EndpointId);
}

/// Over-the-air update requestor.
///
/// Called from the platform event loop, so it must return promptly.
pub trait OtaRequestor: Send + Sync {
    fn initialize(&self);
}

/// Destination for device events raised outside the event loop.
pub trait EventSink: Send + Sync {
    /// Queue an event of `kind` from `source` for dispatch on the event loop.
    ///
    /// # Errors
    ///
    /// [`NodeError::NoMemory`] when the queue is full,
    /// [`NodeError::IncorrectState`] when the loop has shut down.
    fn post(&self, source: &str, kind: DeviceEventType) -> Result<(), NodeError>;
}
