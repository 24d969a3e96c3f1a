use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a data-model endpoint on the node.
pub type EndpointId = u16;

/// The root endpoint hosts node-wide clusters such as network commissioning.
pub const ROOT_ENDPOINT_ID: EndpointId = 0;

/// One step of the bring-up sequence.
///
/// Variants are declared in the order the sequencer runs them; [`Stage::ALL`]
/// preserves that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Register the remote-procedure transport endpoint.
    RpcTransport,
    /// Initialize the heap used by the protocol stack.
    MemoryInit,
    /// Start the debug shell task.
    ShellTask,
    /// Initialize the platform layer (device event loop substrate).
    PlatformStack,
    /// Initialize the Thread mesh stack.
    ThreadStack,
    /// Select the Thread device role and apply its sleep policy.
    ThreadDeviceType,
    /// Bind the Thread network commissioning driver to the root endpoint.
    NetworkCommissioning,
    /// Start the Thread networking task.
    ThreadTask,
    /// Register the device event handler with the platform event loop.
    EventHandler,
    /// Hand the platform event loop to its own task.
    EventLoopTask,
}

impl Stage {
    /// Every stage, in bring-up order.
    pub const ALL: [Stage; 10] = [
        Stage::RpcTransport,
        Stage::MemoryInit,
        Stage::ShellTask,
        Stage::PlatformStack,
        Stage::ThreadStack,
        Stage::ThreadDeviceType,
        Stage::NetworkCommissioning,
        Stage::ThreadTask,
        Stage::EventHandler,
        Stage::EventLoopTask,
    ];

    /// Stable diagnostic label, also accepted by [`FromStr`].
    pub const fn label(self) -> &'static str {
        match self {
            Stage::RpcTransport => "rpc-transport",
            Stage::MemoryInit => "memory-init",
            Stage::ShellTask => "shell-task",
            Stage::PlatformStack => "platform-stack",
            Stage::ThreadStack => "thread-stack",
            Stage::ThreadDeviceType => "thread-device-type",
            Stage::NetworkCommissioning => "network-commissioning",
            Stage::ThreadTask => "thread-task",
            Stage::EventHandler => "event-handler",
            Stage::EventLoopTask => "event-loop-task",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.label() == s)
            .ok_or_else(|| NodeError::InvalidArgument(format!("unknown stage `{s}`")))
    }
}

/// Low-power policy the vendor layer applies once a Thread role is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SleepPolicy {
    /// The radio and MCU may sleep between polls.
    Enabled,
    /// Sleep stays disabled for the lifetime of the device.
    AlwaysDisabled,
}

/// Thread role of the node. Exactly one is active per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceRole {
    MinimalEndDevice,
    SleepyEndDevice,
    SynchronizedSleepyEndDevice,
    Router,
}

impl DeviceRole {
    /// Resolve the role from build flags.
    ///
    /// Precedence is SSED, then SED, then FTD (router); with none set the node
    /// is a minimal end device.
    pub const fn from_flags(ssed: bool, sed: bool, ftd: bool) -> Self {
        if ssed {
            DeviceRole::SynchronizedSleepyEndDevice
        } else if sed {
            DeviceRole::SleepyEndDevice
        } else if ftd {
            DeviceRole::Router
        } else {
            DeviceRole::MinimalEndDevice
        }
    }

    pub const fn sleep_policy(self) -> SleepPolicy {
        match self {
            DeviceRole::SleepyEndDevice | DeviceRole::SynchronizedSleepyEndDevice => {
                SleepPolicy::Enabled
            }
            DeviceRole::Router | DeviceRole::MinimalEndDevice => SleepPolicy::AlwaysDisabled,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DeviceRole::MinimalEndDevice => "minimal-end-device",
            DeviceRole::SleepyEndDevice => "sleepy-end-device",
            DeviceRole::SynchronizedSleepyEndDevice => "synchronized-sleepy-end-device",
            DeviceRole::Router => "router",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Discriminant of a [`DeviceEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceEventType {
    /// DNS-SD is up: the node can advertise and resolve services.
    DnssdInitialized,
    ThreadStateChange,
    ThreadConnectivityChange,
    CommissioningComplete,
    ServerReady,
    /// Any platform-specific event this layer does not name.
    Other(u16),
}

/// Event delivered by the platform event loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. "thread-stack"
    pub source: String,
    pub kind: DeviceEventType,
}

impl DeviceEvent {
    pub fn new(source: impl Into<String>, kind: DeviceEventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            kind,
        }
    }
}

/// Shared status-code error domain of the protocol stack and its services.
///
/// Codes are stable so they can cross into vendor code and back; `0` is
/// success and never maps to an error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeError {
    #[error("Incorrect state")]
    IncorrectState,

    #[error("No memory")]
    NoMemory,

    #[error("Not implemented")]
    NotImplemented,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Status {0:#06x}")]
    Status(u32),
}

impl NodeError {
    const INCORRECT_STATE: u32 = 0x03;
    const NO_MEMORY: u32 = 0x0B;
    const NOT_IMPLEMENTED: u32 = 0x2D;
    const INVALID_ARGUMENT: u32 = 0x2F;
    const INTERNAL: u32 = 0xAC;

    /// Numeric status code of this error.
    pub fn code(&self) -> u32 {
        match self {
            NodeError::IncorrectState => Self::INCORRECT_STATE,
            NodeError::NoMemory => Self::NO_MEMORY,
            NodeError::NotImplemented => Self::NOT_IMPLEMENTED,
            NodeError::InvalidArgument(_) => Self::INVALID_ARGUMENT,
            NodeError::Internal(_) => Self::INTERNAL,
            NodeError::Status(code) => *code,
        }
    }

    /// Convert a raw status code returned by a collaborator.
    pub fn check(code: u32) -> Result<(), NodeError> {
        match code {
            0 => Ok(()),
            Self::INCORRECT_STATE => Err(NodeError::IncorrectState),
            Self::NO_MEMORY => Err(NodeError::NoMemory),
            Self::NOT_IMPLEMENTED => Err(NodeError::NotImplemented),
            Self::INVALID_ARGUMENT => Err(NodeError::InvalidArgument(String::new())),
            Self::INTERNAL => Err(NodeError::Internal(String::new())),
            other => Err(NodeError::Status(other)),
        }
    }
}
