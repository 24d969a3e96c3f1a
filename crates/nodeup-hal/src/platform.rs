//! Vendor-layer services consumed by the process and application entry
//! points.
//!
//! These calls return raw signed statuses rather than
//! [`NodeError`][nodeup_types::NodeError] because they come straight from
//! vendor code: a negative platform status or a non-zero crypto status is a
//! failure, everything else is success.

use nodeup_types::SleepPolicy;

/// Low-level platform bring-up performed once per boot.
pub trait VendorPlatform {
    /// Initialize clocks, radio and the vendor stack, then invoke `app_init`
    /// once low-level hardware init has completed.
    ///
    /// Returns a negative status when the platform could not be brought up;
    /// `app_init` must not have been called in that case.
    fn init(&mut self, app_init: &mut dyn FnMut()) -> i32;
}

/// Vendor sleep control, driven by the selected Thread role.
pub trait SleepControl: Send {
    fn apply(&mut self, policy: SleepPolicy);
}

/// Hardware-backed crypto engine.
pub trait CryptoProvider {
    /// Returns `0` on success, any other value is a provider status code.
    fn init(&mut self) -> i32;
}

/// Counts consecutive short power cycles to detect a user reset request.
pub trait PowerCycleCounter {
    fn reset_init(&mut self);
}

/// Test hook run after application init so test harnesses only observe a
/// node whose init sequence completed.
pub trait ClearboxHook {
    fn on_application_init(&mut self);
}
