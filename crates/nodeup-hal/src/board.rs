//! Generic `Board` trait for the user-facing peripherals the application
//! task drives: status LED, application light, buttons and factory reset.

use nodeup_types::NodeError;

/// User-facing board peripherals.
///
/// The application task owns its board for the lifetime of the process and
/// drives it from its own task, hence `Send`.
pub trait Board: Send {
    /// Configure GPIOs, LEDs and button interrupts.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] when a peripheral cannot be configured.
    fn init(&mut self) -> Result<(), NodeError>;

    /// Arm the button interrupts. Called when the application task starts,
    /// so presses only arrive once something consumes them.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] when the interrupts cannot be armed.
    fn enable_buttons(&mut self) -> Result<(), NodeError>;

    fn set_status_led(&mut self, on: bool);

    /// Drive the application light (the endpoint's on/off output).
    fn set_light(&mut self, on: bool);

    /// Erase fabric data and reboot into an uncommissioned state.
    fn factory_reset(&mut self);
}
