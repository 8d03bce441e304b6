//! The hardware boundary: four output lines, one input line, and a delay.
//!
//! [`PinDriver`] is the only component in this crate allowed to touch
//! hardware. Every other module goes through it, which is what makes
//! [`crate::fake::LoopbackPins`] able to turn the whole crate into something
//! unit-testable without a target attached.

/// A digital level driven onto, or read from, a JTAG signal line.
pub type Level = bool;

/// Direct, cycle-level control over a TAP's four (or five, with TRST)
/// signal lines.
///
/// Implementors back this with whatever GPIO access their platform gives
/// them: raw register pokes on a microcontroller, an `embedded-hal`
/// `OutputPin`/`InputPin` pair, or — as this crate's own
/// [`fake::LoopbackPins`](crate::fake::LoopbackPins) does — a software
/// loopback for tests.
///
/// Contract: `set_*` calls are ordered (a driver must not reorder or
/// coalesce them), and [`half_clock_delay`](PinDriver::half_clock_delay)
/// blocks for at least the requested number of microseconds. Every TCK
/// pulse this crate emits is `set_tck(false) -> HC -> set_tck(true) -> HC`,
/// so that TDI is stable before the rising edge and TDO is sampled only
/// after it.
pub trait PinDriver {
    /// The error a pin operation can fail with. Wrapped into
    /// [`crate::error::Error::Pin`] wherever this trait is used.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Drive the TCK (test clock) line.
    fn set_tck(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Drive the TMS (test mode select) line.
    fn set_tms(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Drive the TDI (test data in) line.
    fn set_tdi(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Drive the optional TRST (test reset) line, if wired.
    ///
    /// The default implementation is a no-op, for boards that tie TRST
    /// high or leave it unconnected and rely on [`advance`]'s 5-cycle
    /// TMS reset sequence instead.
    ///
    /// [`advance`]: crate::controller::JtagController::advance
    fn set_trst(&mut self, _level: Level) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Whether [`set_trst`](PinDriver::set_trst) is backed by real
    /// hardware. `reset_tap` only asserts TRST when this is `true`.
    fn has_trst(&self) -> bool {
        false
    }

    /// Sample the TDO (test data out) line.
    fn read_tdo(&mut self) -> Result<Level, Self::Error>;

    /// Block for at least `delay_us` microseconds. Called twice per TCK
    /// edge (the "HC" — half clock — primitive from the original design).
    fn half_clock_delay(&mut self, delay_us: u32);
}
