//! Runtime limits for a [`JtagController`](crate::controller::JtagController).
//!
//! These mirror the compile-time constants the original firmware hard-coded
//! (`MAX_IR_LEN`, `MAX_DR_LEN`, `MAX_ALLOWED_TAPS`, `MANY_ONES`, `DELAY_US`),
//! but are bundled into one value so a host program can run more than one
//! controller — e.g. on two different pin sets — with different limits.

/// Hard capacity of the fixed-size IR bit buffer. A [`Config`] may lower the
/// effective limit with [`Config::max_ir_len`] but never raise it past this.
pub const MAX_IR_LEN: usize = 128;

/// Hard capacity of the fixed-size DR bit buffer. See [`MAX_IR_LEN`].
pub const MAX_DR_LEN: usize = 1024;

/// Hard capacity of the chain descriptor table.
pub const MAX_ALLOWED_TAPS: usize = 16;

/// Tunable limits for one [`JtagController`](crate::controller::JtagController).
///
/// `Default` reproduces the original firmware's compile-time constants
/// exactly, so existing callers that never touch `Config` observe the same
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum IR length this controller will shift, in bits.
    /// Must be `<= `[`MAX_IR_LEN`].
    pub max_ir_len: usize,
    /// Maximum DR length this controller will shift, in bits.
    /// Must be `<= `[`MAX_DR_LEN`].
    pub max_dr_len: usize,
    /// Maximum number of devices this controller's chain manager can track.
    /// Must be `<= `[`MAX_ALLOWED_TAPS`].
    pub max_allowed_taps: usize,
    /// Search ceiling for the IR-length detection trick in
    /// [`detect_chain`](crate::discovery::detect_chain). Must exceed the
    /// largest IR length ever present in a real chain driven by this
    /// controller.
    pub many_ones: u32,
    /// Half-clock-cycle delay, in microseconds, applied on every TCK edge.
    pub delay_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_ir_len: MAX_IR_LEN,
            max_dr_len: MAX_DR_LEN,
            max_allowed_taps: MAX_ALLOWED_TAPS,
            many_ones: 100,
            delay_us: 100,
        }
    }
}

impl Config {
    /// Validates that every runtime limit fits inside its compile-time
    /// buffer capacity. [`JtagController::new`](crate::controller::JtagController::new)
    /// calls this and panics on failure — a misconfigured capacity is a
    /// programmer error, not a runtime condition to recover from.
    pub(crate) fn assert_within_capacity(&self) {
        assert!(
            self.max_ir_len <= MAX_IR_LEN,
            "Config::max_ir_len ({}) exceeds compiled-in capacity MAX_IR_LEN ({MAX_IR_LEN})",
            self.max_ir_len,
        );
        assert!(
            self.max_dr_len <= MAX_DR_LEN,
            "Config::max_dr_len ({}) exceeds compiled-in capacity MAX_DR_LEN ({MAX_DR_LEN})",
            self.max_dr_len,
        );
        assert!(
            self.max_allowed_taps <= MAX_ALLOWED_TAPS,
            "Config::max_allowed_taps ({}) exceeds compiled-in capacity MAX_ALLOWED_TAPS ({MAX_ALLOWED_TAPS})",
            self.max_allowed_taps,
        );
    }
}
