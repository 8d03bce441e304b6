//! The error type shared by every public operation in this crate.

use crate::discovery::DrLenSample;
use crate::state::TapState;

/// Everything that can go wrong while driving a TAP, shifting a register, or
/// managing a chain.
///
/// Every variant is value-typed and returned through a `Result` — this crate
/// never panics or unwinds on a detected protocol or bookkeeping anomaly.
/// Whenever an operation fails the TAP is left in a safe state (usually
/// [`TapState::RunTestIdle`], or forced through [`reset_tap`] on a wire-level
/// failure) rather than mid-sequence.
///
/// [`reset_tap`]: crate::controller::JtagController::reset_tap
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// [`advance`] was asked to move to a state that is not a legal neighbour
    /// of the current one. No TCK edge is emitted.
    ///
    /// [`advance`]: crate::controller::JtagController::advance
    #[error("cannot advance from {from:?} to {to:?}: not a reachable TAP state")]
    BadTapState {
        /// The state the TAP was actually in.
        from: TapState,
        /// The state that was requested.
        to: TapState,
    },

    /// The IDCODE captured by [`detect_chain`] has its LSB clear, which
    /// IEEE 1149.1 §8 forbids for a valid IDCODE.
    ///
    /// [`detect_chain`]: crate::discovery::detect_chain
    #[error("captured IDCODE {0:#010x} has LSB = 0, not a valid IDCODE")]
    BadIdcode(u32),

    /// The IR-length search in [`detect_chain`] never saw its injected zero
    /// bit reappear on TDO within the configured search ceiling, or a
    /// requested register length exceeds its buffer's capacity.
    ///
    /// [`detect_chain`]: crate::discovery::detect_chain
    #[error("could not determine IR/DR length within the configured search ceiling")]
    InvalidIrOrDrLen,

    /// A chain index or IR slot index fell outside its valid range.
    #[error("index {index} is out of bounds (limit {limit})")]
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// The exclusive upper bound the index was checked against.
        limit: usize,
    },

    /// `add`/`activate`/`remove` targeted a slot that is already active.
    #[error("TAP device {0} is already active")]
    TapDeviceAlreadyActive(usize),

    /// `selector`/`activate` targeted a slot that is inactive, or `add`
    /// tried to append past a hole in the table.
    #[error("TAP device {0} is not available for this operation")]
    TapDeviceUnavailable(usize),

    /// Activating this device would push the chain's total IR length past
    /// its configured capacity.
    #[error("activating this device would grow the chain IR past its {limit}-bit capacity")]
    ResourceExhausted {
        /// The chain's configured IR capacity, in bits.
        limit: usize,
    },

    /// A non-append insertion into the chain table, or another malformed
    /// argument.
    #[error("bad parameter: {0}")]
    BadParameter(&'static str),

    /// A data register read back as all zeros across the whole search
    /// range, suggesting TDO is stuck low. Reserved for callers layering
    /// additional sanity checks on top of [`discovery`] — none of the
    /// procedures in this crate raise it on their own, since a DR that is
    /// legitimately all zero is indistinguishable from a stuck pin without
    /// extra context the core does not have.
    ///
    /// [`discovery`]: crate::discovery::discovery
    #[error("TDO appears stuck at 0")]
    TdoStuckAt0,

    /// [`discovery`] found an instruction whose reported DR length is
    /// exactly the configured maximum, which this crate treats as TDO never
    /// having dropped to 0 — i.e. stuck at 1 — rather than a real register
    /// that size.
    ///
    /// [`discovery`]: crate::discovery::discovery
    #[error("TDO appears stuck at 1 ({} instruction(s) scanned before the fault)", collected.len())]
    TdoStuckAt1 {
        /// Every `(instruction, dr_len)` pair collected before the fault was
        /// detected, so a caller with no `tracing` subscriber installed
        /// still gets the partial scan back.
        collected: Vec<DrLenSample>,
    },

    /// The pin driver itself reported a failure (e.g. a real GPIO write
    /// error on a microcontroller HAL). The original Arduino
    /// `digitalWrite`/`digitalRead` calls this crate is modeled on cannot
    /// fail, but any realistic [`PinDriver`](crate::pin::PinDriver) can.
    #[error("pin driver error")]
    Pin(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
