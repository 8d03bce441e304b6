//! Owns the TAP state machine and the pins that drive it.

use tracing::{debug, instrument, trace};

use crate::chain::ChainTable;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pin::PinDriver;
use crate::state::TapState;

/// A bit-banged IEEE 1149.1 TAP controller.
///
/// Bundles everything that used to live in a handful of file-scope globals
/// in the original firmware — the pin set, the tunable [`Config`], the
/// current [`TapState`], and the chain descriptor table — into one value,
/// so a host process can run several independent controllers (e.g. one per
/// target board) without them stepping on each other's state.
pub struct JtagController<P: PinDriver> {
    pins: P,
    config: Config,
    state: TapState,
    pub(crate) chain: ChainTable,
}

impl<P: PinDriver> JtagController<P> {
    /// Builds a controller over `pins` with the given `config`.
    ///
    /// The TAP is left in whatever state the hardware powered up in —
    /// call [`reset_tap`](Self::reset_tap) before relying on
    /// [`current_state`](Self::current_state) meaning anything.
    ///
    /// # Panics
    ///
    /// Panics if `config`'s limits exceed this crate's compiled-in buffer
    /// capacities. See [`Config::assert_within_capacity`].
    pub fn new(pins: P, config: Config) -> Self {
        config.assert_within_capacity();
        Self {
            pins,
            chain: ChainTable::new(config.max_allowed_taps),
            config,
            state: TapState::TestLogicReset,
        }
    }

    /// The controller's tunable limits.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The TAP state machine's current state, as last observed by this
    /// controller. Since every transition in this crate goes through
    /// [`advance`](Self::advance), this is always accurate — the TAP never
    /// moves except in response to a TCK edge this controller drove.
    pub fn current_state(&self) -> TapState {
        self.state
    }

    /// Mutable access to the underlying pins, for callers that need to
    /// drive a line this crate doesn't otherwise expose (e.g. a board
    /// power rail).
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    pub(crate) fn pin_err(err: P::Error) -> Error {
        Error::Pin(Box::new(err))
    }

    /// One TCK pulse: TCK low, half-clock delay, TCK high, half-clock
    /// delay. TMS and TDI must already be stable on the line before this
    /// is called.
    fn pulse_tck(&mut self) -> Result<()> {
        let delay = self.config.delay_us;
        self.pins.set_tck(false).map_err(Self::pin_err)?;
        self.pins.half_clock_delay(delay);
        self.pins.set_tck(true).map_err(Self::pin_err)?;
        self.pins.half_clock_delay(delay);
        Ok(())
    }

    /// Drives one TCK edge with TMS held at `tms`, and updates
    /// [`current_state`](Self::current_state) accordingly.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn tick(&mut self, tms: bool) -> Result<()> {
        self.pins.set_tms(tms).map_err(Self::pin_err)?;
        self.pulse_tck()?;
        self.state = if tms {
            self.state.tms1_successor()
        } else {
            self.state.tms0_successor()
        };
        trace!(?self.state, tms, "tap advanced");
        Ok(())
    }

    /// Moves the TAP one edge: drives TMS to whichever level reaches `to`
    /// from the current state, then pulses TCK. `to` must be a direct
    /// neighbour of [`current_state`](Self::current_state) — one of its two
    /// TMS-selectable successors, or `current_state` itself when that state
    /// has a self-loop. Anything else fails with [`Error::BadTapState`] and
    /// no TCK edge is emitted.
    ///
    /// Reaching a state more than one edge away (e.g. `TestLogicReset` from
    /// `ShiftDr`) takes repeated calls to `advance`, one per hop — this
    /// crate's own shift engine and discovery routines do exactly that
    /// internally via [`goto`](Self::goto).
    #[instrument(level = "debug", skip(self))]
    pub fn advance(&mut self, to: TapState) -> Result<()> {
        match self.state.transition_tms(to) {
            Some(tms) => self.tick(tms),
            None => Err(Error::BadTapState {
                from: self.state,
                to,
            }),
        }
    }

    /// Walks the TAP to `to` via the shortest sequence of legal edges,
    /// computed by breadth-first search over the 16-state diagram — the
    /// graph is small and strongly connected (every state reaches
    /// `TestLogicReset` within 5 TMS=1 edges, and `TestLogicReset` reaches
    /// every other state), so a path always exists.
    pub(crate) fn goto(&mut self, to: TapState) -> Result<()> {
        for tms in self.state.shortest_path(to) {
            self.tick(tms)?;
        }
        Ok(())
    }

    /// Forces the TAP into `TestLogicReset`.
    ///
    /// Drives TRST low and back high if the pin driver reports
    /// [`PinDriver::has_trst`], then always performs the standard 5-edge
    /// TMS=1 sequence regardless — any state reaches `TestLogicReset`
    /// within 5 TMS=1 edges, and relying on that alone keeps this correct
    /// even on boards with TRST tied off.
    #[instrument(level = "debug", skip(self))]
    pub fn reset_tap(&mut self) -> Result<()> {
        if self.pins.has_trst() {
            self.pins.set_trst(false).map_err(Self::pin_err)?;
            self.pins.half_clock_delay(self.config.delay_us);
            self.pins.set_trst(true).map_err(Self::pin_err)?;
            self.pins.half_clock_delay(self.config.delay_us);
        }
        for _ in 0..5 {
            self.tick(true)?;
        }
        debug!(?self.state, "tap reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fake::LoopbackPins;
    use crate::state::TapState::*;

    #[test]
    fn advance_rejects_unreachable_neighbour() {
        let mut jtag = JtagController::new(LoopbackPins::new(0), Config::default());
        jtag.reset_tap().unwrap();
        jtag.advance(RunTestIdle).unwrap();
        jtag.advance(SelectDr).unwrap();
        jtag.advance(CaptureDr).unwrap();
        jtag.advance(ShiftDr).unwrap();

        let err = jtag.advance(ShiftIr).unwrap_err();
        assert!(matches!(err, Error::BadTapState { from: ShiftDr, to: ShiftIr }));
        // A rejected advance must not have moved the TAP.
        assert_eq!(jtag.current_state(), ShiftDr);
    }

    #[test]
    fn reset_tap_converges_from_every_state() {
        for &start in &[
            TestLogicReset, RunTestIdle, SelectDr, CaptureDr, ShiftDr, Exit1Dr, PauseDr,
            Exit2Dr, UpdateDr, SelectIr, CaptureIr, ShiftIr, Exit1Ir, PauseIr, Exit2Ir, UpdateIr,
        ] {
            let mut jtag = JtagController::new(LoopbackPins::new(0), Config::default());
            jtag.goto(start).unwrap();
            assert_eq!(jtag.current_state(), start);
            jtag.reset_tap().unwrap();
            assert_eq!(jtag.current_state(), TestLogicReset);
        }
    }

    #[test]
    fn advance_self_loop_holds_state() {
        let mut jtag = JtagController::new(LoopbackPins::new(0), Config::default());
        jtag.reset_tap().unwrap();
        jtag.advance(RunTestIdle).unwrap();
        jtag.advance(RunTestIdle).unwrap();
        assert_eq!(jtag.current_state(), RunTestIdle);
    }
}
