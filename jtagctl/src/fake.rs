//! Software pin drivers for exercising this crate without real hardware.
//!
//! Everything in this crate funnels hardware access through [`PinDriver`],
//! so a fake implementation of that trait turns the whole controller into
//! something unit-testable — no target, no GPIO, no `embedded-hal`. This
//! module is not behind a feature gate: it is small, has no external
//! dependencies of its own, and every sibling crate in this lineage keeps
//! its own hand-written `Fake*` test doubles alongside the code they
//! exercise rather than reaching for a mocking framework.

use std::convert::Infallible;

use crate::pin::{Level, PinDriver};
use crate::state::TapState;

/// A pin driver that ties TDI straight to TDO, optionally behind a
/// simulated shift register of fixed length.
///
/// With `ir_len == 0` (see [`LoopbackPins::new`]), TDO mirrors whatever was
/// last written to TDI on the same clock — enough to make
/// `insert_dr(buf, ..) == buf` hold for round-trip tests. With a nonzero
/// `ir_len`, TDI is instead shifted through an internal ring buffer of that
/// width while the TAP sits in `ShiftIr`, modelling a real IR of known
/// length for [`JtagController::detect_chain`](crate::controller::JtagController)
/// to measure.
pub struct LoopbackPins {
    tck: Level,
    tms: Level,
    tdi: Level,
    trst: Level,
    /// What `read_tdo` returns right now.
    tdo: Level,
    /// Simulated IR shift register, MSB at the front (shifts right, TDO
    /// emerges from the back). Empty means plain TDI-to-TDO loopback.
    ir_shift: Vec<Level>,
    /// Fixed 32-bit DR contents returned by a DR shift from reset, LSB
    /// first (bit 0 is shifted out first).
    dr_idcode: u32,
    /// Whether `dr_idcode` should be shifted out of DR at all, vs. falling
    /// through to plain TDI→TDO loopback.
    simulate_dr: bool,
    dr_bit: usize,
    tap_state: TapState,
}

impl LoopbackPins {
    /// A driver with a plain TDI→TDO loopback and no simulated IR/IDCODE —
    /// good enough for shift-length and round-trip tests that do not care
    /// about discovery.
    pub fn new(_unused_ir_len: usize) -> Self {
        Self {
            tck: false,
            tms: false,
            tdi: false,
            trst: true,
            tdo: false,
            ir_shift: Vec::new(),
            dr_idcode: 0,
            simulate_dr: false,
            dr_bit: 0,
            tap_state: TapState::TestLogicReset,
        }
    }

    /// A driver that simulates an IR of length `ir_len` (preloaded with
    /// ones, as real IRs power up) and a fixed IDCODE shifted out of DR.
    pub fn with_ir_and_idcode(ir_len: usize, idcode: u32) -> Self {
        Self {
            ir_shift: vec![true; ir_len],
            dr_idcode: idcode,
            simulate_dr: true,
            ..Self::new(0)
        }
    }

    /// Whether the last `set_trst(false)` has not yet been followed by
    /// `set_trst(true)` — exposed for tests that want to confirm
    /// `reset_tap` pulses TRST.
    pub fn trst_level(&self) -> Level {
        self.trst
    }
}

impl PinDriver for LoopbackPins {
    type Error = Infallible;

    fn set_tck(&mut self, level: Level) -> Result<(), Self::Error> {
        let rising = !self.tck && level;
        self.tck = level;
        if rising {
            self.clock_edge();
        }
        Ok(())
    }

    fn set_tms(&mut self, level: Level) -> Result<(), Self::Error> {
        self.tms = level;
        Ok(())
    }

    fn set_tdi(&mut self, level: Level) -> Result<(), Self::Error> {
        self.tdi = level;
        Ok(())
    }

    fn set_trst(&mut self, level: Level) -> Result<(), Self::Error> {
        self.trst = level;
        Ok(())
    }

    fn has_trst(&self) -> bool {
        true
    }

    fn read_tdo(&mut self) -> Result<Level, Self::Error> {
        Ok(self.tdo)
    }

    fn half_clock_delay(&mut self, _delay_us: u32) {
        // Instant in tests — no real wire to settle.
    }
}

impl LoopbackPins {
    /// Applies one rising TCK edge's worth of state update: advances the
    /// tracked TAP state per TMS, and updates whatever `tdo` will read back
    /// on the next sample.
    fn clock_edge(&mut self) {
        self.tap_state = if self.tms {
            self.tap_state.tms1_successor()
        } else {
            self.tap_state.tms0_successor()
        };

        match self.tap_state {
            TapState::ShiftIr if !self.ir_shift.is_empty() => {
                let out = self.ir_shift.remove(0);
                self.ir_shift.push(self.tdi);
                self.tdo = out;
            }
            TapState::ShiftDr if self.simulate_dr => {
                self.tdo = (self.dr_idcode >> self.dr_bit) & 1 != 0;
                self.dr_bit += 1;
            }
            _ => {
                self.tdo = self.tdi;
                self.dr_bit = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::controller::JtagController;

    #[test]
    fn plain_loopback_mirrors_tdi_to_tdo() {
        let mut jtag = JtagController::new(LoopbackPins::new(0), Config::default());
        jtag.reset_tap().unwrap();
        let out = jtag
            .insert_dr(&[1, 0, 1, 1, 0], TapState::RunTestIdle)
            .unwrap();
        assert_eq!(out.as_slice(), &[1, 0, 1, 1, 0]);
    }

    #[test]
    fn simulated_idcode_round_trips() {
        let mut jtag = JtagController::new(
            LoopbackPins::with_ir_and_idcode(4, 0x4BA0_0477),
            Config::default(),
        );
        let info = jtag.detect_chain().unwrap();
        assert_eq!(info.idcode, 0x4BA0_0477);
        assert_eq!(info.ir_len, 4);
    }
}
