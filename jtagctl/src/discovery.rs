//! Boundary-scan discovery: IDCODE + IR length, per-instruction DR length,
//! and the brute-force instruction sweep that maps out an unknown chain.

use tracing::{info, instrument, warn};

use crate::bits::{bits_to_u32, BitBuf};
use crate::controller::JtagController;
use crate::error::{Error, Result};
use crate::pin::PinDriver;
use crate::state::TapState;

/// What [`detect_chain`](JtagController::detect_chain) found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// Concatenated IR length currently addressed, in bits.
    pub ir_len: usize,
    /// The 32-bit IDCODE captured immediately after reset.
    pub idcode: u32,
}

/// One `(instruction, dr_len)` observation from
/// [`discovery`](JtagController::discovery).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrLenSample {
    /// The instruction value that was shifted into IR.
    pub instruction: u32,
    /// The DR length reported for that instruction.
    pub dr_len: u32,
}

impl<P: PinDriver> JtagController<P> {
    /// Resets the TAP and reads back its default IDCODE and IR length.
    ///
    /// Assumes the TAP's default instruction after reset is IDCODE (rather
    /// than BYPASS) — IEEE 1149.1 permits either, but IDCODE is both the
    /// far more common default and the only one from which this routine can
    /// recover a meaningful identifier. A device that defaults to BYPASS
    /// will still yield a usable `ir_len`, just with `idcode` equal to
    /// whatever bit pattern BYPASS's neighbouring DR happens to shift out.
    #[instrument(level = "info", skip(self))]
    pub fn detect_chain(&mut self) -> Result<ChainInfo> {
        self.reset_tap()?;
        let zeros = BitBuf::zeroed(32);
        let captured = self.insert_dr(zeros.as_slice(), TapState::RunTestIdle)?;
        let idcode = bits_to_u32(captured.as_slice());
        if idcode & 1 == 0 {
            return Err(Error::BadIdcode(idcode));
        }

        self.reset_tap()?;
        let ir_len = self.count_ir_len()?;

        info!(ir_len, idcode = format_args!("{idcode:#010x}"), "chain detected");
        Ok(ChainInfo { ir_len, idcode })
    }

    /// The IR-length-detection trick: flush the IR with ones, inject a
    /// single zero, then count TCK cycles until that zero reappears on
    /// TDO. Stays in `ShiftIr` throughout — a pure self-loop walk, no
    /// `goto`/`advance` calls once it gets there.
    fn count_ir_len(&mut self) -> Result<usize> {
        let many_ones = self.config().many_ones;
        self.goto(TapState::RunTestIdle)?;
        self.goto(TapState::SelectDr)?;
        self.advance(TapState::SelectIr)?;
        self.advance(TapState::CaptureIr)?;
        self.advance(TapState::ShiftIr)?;

        for _ in 0..many_ones {
            self.shift_ir_bit(true)?;
        }
        self.shift_ir_bit(false)?;

        for count in 1..=many_ones {
            let tdo = self.shift_ir_bit(true)?;
            if !tdo {
                return Ok(count as usize);
            }
        }
        Err(Error::InvalidIrOrDrLen)
    }

    /// Clocks one bit into IR while remaining in `ShiftIr` (TMS=0) and
    /// returns the TDO sample taken on the same edge.
    fn shift_ir_bit(&mut self, tdi: bool) -> Result<bool> {
        self.pins_mut().set_tdi(tdi).map_err(Self::pin_err)?;
        self.tick(false)?;
        self.pins_mut().read_tdo().map_err(Self::pin_err)
    }

    /// Clocks one bit into DR while remaining in `ShiftDr` (TMS=0) and
    /// returns the TDO sample taken on the same edge.
    fn shift_dr_bit(&mut self, tdi: bool) -> Result<bool> {
        self.pins_mut().set_tdi(tdi).map_err(Self::pin_err)?;
        self.tick(false)?;
        self.pins_mut().read_tdo().map_err(Self::pin_err)
    }

    /// Measures the DR length associated with `instruction`.
    ///
    /// Requires `current_state == TestLogicReset` on entry. Shifts
    /// `instruction` into IR, idles `process_ticks` cycles to let the
    /// target latch the new instruction, then runs the same flush/inject/
    /// count trick as [`count_ir_len`](Self::count_ir_len) against DR.
    /// Returns `Ok(0)` rather than an error if the injected zero never
    /// reappears within [`Config::max_dr_len`](crate::config::Config::max_dr_len)
    /// further cycles — a TAP with no DR behind this instruction (e.g.
    /// BYPASS's neighbour in a single-bit DR still counts as 1, but some
    /// instructions genuinely have no addressable DR) is a valid outcome,
    /// not a fault.
    #[instrument(level = "debug", skip(self, instruction))]
    pub fn detect_dr_len(&mut self, instruction: &[u8], process_ticks: u32) -> Result<u32> {
        if self.current_state() != TapState::TestLogicReset {
            return Err(Error::BadParameter(
                "detect_dr_len requires current_state == TestLogicReset on entry",
            ));
        }

        self.insert_ir(instruction, TapState::RunTestIdle)?;
        for _ in 0..process_ticks {
            self.tick(false)?;
        }

        let max_dr_len = self.config().max_dr_len as u32;
        self.goto(TapState::SelectDr)?;
        self.advance(TapState::CaptureDr)?;
        self.advance(TapState::ShiftDr)?;

        for _ in 0..max_dr_len {
            self.shift_dr_bit(true)?;
        }
        self.shift_dr_bit(false)?;

        for count in 1..=max_dr_len {
            let tdo = self.shift_dr_bit(true)?;
            if !tdo {
                self.goto(TapState::RunTestIdle)?;
                return Ok(count);
            }
        }
        self.goto(TapState::RunTestIdle)?;
        Ok(0)
    }

    /// Sweeps every instruction in `first..=last`, resetting the TAP
    /// between iterations, and reports the `(instruction, dr_len)` pairs it
    /// observes. Each pair is logged at `tracing::info` as it is collected.
    ///
    /// Aborts with [`Error::TdoStuckAt1`] — carrying every pair collected
    /// so far — the moment a reported `dr_len` equals `max_dr_len` exactly,
    /// since that is indistinguishable from TDO never dropping to 0 at all.
    #[instrument(level = "info", skip(self))]
    pub fn discovery(
        &mut self,
        first: u32,
        last: u32,
        max_dr_len: u32,
        ir_len: usize,
        process_ticks: u32,
    ) -> Result<Vec<DrLenSample>> {
        let mut samples = Vec::new();
        for instruction in first..=last {
            self.reset_tap()?;
            let ir_in = crate::bits::u32_to_bits(instruction, ir_len);
            match self.detect_dr_len(ir_in.as_slice(), process_ticks) {
                Ok(dr_len) => {
                    info!(instruction = format_args!("{instruction:#x}"), dr_len, "sampled");
                    if dr_len == max_dr_len {
                        warn!(instruction = format_args!("{instruction:#x}"), "TDO appears stuck at 1");
                        return Err(Error::TdoStuckAt1 { collected: samples });
                    }
                    samples.push(DrLenSample { instruction, dr_len });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fake::LoopbackPins;

    #[test]
    fn detect_chain_rejects_idcode_with_lsb_clear() {
        let mut jtag = JtagController::new(
            LoopbackPins::with_ir_and_idcode(4, 0xDEAD_BEE0),
            Config::default(),
        );
        let err = jtag.detect_chain().unwrap_err();
        assert!(matches!(err, Error::BadIdcode(0xDEAD_BEE0)));
    }

    #[test]
    fn detect_chain_accepts_valid_idcode() {
        let mut jtag = JtagController::new(
            LoopbackPins::with_ir_and_idcode(4, 0x4BA0_0477),
            Config::default(),
        );
        let info = jtag.detect_chain().unwrap();
        assert_eq!(info.idcode, 0x4BA0_0477);
        assert_eq!(info.ir_len, 4);
    }
}
