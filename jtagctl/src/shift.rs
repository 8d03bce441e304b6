//! The IR/DR shift engine.
//!
//! `insert_ir`/`insert_dr` are mirror images of each other — both walk the
//! TAP into their respective `Capturex`/`Shiftx` states, clock `len` bits of
//! `*_in` onto TDI while sampling TDO into the returned buffer, then land in
//! `end_state`.

use tracing::instrument;

use crate::bits::BitBuf;
use crate::controller::JtagController;
use crate::error::{Error, Result};
use crate::pin::PinDriver;
use crate::state::TapState;

impl<P: PinDriver> JtagController<P> {
    /// Shifts `ir_in` into the Instruction Register and returns what came
    /// back out on TDO, sampled bit-for-bit alongside it.
    ///
    /// `ir_in.len()` is the IR length for this shift; it must be nonzero
    /// and no larger than [`Config::max_ir_len`](crate::config::Config::max_ir_len).
    /// `end_state` must be `RunTestIdle`, `SelectIr`, or `TestLogicReset`.
    ///
    /// Entry requires `current_state` to be `TestLogicReset` or
    /// `RunTestIdle` — the standard path this routine walks
    /// (`RunTestIdle → SelectDr → SelectIr → CaptureIr → ShiftIr`) is only
    /// legal from there.
    #[instrument(level = "debug", skip(self, ir_in))]
    pub fn insert_ir(&mut self, ir_in: &[u8], end_state: TapState) -> Result<BitBuf> {
        self.shift(
            ir_in,
            end_state,
            self.config().max_ir_len,
            ShiftTarget::Ir,
        )
    }

    /// The DR-side mirror of [`insert_ir`](Self::insert_ir). `end_state`
    /// must be `RunTestIdle`, `SelectDr`, or `TestLogicReset`.
    #[instrument(level = "debug", skip(self, dr_in))]
    pub fn insert_dr(&mut self, dr_in: &[u8], end_state: TapState) -> Result<BitBuf> {
        self.shift(
            dr_in,
            end_state,
            self.config().max_dr_len,
            ShiftTarget::Dr,
        )
    }

    fn shift(
        &mut self,
        data_in: &[u8],
        end_state: TapState,
        max_len: usize,
        target: ShiftTarget,
    ) -> Result<BitBuf> {
        let len = data_in.len();
        if len == 0 || len > max_len {
            return Err(Error::InvalidIrOrDrLen);
        }
        target.validate_end_state(end_state)?;

        self.goto(TapState::RunTestIdle)?;
        self.goto(TapState::SelectDr)?;
        if matches!(target, ShiftTarget::Ir) {
            self.advance(TapState::SelectIr)?;
        }
        self.advance(target.capture())?;
        self.advance(target.shift())?;

        let mut out = BitBuf::zeroed(len);
        for i in 0..len - 1 {
            self.pins_mut()
                .set_tdi(data_in[i] != 0)
                .map_err(Self::pin_err)?;
            self.tick(false)?;
            let tdo = self.pins_mut().read_tdo().map_err(Self::pin_err)?;
            out.set(i, tdo as u8);
        }

        let last = len - 1;
        self.pins_mut()
            .set_tdi(data_in[last] != 0)
            .map_err(Self::pin_err)?;
        self.advance(target.exit1())?;
        let tdo = self.pins_mut().read_tdo().map_err(Self::pin_err)?;
        out.set(last, tdo as u8);

        self.advance(target.update())?;
        self.goto(end_state)?;

        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftTarget {
    Ir,
    Dr,
}

impl ShiftTarget {
    fn capture(self) -> TapState {
        match self {
            ShiftTarget::Ir => TapState::CaptureIr,
            ShiftTarget::Dr => TapState::CaptureDr,
        }
    }

    fn shift(self) -> TapState {
        match self {
            ShiftTarget::Ir => TapState::ShiftIr,
            ShiftTarget::Dr => TapState::ShiftDr,
        }
    }

    fn exit1(self) -> TapState {
        match self {
            ShiftTarget::Ir => TapState::Exit1Ir,
            ShiftTarget::Dr => TapState::Exit1Dr,
        }
    }

    fn update(self) -> TapState {
        match self {
            ShiftTarget::Ir => TapState::UpdateIr,
            ShiftTarget::Dr => TapState::UpdateDr,
        }
    }

    fn own_select(self) -> TapState {
        match self {
            ShiftTarget::Ir => TapState::SelectIr,
            ShiftTarget::Dr => TapState::SelectDr,
        }
    }

    fn validate_end_state(self, end_state: TapState) -> Result<()> {
        match end_state {
            TapState::RunTestIdle | TapState::TestLogicReset => Ok(()),
            s if s == self.own_select() => Ok(()),
            _ => Err(Error::BadParameter(
                "end_state must be RunTestIdle, TestLogicReset, or the matching Select state",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fake::LoopbackPins;

    #[test]
    fn shift_length_matches_input() {
        let mut jtag = JtagController::new(LoopbackPins::new(8), Config::default());
        jtag.reset_tap().unwrap();
        let out = jtag
            .insert_ir(&[1, 0, 1, 0], TapState::RunTestIdle)
            .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn rejects_zero_length_shift() {
        let mut jtag = JtagController::new(LoopbackPins::new(8), Config::default());
        jtag.reset_tap().unwrap();
        let err = jtag.insert_ir(&[], TapState::RunTestIdle).unwrap_err();
        assert!(matches!(err, Error::InvalidIrOrDrLen));
    }

    #[test]
    fn rejects_unreachable_end_state() {
        let mut jtag = JtagController::new(LoopbackPins::new(8), Config::default());
        jtag.reset_tap().unwrap();
        let err = jtag
            .insert_ir(&[1, 0, 1, 0], TapState::ShiftDr)
            .unwrap_err();
        assert!(matches!(err, Error::BadParameter(_)));
    }
}
