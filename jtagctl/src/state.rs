//! The 16-state IEEE 1149.1 TAP state diagram.

/// One of the sixteen states of the JTAG TAP state machine.
///
/// Three of these (`TestLogicReset`, `RunTestIdle`, `ShiftDr`, `ShiftIr`,
/// `PauseDr`, `PauseIr`) have a self-loop in the standard's state diagram —
/// that is required to actually spend more than one TCK cycle shifting or
/// idling, and [`transition_tms`](TapState::transition_tms) treats it like
/// any other legal edge rather than special-casing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapState {
    /// Default Mealy state asserted by a power-on or TRST reset.
    TestLogicReset,
    /// Idle state outside of any register shift.
    RunTestIdle,
    /// Entry point to the DR column.
    SelectDr,
    /// DR shift register latches its parallel inputs.
    CaptureDr,
    /// DR bits shift between TDI and TDO, one per TCK.
    ShiftDr,
    /// First exit from `ShiftDr`.
    Exit1Dr,
    /// DR shifting is paused; TCK no longer advances the register.
    PauseDr,
    /// Second exit from `ShiftDr`, reached via `PauseDr`.
    Exit2Dr,
    /// DR shift register is latched into the device's update register.
    UpdateDr,
    /// Entry point to the IR column.
    SelectIr,
    /// IR shift register latches its parallel inputs.
    CaptureIr,
    /// IR bits shift between TDI and TDO, one per TCK.
    ShiftIr,
    /// First exit from `ShiftIr`.
    Exit1Ir,
    /// IR shifting is paused; TCK no longer advances the register.
    PauseIr,
    /// Second exit from `ShiftIr`, reached via `PauseIr`.
    Exit2Ir,
    /// IR shift register is latched into the device's instruction register.
    UpdateIr,
}

impl TapState {
    /// The state reached from `self` when TMS=0 on the next TCK edge.
    pub const fn tms0_successor(self) -> TapState {
        match self {
            TapState::TestLogicReset => TapState::RunTestIdle,
            TapState::RunTestIdle => TapState::RunTestIdle,
            TapState::SelectDr => TapState::CaptureDr,
            TapState::CaptureDr => TapState::ShiftDr,
            TapState::ShiftDr => TapState::ShiftDr,
            TapState::Exit1Dr => TapState::PauseDr,
            TapState::PauseDr => TapState::PauseDr,
            TapState::Exit2Dr => TapState::ShiftDr,
            TapState::UpdateDr => TapState::RunTestIdle,
            TapState::SelectIr => TapState::CaptureIr,
            TapState::CaptureIr => TapState::ShiftIr,
            TapState::ShiftIr => TapState::ShiftIr,
            TapState::Exit1Ir => TapState::PauseIr,
            TapState::PauseIr => TapState::PauseIr,
            TapState::Exit2Ir => TapState::ShiftIr,
            TapState::UpdateIr => TapState::RunTestIdle,
        }
    }

    /// The state reached from `self` when TMS=1 on the next TCK edge.
    pub const fn tms1_successor(self) -> TapState {
        match self {
            TapState::TestLogicReset => TapState::TestLogicReset,
            TapState::RunTestIdle => TapState::SelectDr,
            TapState::SelectDr => TapState::SelectIr,
            TapState::CaptureDr => TapState::Exit1Dr,
            TapState::ShiftDr => TapState::Exit1Dr,
            TapState::Exit1Dr => TapState::UpdateDr,
            TapState::PauseDr => TapState::Exit2Dr,
            TapState::Exit2Dr => TapState::UpdateDr,
            TapState::UpdateDr => TapState::SelectDr,
            TapState::SelectIr => TapState::TestLogicReset,
            TapState::CaptureIr => TapState::Exit1Ir,
            TapState::ShiftIr => TapState::Exit1Ir,
            TapState::Exit1Ir => TapState::UpdateIr,
            TapState::PauseIr => TapState::Exit2Ir,
            TapState::Exit2Ir => TapState::UpdateIr,
            TapState::UpdateIr => TapState::SelectDr,
        }
    }

    /// The TMS level that must be driven on the next TCK edge to reach
    /// `to` from `self`, or `None` if `to` is not a legal neighbour
    /// (including self) of `self`.
    ///
    /// Self-loops fall out of this naturally: e.g. `ShiftDr.transition_tms
    /// (ShiftDr)` returns `Some(false)` because `tms0_successor` of
    /// `ShiftDr` is `ShiftDr` itself.
    pub fn transition_tms(self, to: TapState) -> Option<bool> {
        if self.tms0_successor() == to {
            Some(false)
        } else if self.tms1_successor() == to {
            Some(true)
        } else {
            None
        }
    }

    /// All sixteen states, for traversals that need to visit every one.
    const ALL: [TapState; 16] = [
        TapState::TestLogicReset,
        TapState::RunTestIdle,
        TapState::SelectDr,
        TapState::CaptureDr,
        TapState::ShiftDr,
        TapState::Exit1Dr,
        TapState::PauseDr,
        TapState::Exit2Dr,
        TapState::UpdateDr,
        TapState::SelectIr,
        TapState::CaptureIr,
        TapState::ShiftIr,
        TapState::Exit1Ir,
        TapState::PauseIr,
        TapState::Exit2Ir,
        TapState::UpdateIr,
    ];

    /// The sequence of TMS levels that walks from `self` to `to` in as few
    /// TCK edges as possible, found by breadth-first search over the state
    /// diagram. Empty if `self == to`.
    pub(crate) fn shortest_path(self, to: TapState) -> Vec<bool> {
        use std::collections::VecDeque;

        if self == to {
            return Vec::new();
        }

        // back[state] = (predecessor, tms edge taken to reach `state`)
        let mut back: [Option<(TapState, bool)>; 16] = [None; 16];
        let index = |s: TapState| Self::ALL.iter().position(|&x| x == s).unwrap();

        let mut queue = VecDeque::new();
        queue.push_back(self);
        let mut visited = [false; 16];
        visited[index(self)] = true;

        while let Some(state) = queue.pop_front() {
            if state == to {
                break;
            }
            for (next, tms) in [(state.tms0_successor(), false), (state.tms1_successor(), true)] {
                if !visited[index(next)] {
                    visited[index(next)] = true;
                    back[index(next)] = Some((state, tms));
                    queue.push_back(next);
                }
            }
        }

        let mut path = Vec::new();
        let mut cur = to;
        while cur != self {
            let (prev, tms) = back[index(cur)].expect("state diagram is strongly connected");
            path.push(tms);
            cur = prev;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_reaches_every_other_state() {
        for &from in TapState::ALL.iter() {
            for &to in TapState::ALL.iter() {
                let path = from.shortest_path(to);
                if from == to {
                    assert!(path.is_empty());
                    continue;
                }
                let mut cur = from;
                for tms in path {
                    cur = if tms { cur.tms1_successor() } else { cur.tms0_successor() };
                }
                assert_eq!(cur, to, "no path found from {from:?} to {to:?}");
            }
        }
    }

    #[test]
    fn transition_tms_matches_successor_tables() {
        for &s in TapState::ALL.iter() {
            assert_eq!(s.transition_tms(s.tms0_successor()), Some(false));
            assert_eq!(s.transition_tms(s.tms1_successor()), Some(true));
        }
    }

    #[test]
    fn transition_tms_rejects_non_neighbours() {
        // SHIFT_DR's only neighbours are itself (TMS=0) and EXIT1_DR (TMS=1).
        assert_eq!(TapState::ShiftDr.transition_tms(TapState::ShiftIr), None);
    }

    #[test]
    fn self_loops_are_legal_where_the_diagram_says_so() {
        for &s in &[
            TapState::TestLogicReset,
            TapState::RunTestIdle,
            TapState::ShiftDr,
            TapState::ShiftIr,
            TapState::PauseDr,
            TapState::PauseIr,
        ] {
            assert_eq!(s.transition_tms(s), Some(false));
        }
    }
}
