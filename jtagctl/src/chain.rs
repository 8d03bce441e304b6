//! Bookkeeping for devices concatenated on a single JTAG scan path.
//!
//! The JTAG chain concatenates each device's IR end-to-end; BYPASS is the
//! universal "all ones" instruction. To address a specific device for a
//! real operation, every other device is set to BYPASS while the target
//! receives its real instruction at its own slot — see
//! [`JtagController::selector`](crate::controller::JtagController::selector).
//! The slot indices this module hands out let callers write directly into
//! the right bit window of an IR payload.
//!
//! Both the populated slots and the active descriptors form contiguous
//! prefixes of the table, tracked independently: `add` only appends at the
//! populated prefix (devices are typically all added before any of them are
//! activated), `activate`/`deactivate` only push/pop the tail of the active
//! prefix. A free-index variant that let callers pass arbitrary
//! `ir_in_idx`/`ir_out_idx` existed in the system this crate is modeled on
//! and was judged a bug — the BYPASS bit math in
//! [`JtagController::selector`](crate::controller::JtagController::selector)
//! depends on contiguity holding.

use crate::bits::BitBuf;
use crate::config::MAX_ALLOWED_TAPS;
use crate::controller::JtagController;
use crate::error::{Error, Result};
use crate::pin::PinDriver;
use crate::state::TapState;

/// A short, printable device name, stored inline rather than heap-allocated.
#[derive(Clone, Copy)]
pub struct TapName {
    bytes: [u8; 32],
    len: u8,
}

impl TapName {
    /// Builds a name from `s`, silently truncating anything past 32 bytes.
    pub fn new(s: &str) -> Self {
        let mut bytes = [0u8; 32];
        let n = s.len().min(bytes.len());
        bytes[..n].copy_from_slice(&s.as_bytes()[..n]);
        Self { bytes, len: n as u8 }
    }

    /// The name as a string slice. Truncation that lands inside a
    /// multi-byte UTF-8 sequence degrades to an empty string rather than
    /// panicking.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl Default for TapName {
    fn default() -> Self {
        Self::new("")
    }
}

impl core::fmt::Debug for TapName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device's entry in the chain table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapDescriptor {
    /// Printable identifier, purely informational.
    pub name: TapName,
    /// 32-bit device identification code, as last read by discovery or
    /// supplied by the caller.
    pub idcode: u32,
    /// Length in bits of this device's Instruction Register.
    pub ir_len: usize,
    /// Inclusive bit offset of this device's IR slice within the
    /// concatenated chain IR. Only meaningful while `active`.
    pub ir_in_idx: usize,
    /// Inclusive bit offset of the last bit of this device's IR slice.
    /// `ir_out_idx == ir_in_idx + ir_len - 1`. Only meaningful while
    /// `active`.
    pub ir_out_idx: usize,
    /// Whether this descriptor currently participates in the chain's IR
    /// layout.
    pub active: bool,
}

/// A handle to a device returned by
/// [`JtagController::selector`](crate::controller::JtagController::selector),
/// standing in for what the original design passed back as a raw pointer
/// into the descriptor table (a use-after-free and aliasing hazard this
/// crate avoids by handing back a plain, copyable index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHandle {
    /// The chain slot this handle refers to.
    pub index: usize,
    /// The device's IDCODE, copied at selection time.
    pub idcode: u32,
    /// The device's IR length, copied at selection time.
    pub ir_len: usize,
}

/// A fixed-capacity, ordered table of [`TapDescriptor`]s plus the two
/// counters derived from it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChainTable {
    taps: [TapDescriptor; MAX_ALLOWED_TAPS],
    capacity: usize,
    /// Number of slots populated via `add`, counted as a contiguous prefix
    /// from index 0. Distinct from `active_devices`: a slot can be added
    /// (and so count here) well before it is activated — see the two-device
    /// scenario in `add`'s own doc comment.
    populated: usize,
    active_devices: usize,
    total_ir_len: usize,
}

impl ChainTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            taps: [TapDescriptor::default(); MAX_ALLOWED_TAPS],
            capacity,
            populated: 0,
            active_devices: 0,
            total_ir_len: 0,
        }
    }

    /// Zeroes every descriptor and resets both counters.
    pub(crate) fn init(&mut self) {
        *self = Self::new(self.capacity);
    }

    pub(crate) fn active_devices(&self) -> usize {
        self.active_devices
    }

    pub(crate) fn total_ir_len(&self) -> usize {
        self.total_ir_len
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.capacity {
            return Err(Error::OutOfBounds {
                index,
                limit: self.capacity,
            });
        }
        Ok(())
    }

    pub(crate) fn descriptor(&self, index: usize) -> Result<TapDescriptor> {
        self.check_index(index)?;
        Ok(self.taps[index])
    }

    pub(crate) fn add(
        &mut self,
        index: usize,
        name: &str,
        idcode: u32,
        ir_len: usize,
        max_ir_len: usize,
    ) -> Result<()> {
        self.check_index(index)?;
        if self.taps[index].active {
            return Err(Error::TapDeviceAlreadyActive(index));
        }
        if ir_len == 0 || ir_len > max_ir_len {
            return Err(Error::InvalidIrOrDrLen);
        }
        // Append-only: `index` may re-populate any already-populated (and
        // inactive, checked above) slot, or extend the populated prefix by
        // exactly one. This is independent of `active_devices` — devices are
        // typically all added before any of them are activated.
        if index > self.populated {
            return Err(Error::BadParameter(
                "add() must append immediately after the populated prefix",
            ));
        }
        self.taps[index] = TapDescriptor {
            name: TapName::new(name),
            idcode,
            ir_len,
            ir_in_idx: 0,
            ir_out_idx: 0,
            active: false,
        };
        if index == self.populated {
            self.populated += 1;
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if self.taps[index].active {
            return Err(Error::TapDeviceAlreadyActive(index));
        }
        if self.populated > 0 && index == self.populated - 1 {
            self.populated -= 1;
        }
        self.taps[index] = TapDescriptor::default();
        Ok(())
    }

    pub(crate) fn activate(&mut self, index: usize, max_ir_len: usize) -> Result<()> {
        self.check_index(index)?;
        if self.taps[index].active {
            return Err(Error::TapDeviceAlreadyActive(index));
        }
        if self.taps[index].ir_len == 0 {
            // Never populated via `add` — activating it would assign it a
            // zero-width IR slot and silently corrupt the slot arithmetic
            // for every device after it.
            return Err(Error::TapDeviceUnavailable(index));
        }
        if index != self.active_devices {
            // Activation order must equal physical-chain order; skipping
            // ahead would leave a hole in the active prefix.
            return Err(Error::TapDeviceUnavailable(index));
        }

        let ir_len = self.taps[index].ir_len;
        if ir_len > max_ir_len.saturating_sub(self.total_ir_len) {
            return Err(Error::ResourceExhausted { limit: max_ir_len });
        }

        let ir_in_idx = if index == 0 {
            0
        } else {
            self.taps[index - 1].ir_out_idx + 1
        };
        let ir_out_idx = ir_in_idx + ir_len - 1;

        self.taps[index].ir_in_idx = ir_in_idx;
        self.taps[index].ir_out_idx = ir_out_idx;
        self.taps[index].active = true;
        self.active_devices += 1;
        self.total_ir_len += ir_len;
        Ok(())
    }

    pub(crate) fn deactivate(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if !self.taps[index].active {
            return Err(Error::TapDeviceUnavailable(index));
        }
        if index != self.active_devices - 1 {
            // Only the tail of the active prefix may be deactivated, to
            // keep the active set contiguous.
            return Err(Error::TapDeviceUnavailable(index));
        }
        let ir_len = self.taps[index].ir_len;
        self.taps[index].active = false;
        self.taps[index].ir_in_idx = 0;
        self.taps[index].ir_out_idx = 0;
        self.active_devices -= 1;
        self.total_ir_len -= ir_len;
        Ok(())
    }
}

impl<P: PinDriver> JtagController<P> {
    /// Zeroes every chain descriptor and resets `active_devices` and
    /// `total_ir_len` to 0. Does not touch the TAP state or pins.
    pub fn init(&mut self) {
        self.chain.init();
    }

    /// The descriptor currently stored at `index`, whether active or not.
    pub fn tap(&self, index: usize) -> Result<TapDescriptor> {
        self.chain.descriptor(index)
    }

    /// Number of descriptors currently participating in the chain's IR
    /// layout.
    pub fn active_devices(&self) -> usize {
        self.chain.active_devices()
    }

    /// Sum of `ir_len` over every active descriptor — the width of the
    /// concatenated chain IR as currently laid out.
    pub fn total_ir_len(&self) -> usize {
        self.chain.total_ir_len()
    }

    /// Populates slot `index` with a new, inactive descriptor.
    ///
    /// `index` must either name an already-populated (and inactive) slot, or
    /// extend the populated prefix by exactly one — the table is
    /// append-only at the tail of its populated prefix, independent of which
    /// of those slots are currently active; see the module-level docs for
    /// why. `ir_len` must be nonzero and at most
    /// [`Config::max_ir_len`](crate::config::Config::max_ir_len).
    pub fn add(&mut self, index: usize, name: &str, idcode: u32, ir_len: usize) -> Result<()> {
        let max_ir_len = self.config().max_ir_len;
        self.chain.add(index, name, idcode, ir_len, max_ir_len)
    }

    /// Zeroes slot `index`. Fails if the slot is currently active — callers
    /// must [`deactivate`](Self::deactivate) it first.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.chain.remove(index)
    }

    /// Activates slot `index`, assigning its `ir_in_idx`/`ir_out_idx` from
    /// the tail of the previous active descriptor (or 0, if `index == 0`).
    pub fn activate(&mut self, index: usize) -> Result<()> {
        let max_ir_len = self.config().max_ir_len;
        self.chain.activate(index, max_ir_len)
    }

    /// Deactivates slot `index`, which must be the tail of the active
    /// prefix (the most recently activated device still active).
    pub fn deactivate(&mut self, index: usize) -> Result<()> {
        self.chain.deactivate(index)
    }

    /// Addresses device `index` for a real operation: every other active
    /// device is set to BYPASS (its slot filled with all-ones) while `index`
    /// keeps whatever bits the caller has already placed into its own
    /// `ir_in_idx..=ir_out_idx` window, then shifts the whole concatenated
    /// IR and lands in `RunTestIdle`.
    ///
    /// Callers build their real instruction into `ir_in` at the window
    /// reported by [`tap`](Self::tap) *before* calling this — `selector`
    /// only fills in the BYPASS bits around it, it does not know the
    /// addressed device's instruction set.
    pub fn selector(&mut self, index: usize, ir_in: &mut [u8]) -> Result<DeviceHandle> {
        let target = self.chain.descriptor(index)?;
        if !target.active {
            return Err(Error::TapDeviceUnavailable(index));
        }

        let total_ir_len = self.chain.total_ir_len();
        if ir_in.len() != total_ir_len {
            return Err(Error::BadParameter(
                "selector requires ir_in.len() == total_ir_len",
            ));
        }

        for (i, bit) in ir_in.iter_mut().enumerate() {
            if i < target.ir_in_idx || i > target.ir_out_idx {
                *bit = 1;
            }
        }

        self.insert_ir(ir_in, TapState::RunTestIdle)?;

        Ok(DeviceHandle {
            index,
            idcode: target.idcode,
            ir_len: target.ir_len,
        })
    }

    /// Convenience wrapper around [`selector`](Self::selector) that builds
    /// the all-BYPASS-except-`index` buffer itself and returns it alongside
    /// the handle, for callers that have no real instruction of their own
    /// to place (e.g. just addressing a device before a BYPASS-only probe).
    pub fn selector_bypass(&mut self, index: usize) -> Result<(DeviceHandle, BitBuf)> {
        let total_ir_len = self.chain.total_ir_len();
        let mut ir_in = BitBuf::ones(total_ir_len);
        let handle = self.selector(index, ir_in.as_mut_slice())?;
        Ok((handle, ir_in))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arithmetic_matches_activation_order() {
        let mut chain = ChainTable::new(MAX_ALLOWED_TAPS);
        chain.add(0, "A", 0xA, 5, 128).unwrap();
        chain.add(1, "B", 0xB, 4, 128).unwrap();
        chain.add(2, "C", 0xC, 3, 128).unwrap();
        chain.activate(0, 128).unwrap();
        chain.activate(1, 128).unwrap();
        chain.activate(2, 128).unwrap();

        assert_eq!(chain.total_ir_len(), 12);
        assert_eq!(chain.active_devices(), 3);
        let d0 = chain.descriptor(0).unwrap();
        let d1 = chain.descriptor(1).unwrap();
        let d2 = chain.descriptor(2).unwrap();
        assert_eq!((d0.ir_in_idx, d0.ir_out_idx), (0, 4));
        assert_eq!((d1.ir_in_idx, d1.ir_out_idx), (5, 8));
        assert_eq!((d2.ir_in_idx, d2.ir_out_idx), (9, 11));
    }

    #[test]
    fn two_device_chain_matches_scenario() {
        let mut chain = ChainTable::new(MAX_ALLOWED_TAPS);
        chain.add(0, "A", 0xA, 5, 128).unwrap();
        chain.add(1, "B", 0xB, 4, 128).unwrap();
        chain.activate(0, 128).unwrap();
        chain.activate(1, 128).unwrap();

        assert_eq!(chain.total_ir_len(), 9);
        let d0 = chain.descriptor(0).unwrap();
        let d1 = chain.descriptor(1).unwrap();
        assert_eq!((d0.ir_in_idx, d0.ir_out_idx), (0, 4));
        assert_eq!((d1.ir_in_idx, d1.ir_out_idx), (5, 8));
    }

    #[test]
    fn add_rejects_non_append_index() {
        let mut chain = ChainTable::new(MAX_ALLOWED_TAPS);
        let err = chain.add(1, "A", 0xA, 5, 128).unwrap_err();
        assert!(matches!(err, Error::BadParameter(_)));
    }

    #[test]
    fn activate_rejects_out_of_order() {
        let mut chain = ChainTable::new(MAX_ALLOWED_TAPS);
        chain.add(0, "A", 0xA, 5, 128).unwrap();
        chain.add(1, "B", 0xB, 4, 128).unwrap();
        let err = chain.activate(1, 128).unwrap_err();
        assert!(matches!(err, Error::TapDeviceUnavailable(1)));
    }

    #[test]
    fn activate_rejects_resource_exhaustion() {
        let mut chain = ChainTable::new(MAX_ALLOWED_TAPS);
        chain.add(0, "Big", 0xA, 100, 128).unwrap();
        chain.add(1, "Small", 0xB, 40, 128).unwrap();
        chain.activate(0, 128).unwrap();
        let err = chain.activate(1, 128).unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted { limit: 128 }));
    }

    #[test]
    fn deactivate_only_pops_the_tail() {
        let mut chain = ChainTable::new(MAX_ALLOWED_TAPS);
        chain.add(0, "A", 0xA, 5, 128).unwrap();
        chain.add(1, "B", 0xB, 4, 128).unwrap();
        chain.activate(0, 128).unwrap();
        chain.activate(1, 128).unwrap();

        let err = chain.deactivate(0).unwrap_err();
        assert!(matches!(err, Error::TapDeviceUnavailable(0)));

        chain.deactivate(1).unwrap();
        assert_eq!(chain.active_devices(), 1);
        assert_eq!(chain.total_ir_len(), 5);
        chain.deactivate(0).unwrap();
        assert_eq!(chain.active_devices(), 0);
        assert_eq!(chain.total_ir_len(), 0);
    }

    #[test]
    fn selector_produces_all_bypass_for_one_device() {
        use crate::config::Config;
        use crate::fake::LoopbackPins;

        let mut jtag = JtagController::new(LoopbackPins::new(0), Config::default());
        jtag.reset_tap().unwrap();
        jtag.add(0, "A", 0xA, 5).unwrap();
        jtag.add(1, "B", 0xB, 4).unwrap();
        jtag.activate(0).unwrap();
        jtag.activate(1).unwrap();

        let (handle, ir_in) = jtag.selector_bypass(1).unwrap();
        assert_eq!(handle.index, 1);
        assert_eq!(handle.idcode, 0xB);
        assert_eq!(ir_in.as_slice(), &[1u8; 9]);
        assert_eq!(jtag.current_state(), TapState::RunTestIdle);
    }

    #[test]
    fn selector_rejects_inactive_device() {
        use crate::config::Config;
        use crate::fake::LoopbackPins;

        let mut jtag = JtagController::new(LoopbackPins::new(0), Config::default());
        jtag.reset_tap().unwrap();
        jtag.add(0, "A", 0xA, 5).unwrap();

        let err = jtag.selector_bypass(0).unwrap_err();
        assert!(matches!(err, Error::TapDeviceUnavailable(0)));
    }
}
