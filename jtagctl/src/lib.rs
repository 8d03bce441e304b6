//! A bit-banged IEEE 1149.1 (JTAG) TAP controller.
//!
//! This crate drives a target's Test Access Port over four (or five, with
//! TRST) GPIO lines and exposes the primitives a higher-level tool needs to
//! do boundary-scan discovery and operate one or more chained devices:
//!
//! - [`state`] — the 16-state TAP state diagram and its legal transitions.
//! - [`controller`] — [`JtagController`](controller::JtagController), which
//!   owns the pins, the current state, and the chain table, and drives the
//!   FSM one TCK edge at a time via [`advance`](controller::JtagController::advance)
//!   and [`reset_tap`](controller::JtagController::reset_tap).
//! - [`shift`] — [`insert_ir`](controller::JtagController::insert_ir) and
//!   [`insert_dr`](controller::JtagController::insert_dr), the engine that
//!   loads a register while capturing what comes back on TDO.
//! - [`discovery`] — IDCODE read, IR length detection, and per-instruction
//!   DR length detection.
//! - [`chain`] — bookkeeping for devices concatenated on one scan path:
//!   per-device IR slot assignment and the BYPASS-everyone-else selector.
//! - [`pin`] — the [`PinDriver`](pin::PinDriver) trait, the only thing in
//!   this crate allowed to touch hardware.
//! - [`bits`] — fixed-width, LSB-first bit-array conversions.
//! - [`config`] — the tunable [`Config`](config::Config) a controller is
//!   built with.
//! - [`error`] — the [`Error`](error::Error) type shared by every fallible
//!   operation in this crate.
//!
//! Everything funnels through [`PinDriver`](pin::PinDriver), so substituting
//! a fake implementation (see the `fake` test module, built only under
//! `#[cfg(test)]`) makes the whole crate unit-testable without a target
//! attached.
//!
//! # Example
//!
//! ```no_run
//! use jtagctl::config::Config;
//! use jtagctl::controller::JtagController;
//! use jtagctl::pin::{Level, PinDriver};
//!
//! struct MyPins; // wired to real GPIO in a real program
//!
//! impl PinDriver for MyPins {
//!     type Error = std::convert::Infallible;
//!     fn set_tck(&mut self, _level: Level) -> Result<(), Self::Error> { Ok(()) }
//!     fn set_tms(&mut self, _level: Level) -> Result<(), Self::Error> { Ok(()) }
//!     fn set_tdi(&mut self, _level: Level) -> Result<(), Self::Error> { Ok(()) }
//!     fn read_tdo(&mut self) -> Result<Level, Self::Error> { Ok(false) }
//!     fn half_clock_delay(&mut self, _delay_us: u32) {}
//! }
//!
//! let mut jtag = JtagController::new(MyPins, Config::default());
//! let info = jtag.detect_chain()?;
//! println!("idcode = {:#010x}, ir_len = {}", info.idcode, info.ir_len);
//! # Ok::<(), jtagctl::error::Error>(())
//! ```

#![warn(missing_docs)]

pub mod bits;
pub mod chain;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
#[cfg(any(test, feature = "fake-pins"))]
pub mod fake;
pub mod pin;
pub mod shift;
pub mod state;

pub use chain::{DeviceHandle, TapDescriptor, TapName};
pub use config::Config;
pub use controller::JtagController;
pub use discovery::{ChainInfo, DrLenSample};
pub use error::{Error, Result};
pub use pin::{Level, PinDriver};
pub use state::TapState;
