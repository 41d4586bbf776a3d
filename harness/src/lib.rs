// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Simulation-time plumbing for testing Tiny Tapeout modules: the pin
//! interface, a clock generator, and a simulator that advances time by
//! counting clock edges.
//!
//! The device itself comes from elsewhere, for example `VerilatorRuntime`
//! (under the "verilator/" directory), or any Rust type implementing
//! [`Dut`].

pub mod clock;
pub mod dut;
#[doc(hidden)]
pub mod nocapture;
pub mod runner;
pub mod signal;
pub mod sim;
pub mod time;

#[doc(hidden)]
pub mod __reexports {
    pub use snafu;
}

pub use clock::{Clock, ClockError};
pub use dut::Dut;
pub use runner::{RegressionSummary, RunnerOptions, TestFn, TestRunner};
pub use signal::{ParseSignalError, PortDirection, Signal};
pub use sim::{Edge, SimError, Simulator};
pub use time::{ParseTimeUnitError, SimTime, TimeUnit};
