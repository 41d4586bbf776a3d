// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! The project test: reset the multiply-accumulate design, then check that it
//! accumulates under constant input.

use snafu::{ResultExt, Snafu, ensure};
use ttbench_harness::{
    Clock, ClockError, Dut, Signal, SimError, Simulator, TimeUnit,
};

pub const CLOCK_PERIOD: u64 = 10;
pub const CLOCK_UNIT: TimeUnit = TimeUnit::Us;

/// Rising edges `rst_n` is held low for.
pub const RESET_CYCLES: u64 = 5;

pub const STIMULUS_UI_IN: u8 = 0x20;
pub const STIMULUS_UIO_IN: u8 = 0x30;

#[derive(Debug, Snafu)]
pub enum TestError {
    #[snafu(display("uo_out was {observed:#04x} after reset, expected 0"))]
    ResetNotCleared { observed: u8 },
    #[snafu(display(
        "MAC did not accumulate: uo_out stayed at {value:#04x} across two cycles"
    ))]
    NotAccumulating { value: u8 },
    #[snafu(display("Invalid clock"))]
    InvalidClock { source: ClockError },
    #[snafu(transparent)]
    Simulation { source: SimError },
}

/// The two outputs sampled under constant stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulation {
    pub first: u8,
    pub second: u8,
}

/// Drives the reset sequence and one round of stimulus, then checks the
/// outputs. Fails on the first violated check.
pub fn test_project<D: Dut>(
    sim: &mut Simulator<D>,
) -> Result<Accumulation, TestError> {
    log::info!("Start");

    let clock = Clock::new(Signal::Clk, CLOCK_PERIOD, CLOCK_UNIT)
        .context(InvalidClockSnafu)?;
    sim.start_clock(clock)?;

    // Reset
    sim.write(Signal::Ena, 1)?;
    sim.write(Signal::UiIn, 0)?;
    sim.write(Signal::UioIn, 0)?;
    sim.write(Signal::RstN, 0)?;
    sim.clock_cycles(RESET_CYCLES)?;
    sim.write(Signal::RstN, 1)?;
    sim.clock_cycles(1)?;

    let observed = sim.read(Signal::UoOut)?;
    ensure!(observed == 0, ResetNotClearedSnafu { observed });

    sim.write(Signal::UiIn, STIMULUS_UI_IN)?;
    sim.write(Signal::UioIn, STIMULUS_UIO_IN)?;
    sim.clock_cycles(1)?;
    let first = sim.read(Signal::UoOut)?;

    // same inputs again
    sim.clock_cycles(1)?;
    let second = sim.read(Signal::UoOut)?;

    log::info!("First = {first}, Second = {second}");

    ensure!(second != first, NotAccumulatingSnafu { value: second });

    Ok(Accumulation { first, second })
}

/// [`test_project`] in the shape the regression runner expects.
pub fn test_project_case<D: Dut>(
    sim: &mut Simulator<D>,
) -> Result<(), TestError> {
    test_project(sim).map(|_| ())
}
