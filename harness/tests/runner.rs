// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::env;

use snafu::{Snafu, Whatever, whatever};
use ttbench_harness::{
    Clock, Dut, RunnerOptions, Signal, SimError, Simulator, TestRunner,
    TimeUnit,
};

/// Drives `uo_out` with `ui_in` on every rising edge.
#[derive(Default)]
struct Register {
    clk: u8,
    last_clk: u8,
    ui_in: u8,
    uo_out: u8,
}

impl Dut for Register {
    fn name(&self) -> &str {
        "tt_um_register"
    }

    fn pin(&mut self, signal: Signal, value: u8) {
        match signal {
            Signal::Clk => self.clk = value,
            Signal::UiIn => self.ui_in = value,
            _ => {}
        }
    }

    fn read(&self, signal: Signal) -> u8 {
        match signal {
            Signal::UoOut => self.uo_out,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        if self.last_clk == 0 && self.clk == 1 {
            self.uo_out = self.ui_in;
        }
        self.last_clk = self.clk;
    }
}

#[derive(Debug, Snafu)]
enum CheckError {
    #[snafu(display("uo_out was {actual}, expected {expected}"))]
    Mismatch { actual: u8, expected: u8 },
    #[snafu(transparent)]
    Simulation { source: SimError },
}

fn registers_input(sim: &mut Simulator<Register>) -> Result<(), CheckError> {
    sim.start_clock(Clock::new(Signal::Clk, 10, TimeUnit::Ns).unwrap())?;
    sim.write(Signal::UiIn, 0x42)?;
    sim.clock_cycles(1)?;
    let actual = sim.read(Signal::UoOut)?;
    if actual != 0x42 {
        return MismatchSnafu {
            actual,
            expected: 0x42u8,
        }
        .fail();
    }
    Ok(())
}

fn expects_the_impossible(
    sim: &mut Simulator<Register>,
) -> Result<(), CheckError> {
    sim.start_clock(Clock::new(Signal::Clk, 10, TimeUnit::Ns).unwrap())?;
    sim.clock_cycles(2)?;
    let actual = sim.read(Signal::UoOut)?;
    MismatchSnafu {
        actual,
        expected: 0xffu8,
    }
    .fail()
}

fn runner(options: RunnerOptions) -> TestRunner<Register, CheckError> {
    let mut runner = TestRunner::new(options);
    runner
        .add("registers_input", registers_input)
        .add("expects_the_impossible", expects_the_impossible);
    runner
}

#[test]
#[snafu::report]
fn counts_passes_and_failures() -> Result<(), Whatever> {
    if env::var("RUST_LOG").is_ok() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    let summary = runner(RunnerOptions::default_logging())
        .run(|| Ok(Register::default()))?;

    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());
    assert_eq!(summary.failures[0].0, "expects_the_impossible");
    assert!(summary.failures[0].1.contains("expected 255"));

    Ok(())
}

#[test]
#[snafu::report]
fn filter_skips_other_tests() -> Result<(), Whatever> {
    let summary = runner(RunnerOptions {
        filter: Some("registers".into()),
        ..Default::default()
    })
    .run(|| Ok(Register::default()))?;

    assert_eq!(summary.passed, 1);
    assert_eq!(summary.skipped, 1);
    assert!(summary.is_success());

    Ok(())
}

#[test]
#[snafu::report]
fn device_construction_failure_fails_the_test() -> Result<(), Whatever> {
    let summary = runner(RunnerOptions {
        filter: Some("registers".into()),
        ..Default::default()
    })
    .run(|| whatever!("no simulator available"))?;

    assert_eq!(summary.passed, 0);
    assert_eq!(summary.failed(), 1);
    assert!(summary.failures[0].1.contains("no simulator available"));

    Ok(())
}
