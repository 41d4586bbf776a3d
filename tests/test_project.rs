// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::{Mac, init_logging};
use snafu::{ResultExt, Whatever};
use ttbench::{
    Accumulation, TestError,
    harness::{RunnerOptions, SimTime, Simulator, TimeUnit},
    regression, test_project,
};

#[test]
#[snafu::report]
fn accumulating_design_passes() -> Result<(), Whatever> {
    init_logging();

    let mut sim = Simulator::new(Mac::default());
    let accumulation =
        test_project(&mut sim).whatever_context("test_project failed")?;

    assert_eq!(
        accumulation,
        Accumulation {
            first: 0x06,
            second: 0x0c
        }
    );
    assert_ne!(accumulation.first, accumulation.second);

    Ok(())
}

#[test]
#[snafu::report]
fn reset_is_held_for_five_cycles() -> Result<(), Whatever> {
    let mut sim = Simulator::new(Mac::default());
    test_project(&mut sim).whatever_context("test_project failed")?;

    let mac = sim.dut();
    assert_eq!(mac.edges_in_reset, 5);
    assert_eq!(mac.ena, 1);
    assert_eq!(mac.rst_n, 1);
    assert_eq!((mac.ui_in, mac.uio_in), (0x20, 0x30));
    // 5 reset edges, 1 release edge, 2 stimulus edges at 10 us per cycle
    assert_eq!(
        sim.now(),
        SimTime::from_units(75, TimeUnit::Us).expect("fits")
    );

    Ok(())
}

#[test]
fn design_ignoring_reset_fails_the_reset_check() {
    let mut sim = Simulator::new(Mac::ignoring_reset());

    match test_project(&mut sim) {
        Err(TestError::ResetNotCleared { observed }) => {
            assert_eq!(observed, 0x12)
        }
        other => panic!("expected a reset failure, got {other:?}"),
    }
}

#[test]
fn design_without_accumulation_fails_the_accumulation_check() {
    let mut sim = Simulator::new(Mac::without_accumulation());

    let error = test_project(&mut sim).expect_err("should not accumulate");
    assert!(matches!(error, TestError::NotAccumulating { value: 0x06 }));
    assert!(error.to_string().starts_with("MAC did not accumulate"));
}

#[test]
#[snafu::report]
fn regression_runs_the_project_test() -> Result<(), Whatever> {
    let summary = regression::<Mac>(RunnerOptions::default_logging())
        .run(|| Ok(Mac::default()))?;
    assert_eq!(summary.passed, 1);
    assert!(summary.is_success());

    let summary = regression::<Mac>(RunnerOptions::default())
        .run(|| Ok(Mac::without_accumulation()))?;
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.failures[0].0, "test_project");
    assert!(summary.failures[0].1.contains("MAC did not accumulate"));

    Ok(())
}
