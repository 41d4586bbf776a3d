// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use camino::Utf8Path;
use common::init_logging;
use snafu::{ResultExt, Whatever};
use ttbench::{ProjectConfig, harness::Simulator, run_project, test_project};

const CONFIG: &str = "tests/fixtures/ttbench.toml";

#[test]
#[ignore = "requires a verilator installation"]
#[snafu::report]
fn verilated_mac_passes() -> Result<(), Whatever> {
    init_logging();

    let summary = run_project(Utf8Path::new(CONFIG))?;
    assert_eq!(summary.passed, 1);
    assert!(summary.is_success(), "{:?}", summary.failures);

    Ok(())
}

#[test]
#[ignore = "requires a verilator installation"]
#[snafu::report]
fn verilated_models_are_independent() -> Result<(), Whatever> {
    init_logging();

    let config = ProjectConfig::load(Utf8Path::new(CONFIG))?;
    let mut runtime = config.runtime()?;
    runtime.build(&config.top_module, config.top_source())?;

    for _ in 0..2 {
        let dut = runtime.instantiate(&config.top_module, config.top_source())?;
        let mut sim = Simulator::new(dut);
        let accumulation =
            test_project(&mut sim).whatever_context("test_project failed")?;
        assert_eq!((accumulation.first, accumulation.second), (0x06, 0x0c));
    }

    Ok(())
}
