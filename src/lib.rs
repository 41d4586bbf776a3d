// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

use camino::Utf8Path;
use snafu::{ResultExt, Whatever};
use ttbench_harness::{Dut, RegressionSummary, RunnerOptions, TestRunner};

pub mod config;
pub mod project;

#[doc(inline)]
pub use ttbench_harness as harness;

#[doc(inline)]
pub use ttbench_verilator as verilator;

pub use config::ProjectConfig;
pub use project::{Accumulation, TestError, test_project};

/// Every test registered for a Tiny Tapeout project.
pub fn regression<D: Dut>(options: RunnerOptions) -> TestRunner<D, TestError> {
    let mut runner = TestRunner::new(options);
    runner.add("test_project", project::test_project_case::<D>);
    runner
}

/// Verilates the project described by the `ttbench.toml` at `config_path`
/// and runs the regression against it.
pub fn run_project(
    config_path: &Utf8Path,
) -> Result<RegressionSummary, Whatever> {
    let config = ProjectConfig::load(config_path)?;
    if config.runner.log {
        log::info!(
            "Testing {} from {}",
            config.top_module,
            config.top_source()
        );
    }

    let mut runtime = config.runtime()?;
    runtime.build(&config.top_module, config.top_source())?;

    // every test gets a freshly constructed model from the same library
    regression(config.runner.clone()).run(|| {
        runtime
            .instantiate(&config.top_module, config.top_source())
            .whatever_context(format!("Failed to create {}", config.top_module))
    })
}
