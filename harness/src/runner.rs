// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Registers testbench procedures and runs each one against a fresh device.

use std::{error::Error, time::Instant};

use owo_colors::OwoColorize;
use snafu::{Report, Whatever};

use crate::{dut::Dut, eprintln_nocapture, sim::Simulator};

/// A testbench procedure. It runs to completion or fails on the first
/// violated check.
pub type TestFn<D, E> = fn(&mut Simulator<D>) -> Result<(), E>;

/// Optional configuration for a [`TestRunner`]. Usually, you can just use
/// [`RunnerOptions::default()`].
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Only run tests whose name contains this substring.
    pub filter: Option<String>,

    /// Whether to use the log crate.
    pub log: bool,
}

impl RunnerOptions {
    /// The same as the [`Default`] implementation except that the log crate is
    /// used.
    pub fn default_logging() -> Self {
        Self {
            log: true,
            ..Default::default()
        }
    }
}

/// What happened to each registered test.
#[derive(Debug, Default)]
pub struct RegressionSummary {
    pub passed: usize,
    pub skipped: usize,
    /// `(test name, failure report)` in registration order.
    pub failures: Vec<(String, String)>,
}

impl RegressionSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct TestRunner<D: Dut, E> {
    tests: Vec<(String, TestFn<D, E>)>,
    options: RunnerOptions,
}

impl<D: Dut, E: Error + 'static> TestRunner<D, E> {
    pub fn new(options: RunnerOptions) -> Self {
        Self {
            tests: vec![],
            options,
        }
    }

    /// Registers `test` under `name`. Tests run in registration order.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        test: TestFn<D, E>,
    ) -> &mut Self {
        self.tests.push((name.into(), test));
        self
    }

    /// Runs every test that matches the filter, building a new device for
    /// each one with `factory`. Failures are collected, not propagated; only
    /// errors writing progress output are returned.
    pub fn run(
        &self,
        mut factory: impl FnMut() -> Result<D, Whatever>,
    ) -> Result<RegressionSummary, Whatever> {
        let mut summary = RegressionSummary::default();

        for (name, test) in &self.tests {
            if let Some(filter) = &self.options.filter {
                if !name.contains(filter.as_str()) {
                    if self.options.log {
                        log::info!(
                            "Skipping {name}: does not match `{filter}`"
                        );
                    }
                    summary.skipped += 1;
                    continue;
                }
            }

            eprintln_nocapture!("{} {}", "     Running".bold().cyan(), name)?;
            let start = Instant::now();

            let dut = match factory() {
                Ok(dut) => dut,
                Err(error) => {
                    eprintln_nocapture!(
                        "{} {} (could not build device)",
                        "      FAILED".bold().red(),
                        name
                    )?;
                    summary.failures.push((
                        name.clone(),
                        Report::from_error(error).to_string(),
                    ));
                    continue;
                }
            };

            if self.options.log {
                log::info!("Running {name} on {}", dut.name());
            }
            let mut sim = Simulator::new(dut);
            let result = test(&mut sim);
            let duration = start.elapsed();

            match result {
                Ok(()) => {
                    eprintln_nocapture!(
                        "{} {} at {} in {}.{:02}s",
                        "          ok".bold().green(),
                        name,
                        sim.now(),
                        duration.as_secs(),
                        duration.subsec_millis() / 10
                    )?;
                    summary.passed += 1;
                }
                Err(error) => {
                    let report = Report::from_error(error).to_string();
                    eprintln_nocapture!(
                        "{} {} at {}: {}",
                        "      FAILED".bold().red(),
                        name,
                        sim.now(),
                        report
                    )?;
                    if self.options.log {
                        log::error!("{name} failed: {report}");
                    }
                    summary.failures.push((name.clone(), report));
                }
            }
        }

        eprintln_nocapture!(
            "{} {} passed, {} failed, {} skipped",
            "     Summary".bold(),
            summary.passed,
            summary.failed(),
            summary.skipped
        )?;

        Ok(summary)
    }
}
