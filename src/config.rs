// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Reading `ttbench.toml`.
//!
//! ```toml
//! [project]
//! top_module = "tt_um_example"
//! source_files = ["src/project.v"]
//! include_directories = []
//! artifact_directory = "artifacts"
//!
//! [verilator]
//! executable = "verilator"
//! optimization = 2
//! force_rebuild = false
//! ignored_warnings = ["WIDTHEXPAND"]
//!
//! [runner]
//! filter = "test_project"
//! log = true
//! ```
//!
//! Only `project.top_module` and `project.source_files` are required.
//! Relative paths are resolved against the directory holding the file.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use snafu::{OptionExt, ResultExt, Whatever, whatever};
use ttbench_harness::RunnerOptions;
use ttbench_verilator::{VerilatorRuntime, VerilatorRuntimeOptions};

pub const CONFIG_FILE_NAME: &str = "ttbench.toml";

const DEFAULT_ARTIFACT_DIRECTORY: &str = "artifacts";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub top_module: String,
    pub source_files: Vec<Utf8PathBuf>,
    pub include_directories: Vec<Utf8PathBuf>,
    pub artifact_directory: Utf8PathBuf,
    pub verilator: VerilatorRuntimeOptions,
    pub runner: RunnerOptions,
}

fn string_array(
    value: Option<&toml::Value>,
    key: &str,
) -> Result<Vec<String>, Whatever> {
    let Some(value) = value else {
        return Ok(vec![]);
    };
    let Some(array) = value.as_array() else {
        whatever!("`{}` in {} is not an array", key, CONFIG_FILE_NAME);
    };
    array
        .iter()
        .map(|element| {
            element.as_str().map(str::to_string).whatever_context(format!(
                "`{}` in {} must only contain strings",
                key, CONFIG_FILE_NAME
            ))
        })
        .collect()
}

fn optional_str<'a>(
    table: Option<&'a toml::Value>,
    key: &str,
    section: &str,
) -> Result<Option<&'a str>, Whatever> {
    match table.and_then(|table| table.get(key)) {
        None => Ok(None),
        Some(value) => value.as_str().map(Some).whatever_context(format!(
            "`{}.{}` in {} is not a string",
            section, key, CONFIG_FILE_NAME
        )),
    }
}

fn optional_bool(
    table: Option<&toml::Value>,
    key: &str,
    section: &str,
) -> Result<Option<bool>, Whatever> {
    match table.and_then(|table| table.get(key)) {
        None => Ok(None),
        Some(value) => value.as_bool().map(Some).whatever_context(format!(
            "`{}.{}` in {} is not a boolean",
            section, key, CONFIG_FILE_NAME
        )),
    }
}

impl ProjectConfig {
    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Utf8Path) -> Result<Self, Whatever> {
        let contents = fs::read_to_string(path)
            .whatever_context(format!("Failed to read {}", path))?;
        let base = path.parent().unwrap_or(Utf8Path::new(""));
        Self::from_toml_str(&contents, base)
            .whatever_context(format!("Invalid configuration in {}", path))
    }

    /// Parses a configuration whose relative paths are relative to `base`.
    pub fn from_toml_str(
        contents: &str,
        base: &Utf8Path,
    ) -> Result<Self, Whatever> {
        let config: toml::Value = contents
            .parse()
            .whatever_context(format!("Failed to parse {}", CONFIG_FILE_NAME))?;

        let Some(project) = config.get("project") else {
            whatever!("Missing [project] section from {}", CONFIG_FILE_NAME);
        };
        let top_module = project
            .get("top_module")
            .and_then(|top_module| top_module.as_str())
            .whatever_context(format!(
                "Failed to read `project.top_module` as a string in {}",
                CONFIG_FILE_NAME
            ))?
            .to_string();

        let resolve = |path: String| base.join(path);
        let source_files: Vec<_> =
            string_array(project.get("source_files"), "project.source_files")?
                .into_iter()
                .map(resolve)
                .collect();
        if source_files.is_empty() {
            whatever!(
                "`project.source_files` in {} must list at least one file",
                CONFIG_FILE_NAME
            );
        }
        let include_directories = string_array(
            project.get("include_directories"),
            "project.include_directories",
        )?
        .into_iter()
        .map(resolve)
        .collect();
        let artifact_directory = base.join(
            optional_str(Some(project), "artifact_directory", "project")?
                .unwrap_or(DEFAULT_ARTIFACT_DIRECTORY),
        );

        let verilator_section = config.get("verilator");
        let mut verilator = VerilatorRuntimeOptions::default();
        if let Some(executable) =
            optional_str(verilator_section, "executable", "verilator")?
        {
            verilator.verilator_executable = executable.into();
        }
        if let Some(level) =
            verilator_section.and_then(|section| section.get("optimization"))
        {
            let Some(level) = level
                .as_integer()
                .filter(|level| (0..=3).contains(level))
            else {
                whatever!(
                    "`verilator.optimization` in {} must be an integer from 0 to 3",
                    CONFIG_FILE_NAME
                );
            };
            verilator.verilator_optimization = Some(level as usize);
        }
        if let Some(force) =
            optional_bool(verilator_section, "force_rebuild", "verilator")?
        {
            verilator.force_verilator_rebuild = force;
        }
        verilator.ignored_warnings = string_array(
            verilator_section
                .and_then(|section| section.get("ignored_warnings")),
            "verilator.ignored_warnings",
        )?;

        let runner_section = config.get("runner");
        let log =
            optional_bool(runner_section, "log", "runner")?.unwrap_or(false);
        verilator.log = log;
        let runner = RunnerOptions {
            filter: optional_str(runner_section, "filter", "runner")?
                .map(str::to_string),
            log,
        };

        Ok(Self {
            top_module,
            source_files,
            include_directories,
            artifact_directory,
            verilator,
            runner,
        })
    }

    /// The file expected to define the top module: the first source file.
    ///
    /// # Panics
    ///
    /// If `source_files` is empty, which [`ProjectConfig::from_toml_str`]
    /// never produces.
    pub fn top_source(&self) -> &Utf8Path {
        &self.source_files[0]
    }

    /// A runtime over this project's sources.
    pub fn runtime(&self) -> Result<VerilatorRuntime, Whatever> {
        VerilatorRuntime::new(
            &self.artifact_directory,
            &self
                .source_files
                .iter()
                .map(Utf8PathBuf::as_path)
                .collect::<Vec<_>>(),
            &self
                .include_directories
                .iter()
                .map(Utf8PathBuf::as_path)
                .collect::<Vec<_>>(),
            self.verilator.clone(),
        )
    }
}
