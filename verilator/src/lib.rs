// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! This module implements the Verilator backend for simulating Tiny Tapeout
//! user modules (`tt_um_*`).
//!
//! The runtime verilates the module into a shared library, loads it, and
//! hands it out as a [`VerilatedDut`], which the
//! [`Simulator`](ttbench_harness::Simulator) drives like any other [`Dut`].

use std::{
    collections::{HashMap, hash_map::Entry},
    ffi::OsString,
    fs,
    sync::{LazyLock, Mutex},
    time::Instant,
};

use build_library::build_library;
use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use libloading::Library;
use owo_colors::OwoColorize;
use snafu::{ResultExt, Whatever, whatever};
use ttbench_harness::eprintln_nocapture;

mod build_library;
pub mod dut;

pub use dut::VerilatedDut;
pub use ttbench_harness::Dut;

/// Verilator-defined types for C FFI.
pub mod types {
    /// From the Verilator documentation: "Data representing 'bit' of 1-8 packed
    /// bits."
    pub type CData = u8;
}

/// Every Tiny Tapeout user module name starts with this.
pub const TOP_MODULE_PREFIX: &str = "tt_um_";

/// Optional configuration for creating a [`VerilatorRuntime`]. Usually, you can
/// just use [`VerilatorRuntimeOptions::default()`].
#[derive(Debug, Clone)]
pub struct VerilatorRuntimeOptions {
    /// The name of the `verilator` executable, interpreted in some way by the
    /// OS/shell.
    pub verilator_executable: OsString,

    /// If `None`, there will be no optimization. If a value from `0` to `3`
    /// inclusive, the flag `-O<level>` will be passed. Enabling will slow
    /// compilation times.
    pub verilator_optimization: Option<usize>,

    /// Whether Verilator should always be invoked instead of only when the
    /// source files change.
    pub force_verilator_rebuild: bool,

    /// A list of warnings to disable.
    pub ignored_warnings: Vec<String>,

    /// Whether to use the log crate.
    pub log: bool,
}

impl Default for VerilatorRuntimeOptions {
    fn default() -> Self {
        Self {
            verilator_executable: "verilator".into(),
            verilator_optimization: None,
            force_verilator_rebuild: false,
            ignored_warnings: vec![],
            log: false,
        }
    }
}

impl VerilatorRuntimeOptions {
    /// The same as the [`Default`] implementation except that the log crate is
    /// used.
    pub fn default_logging() -> Self {
        Self {
            log: true,
            ..Default::default()
        }
    }
}

/// Runtime for Tiny Tapeout (System)Verilog projects.
pub struct VerilatorRuntime {
    artifact_directory: Utf8PathBuf,
    source_files: Vec<Utf8PathBuf>,
    include_directories: Vec<Utf8PathBuf>,
    options: VerilatorRuntimeOptions,
    /// Mapping between hardware (top, path) and Verilator implementations
    libraries: HashMap<(String, String), Library>,
}

#[derive(Default)]
struct ThreadLocalFileLock;

/// The file_guard handles locking across processes, but does not guarantee
/// locking between threads in one process.
static THREAD_LOCK: LazyLock<DashMap<Utf8PathBuf, Mutex<ThreadLocalFileLock>>> =
    LazyLock::new(DashMap::default);

/// Rejects names that are not plain `tt_um_*` identifiers.
pub fn validate_top_module(name: &str) -> Result<(), Whatever> {
    if name.chars().any(|c| c == '\\' || c == ' ') {
        whatever!("Escaped module names are not supported");
    }
    if !name.starts_with(TOP_MODULE_PREFIX)
        || name.len() == TOP_MODULE_PREFIX.len()
    {
        whatever!(
            "Module `{}` is not a Tiny Tapeout user module: its name must start with `{}`",
            name,
            TOP_MODULE_PREFIX
        );
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        whatever!("Module `{}` is not a plain Verilog identifier", name);
    }
    Ok(())
}

impl VerilatorRuntime {
    /// Creates a new runtime for instantiating Tiny Tapeout modules as
    /// [`Dut`]s.
    pub fn new(
        artifact_directory: &Utf8Path,
        source_files: &[&Utf8Path],
        include_directories: &[&Utf8Path],
        options: VerilatorRuntimeOptions,
    ) -> Result<Self, Whatever> {
        if options.log {
            log::info!("Validating source files");
        }
        for source_file in source_files {
            if !source_file.is_file() {
                whatever!(
                    "Source file {} does not exist or is not a file. Note that if it's a relative path, you must be in the correct directory",
                    source_file
                );
            }
        }

        Ok(Self {
            artifact_directory: artifact_directory.to_owned(),
            source_files: source_files
                .iter()
                .map(|path| path.to_path_buf())
                .collect(),
            include_directories: include_directories
                .iter()
                .map(|path| path.to_path_buf())
                .collect(),
            options,
            libraries: HashMap::new(),
        })
    }

    /// Constructs a new device for the module `top_module` defined in
    /// `source_path`, which must be one of the runtime's source files. Uses
    /// lazy and incremental building for efficiency.
    ///
    /// See also: [`VerilatorRuntime::build`] and
    /// [`VerilatorRuntime::instantiate`], which split this into a mutable
    /// build step and a shared construction step.
    pub fn create_dut(
        &mut self,
        top_module: &str,
        source_path: &Utf8Path,
    ) -> Result<VerilatedDut<'_>, Whatever> {
        self.build(top_module, source_path)?;
        self.instantiate(top_module, source_path)
    }

    /// Makes sure a library for `top_module` is built and loaded.
    pub fn build(
        &mut self,
        top_module: &str,
        source_path: &Utf8Path,
    ) -> Result<(), Whatever> {
        self.build_or_retrieve_library(top_module, source_path)
            .whatever_context(
                "Failed to build or retrieve verilator dynamic library",
            )?;
        Ok(())
    }

    /// Constructs a new device from a library previously built with
    /// [`VerilatorRuntime::build`]. Each call yields an independent model.
    pub fn instantiate(
        &self,
        top_module: &str,
        source_path: &Utf8Path,
    ) -> Result<VerilatedDut<'_>, Whatever> {
        let Some(library) = self
            .libraries
            .get(&(top_module.to_string(), source_path.to_string()))
        else {
            whatever!(
                "Module `{}` from {} has not been built yet",
                top_module,
                source_path
            );
        };

        if self.options.log {
            log::info!("Instantiating {}", top_module);
        }
        VerilatedDut::load(library, top_module)
    }

    /// Invokes verilator to build a dynamic library for the Tiny Tapeout
    /// module named `name` defined in the file `source_path`.
    ///
    /// If the library is already cached for the given module name/source path
    /// pair, then nothing is rebuilt.
    ///
    /// If `self.options.force_verilator_rebuild`, then the library will always
    /// be rebuilt. Otherwise, it is only rebuilt when a source file is newer
    /// than the existing artifacts.
    ///
    /// # Safety
    ///
    /// This function is thread-safe.
    fn build_or_retrieve_library(
        &mut self,
        name: &str,
        source_path: &Utf8Path,
    ) -> Result<(), Whatever> {
        validate_top_module(name)?;

        if self.options.log {
            log::info!("Validating model source file");
        }
        if !self.source_files.iter().any(|source_file| {
            match (
                source_file.canonicalize_utf8(),
                source_path.canonicalize_utf8(),
            ) {
                (Ok(lhs), Ok(rhs)) => lhs == rhs,
                _ => false,
            }
        }) {
            whatever!(
                "Module `{}` requires source file {}, which was not provided to the runtime",
                name,
                source_path
            );
        }

        let key = (name.to_string(), source_path.to_string());
        if let Entry::Vacant(entry) = self.libraries.entry(key) {
            let local_directory_name = format!(
                "{name}_{}",
                source_path.as_str().replace("_", "__").replace("/", "_")
            );
            let local_artifacts_directory =
                self.artifact_directory.join(&local_directory_name);

            if self.options.log {
                log::info!(
                    "Creating artifacts directory {}",
                    local_artifacts_directory
                );
            }
            fs::create_dir_all(&local_artifacts_directory).whatever_context(
                format!(
                    "Failed to create artifacts directory {}",
                    local_artifacts_directory,
                ),
            )?;

            eprintln_nocapture!(
                "{} waiting for file lock on build directory",
                "    Blocking".bold().cyan(),
            )?;

            // # Safety
            // build_library is not thread-safe, so we have to lock the
            // directory
            if self.options.log {
                log::info!("Acquiring file lock on artifact directory");
            }
            let file_lock = fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(
                    self.artifact_directory
                        .join(format!("{local_directory_name}.lock")),
                )
                .whatever_context(
                    "Failed to open file lock file for artifacts directory (this is not the actual lock itself, it is an I/O error)",
                )?;

            let _file_lock =
                file_guard::lock(&file_lock, file_guard::Lock::Exclusive, 0, 1)
                    .whatever_context(
                        "Failed to acquire file lock for artifacts directory",
                    )?;

            let thread_mutex = THREAD_LOCK
                .entry(local_artifacts_directory.clone())
                .or_default();
            let Ok(_thread_lock) = thread_mutex.lock() else {
                whatever!(
                    "Failed to acquire thread-local lock for artifacts directory"
                );
            };

            eprintln_nocapture!(
                "{} {} ({})",
                "   Compiling".bold().green(),
                name,
                source_path
            )?;
            let start = Instant::now();

            if self.options.log {
                log::info!("Building the dynamic library with verilator");
            }
            let library_path = build_library(
                &self.source_files,
                &self.include_directories,
                name,
                &local_artifacts_directory,
                &self.options,
            )
            .whatever_context("Failed to build verilator dynamic library")?;

            if self.options.log {
                log::info!("Opening the dynamic library");
            }
            let library = unsafe { Library::new(library_path) }
                .whatever_context("Failed to load verilator dynamic library")?;

            entry.insert(library);

            let duration = start.elapsed();
            eprintln_nocapture!(
                "{} `verilator-{}` profile target(s) in {}.{:02}s",
                "    Finished".bold().green(),
                self.options
                    .verilator_optimization
                    .map(|level| format!("O{level}"))
                    .unwrap_or("unoptimized".into()),
                duration.as_secs(),
                duration.subsec_millis() / 10
            )?;
        }

        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tiny_tapeout_modules_are_accepted() {
        assert!(validate_top_module("tt_um_example_mac").is_ok());
        assert!(validate_top_module("tt_um_").is_err());
        assert!(validate_top_module("mac").is_err());
        assert!(validate_top_module("tt_um_a b").is_err());
        assert!(validate_top_module("\\tt_um_escaped").is_err());
        assert!(validate_top_module("tt_um_dash-ed").is_err());
    }

    #[test]
    fn missing_source_files_are_rejected() {
        assert!(
            VerilatorRuntime::new(
                Utf8Path::new("artifacts"),
                &[Utf8Path::new("does/not/exist.v")],
                &[],
                VerilatorRuntimeOptions::default(),
            )
            .is_err()
        );
    }
}
