// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

// hardcoded knowledge:
// - output library is obj_dir/libV${top_module}_dyn.so
// - every Tiny Tapeout port is at most 8 bits, so all accessors use CData

use std::{fmt::Write, fs, process::Command, time::Duration};

use camino::{Utf8Path, Utf8PathBuf};
use indicatif::ProgressBar;
use snafu::{Whatever, prelude::*};
use ttbench_harness::{PortDirection, Signal};

use crate::VerilatorRuntimeOptions;

/// The C++ glue exposing a Verilated `tt_um_*` module over the C ABI.
pub(crate) fn ffi_source(top: &str) -> Result<String, Whatever> {
    let mut buffer = String::new();
    writeln!(
        &mut buffer,
        r#"
#include "verilated.h"
#include "V{top}.h"

extern "C" {{
    void* ffi_new_V{top}() {{
        return new V{top}{{}};
    }}

    void ffi_V{top}_eval(V{top}* top) {{
        top->eval();
    }}

    void ffi_delete_V{top}(V{top}* top) {{
        delete top;
    }}
"#
    )
    .whatever_context("Failed to format utility FFI")?;

    for signal in Signal::ALL {
        let port = signal.name();
        let msb = signal.width() - 1;
        match signal.direction() {
            PortDirection::Input => writeln!(
                &mut buffer,
                r#"
    void ffi_V{top}_pin_{port}(V{top}* top, VL_IN8(new_value, {msb}, 0)) {{
        top->{port} = new_value;
    }}"#
            )
            .whatever_context("Failed to format input port FFI")?,
            PortDirection::Output => writeln!(
                &mut buffer,
                r#"
    VL_OUT8(/* return value */, {msb}, 0) ffi_V{top}_read_{port}(V{top}* top) {{
        return top->{port};
    }}"#
            )
            .whatever_context("Failed to format output port FFI")?,
        }
    }

    writeln!(&mut buffer, "}} // extern \"C\"")
        .whatever_context("Failed to format ending brace")?;

    Ok(buffer)
}

fn needs_rebuild(
    source_files: &[Utf8PathBuf],
    verilator_artifact_directory: &Utf8Path,
) -> Result<bool, Whatever> {
    if !verilator_artifact_directory.exists() {
        return Ok(true);
    }

    let Some(last_built) = fs::read_dir(verilator_artifact_directory)
        .whatever_context(format!(
            "{} exists but could not read it",
            verilator_artifact_directory
        ))?
        .flatten()
        .filter_map(|entry| {
            entry
                .metadata()
                .ok()
                .filter(|metadata| metadata.is_file())
                .and_then(|metadata| metadata.modified().ok())
        })
        .max()
    else {
        return Ok(true);
    };

    for source_file in source_files {
        let last_edited = fs::metadata(source_file)
            .whatever_context(format!(
                "Failed to read file metadata for source file {}",
                source_file
            ))?
            .modified()
            .whatever_context(format!(
                "Failed to determine last-modified time for source file {}",
                source_file
            ))?;
        if last_edited > last_built {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Builds `top_module` into a shared library under `artifact_directory`,
/// unless an up-to-date build is already there. Returns the library path.
///
/// # Safety
///
/// Not thread-safe: the caller must hold a lock on `artifact_directory`.
pub(crate) fn build_library(
    source_files: &[Utf8PathBuf],
    include_directories: &[Utf8PathBuf],
    top_module: &str,
    artifact_directory: &Utf8Path,
    options: &VerilatorRuntimeOptions,
) -> Result<Utf8PathBuf, Whatever> {
    let ffi_artifact_directory = artifact_directory.join("ffi");
    fs::create_dir_all(&ffi_artifact_directory).whatever_context(
        "Failed to create ffi subdirectory under artifacts directory",
    )?;
    let verilator_artifact_directory = artifact_directory.join("obj_dir");
    let library_name = format!("V{}_dyn", top_module);
    let library_path =
        verilator_artifact_directory.join(format!("lib{}.so", library_name));

    if !options.force_verilator_rebuild
        && library_path.is_file()
        && !needs_rebuild(source_files, &verilator_artifact_directory)
            .whatever_context("Failed to check if artifacts need rebuilding")?
    {
        if options.log {
            log::info!("Reusing up-to-date library {}", library_path);
        }
        return Ok(library_path);
    }

    if options.log {
        log::info!("Writing FFI wrappers");
    }
    fs::write(ffi_artifact_directory.join("ffi.cpp"), ffi_source(top_module)?)
        .whatever_context("Failed to write FFI wrappers file")?;

    // bug in verilator#5226 means the directory must be relative to -Mdir
    let ffi_wrappers = Utf8Path::new("../ffi/ffi.cpp");

    let mut command = Command::new(&options.verilator_executable);
    command
        .args(["--cc", "-sv", "--build", "-j", "0"])
        .args(["-CFLAGS", "-shared -fpic"])
        .args(["--lib-create", &library_name])
        .args(["--Mdir", verilator_artifact_directory.as_str()])
        .args(["--top-module", top_module]);
    if let Some(level) = options.verilator_optimization {
        if level > 3 {
            whatever!(
                "Verilator optimization level {} is out of range 0 to 3",
                level
            );
        }
        command.arg(format!("-O{level}"));
    }
    for warning in &options.ignored_warnings {
        command.arg(format!("-Wno-{warning}"));
    }
    for include_directory in include_directories {
        command.arg(format!("-I{include_directory}"));
    }
    command.args(source_files).arg(ffi_wrappers);

    if options.log {
        log::info!("Invoking {:?}", command);
    }
    let spinner = ProgressBar::new_spinner()
        .with_message(format!("Verilating {top_module}"));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let verilator_output = command
        .output()
        .whatever_context("Invocation of verilator failed")?;
    spinner.finish_and_clear();

    if !verilator_output.status.success() {
        whatever!(
            "Invocation of verilator failed with nonzero exit code {}\n\n--- STDOUT ---\n{}\n\n--- STDERR ---\n{}",
            verilator_output.status,
            String::from_utf8(verilator_output.stdout).unwrap_or_default(),
            String::from_utf8(verilator_output.stderr).unwrap_or_default()
        );
    }

    Ok(library_path)
}
