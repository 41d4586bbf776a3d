// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! A Verilated Tiny Tapeout module behind the [`Dut`] trait.

use std::collections::HashMap;

use libc::c_void;
use libloading::Library;
use snafu::{ResultExt, Whatever};
use ttbench_harness::{Dut, PortDirection, Signal};

use crate::types;

type PinFn = extern "C" fn(*mut c_void, types::CData);
type ReadFn = extern "C" fn(*mut c_void) -> types::CData;

/// A hardware model constructed at runtime. See
/// [`super::VerilatorRuntime::create_dut`].
pub struct VerilatedDut<'ctx> {
    name: String,
    main: *mut c_void,
    eval_main: extern "C" fn(*mut c_void),
    delete_main: extern "C" fn(*mut c_void),
    pins: HashMap<Signal, PinFn>,
    reads: HashMap<Signal, ReadFn>,
    _library: &'ctx Library,
}

impl<'ctx> VerilatedDut<'ctx> {
    /// Resolves every FFI symbol generated for `name` and constructs the
    /// model.
    pub(crate) fn load(
        library: &'ctx Library,
        name: &str,
    ) -> Result<Self, Whatever> {
        macro_rules! symbol {
            ($symbol_name:expr, $ty:ty) => {{
                let symbol_name: String = $symbol_name;
                *unsafe { library.get::<$ty>(symbol_name.as_bytes()) }
                    .whatever_context(format!(
                        "Failed to load {} for module {}",
                        symbol_name, name
                    ))?
            }};
        }

        let new_main =
            symbol!(format!("ffi_new_V{name}"), extern "C" fn() -> *mut c_void);
        let delete_main = symbol!(
            format!("ffi_delete_V{name}"),
            extern "C" fn(*mut c_void)
        );
        let eval_main = symbol!(
            format!("ffi_V{name}_eval"),
            extern "C" fn(*mut c_void)
        );

        let mut pins = HashMap::new();
        let mut reads = HashMap::new();
        for signal in Signal::ALL {
            match signal.direction() {
                PortDirection::Input => {
                    pins.insert(
                        signal,
                        symbol!(format!("ffi_V{name}_pin_{signal}"), PinFn),
                    );
                }
                PortDirection::Output => {
                    reads.insert(
                        signal,
                        symbol!(format!("ffi_V{name}_read_{signal}"), ReadFn),
                    );
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            main: new_main(),
            eval_main,
            delete_main,
            pins,
            reads,
            _library: library,
        })
    }
}

impl Dut for VerilatedDut<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn pin(&mut self, signal: Signal, value: u8) {
        if let Some(pin) = self.pins.get(&signal) {
            pin(self.main, value);
        }
    }

    fn read(&self, signal: Signal) -> u8 {
        self.reads
            .get(&signal)
            .map(|read| read(self.main))
            .unwrap_or_default()
    }

    fn eval(&mut self) {
        (self.eval_main)(self.main);
    }
}

impl Drop for VerilatedDut<'_> {
    fn drop(&mut self) {
        (self.delete_main)(self.main);
    }
}
