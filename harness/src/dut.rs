// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use crate::signal::Signal;

/// A handle to a simulated Tiny Tapeout module.
///
/// Implementations only move bits. Checking that a signal is driven in the
/// right direction and fits its width is done by
/// [`Simulator`](crate::sim::Simulator) before it reaches the device.
pub trait Dut {
    /// The source-level name of the top module.
    fn name(&self) -> &str;

    /// Sets the input `signal` to `value`. The new value is not observable on
    /// the outputs until the next [`Dut::eval`].
    fn pin(&mut self, signal: Signal, value: u8);

    /// The value of the output `signal` as of the last [`Dut::eval`].
    fn read(&self, signal: Signal) -> u8;

    /// Equivalent to the Verilator `eval` method.
    fn eval(&mut self);
}

impl<D: Dut + ?Sized> Dut for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn pin(&mut self, signal: Signal, value: u8) {
        (**self).pin(signal, value);
    }

    fn read(&self, signal: Signal) -> u8 {
        (**self).read(signal)
    }

    fn eval(&mut self) {
        (**self).eval();
    }
}
