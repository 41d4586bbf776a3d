// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

#![allow(dead_code)]

use std::env;

use ttbench::harness::{Dut, Signal};

pub fn init_logging() {
    if env::var("RUST_LOG").is_ok() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

/// A behavioral multiply-accumulate module: on each rising edge the product
/// `ui_in * uio_in` is added to a 16-bit accumulator whose high byte drives
/// `uo_out`.
pub struct Mac {
    /// Whether `rst_n` clears the accumulator.
    pub honors_reset: bool,
    /// Whether the product is added (true) or just stored (false).
    pub accumulates: bool,
    pub acc: u16,
    pub clk: u8,
    pub last_clk: u8,
    pub rst_n: u8,
    pub ena: u8,
    pub ui_in: u8,
    pub uio_in: u8,
    /// Rising edges seen while `rst_n` was low.
    pub edges_in_reset: usize,
}

impl Default for Mac {
    fn default() -> Self {
        Self {
            honors_reset: true,
            accumulates: true,
            acc: 0,
            clk: 0,
            last_clk: 0,
            rst_n: 1,
            ena: 0,
            ui_in: 0,
            uio_in: 0,
            edges_in_reset: 0,
        }
    }
}

impl Mac {
    /// Powers up with garbage in the accumulator and never clears it.
    pub fn ignoring_reset() -> Self {
        Self {
            honors_reset: false,
            acc: 0x1234,
            ..Default::default()
        }
    }

    /// Stores the product instead of adding it.
    pub fn without_accumulation() -> Self {
        Self {
            accumulates: false,
            ..Default::default()
        }
    }
}

impl Dut for Mac {
    fn name(&self) -> &str {
        "tt_um_behavioral_mac"
    }

    fn pin(&mut self, signal: Signal, value: u8) {
        match signal {
            Signal::Clk => self.clk = value,
            Signal::RstN => self.rst_n = value,
            Signal::Ena => self.ena = value,
            Signal::UiIn => self.ui_in = value,
            Signal::UioIn => self.uio_in = value,
            _ => {}
        }
    }

    fn read(&self, signal: Signal) -> u8 {
        match signal {
            Signal::UoOut => (self.acc >> 8) as u8,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        let rising = self.last_clk == 0 && self.clk == 1;
        self.last_clk = self.clk;
        if !rising {
            return;
        }

        let product = self.ui_in as u16 * self.uio_in as u16;
        if self.rst_n == 0 {
            self.edges_in_reset += 1;
            if self.honors_reset {
                self.acc = 0;
            }
        } else if self.ena == 1 {
            self.acc = if self.accumulates {
                self.acc.wrapping_add(product)
            } else {
                product
            };
        }
    }
}
