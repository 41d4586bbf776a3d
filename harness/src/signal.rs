// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! The pins of a Tiny Tapeout user module.

use std::{fmt, str::FromStr};

use snafu::Snafu;

/// <https://www.digikey.com/en/maker/blogs/2024/verilog-ports-part-7-of-our-verilog-journey>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
        .fmt(f)
    }
}

/// A named signal on the `tt_um_*` module interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Clk,
    /// Active-low reset: asserted when driven to 0.
    RstN,
    Ena,
    UiIn,
    UioIn,
    UoOut,
    UioOut,
    UioOe,
}

impl Signal {
    /// Every signal on the interface, inputs first.
    pub const ALL: [Signal; 8] = [
        Signal::Clk,
        Signal::RstN,
        Signal::Ena,
        Signal::UiIn,
        Signal::UioIn,
        Signal::UoOut,
        Signal::UioOut,
        Signal::UioOe,
    ];

    /// The source-level port name.
    pub fn name(self) -> &'static str {
        match self {
            Signal::Clk => "clk",
            Signal::RstN => "rst_n",
            Signal::Ena => "ena",
            Signal::UiIn => "ui_in",
            Signal::UioIn => "uio_in",
            Signal::UoOut => "uo_out",
            Signal::UioOut => "uio_out",
            Signal::UioOe => "uio_oe",
        }
    }

    /// Width in bits.
    pub fn width(self) -> usize {
        match self {
            Signal::Clk | Signal::RstN | Signal::Ena => 1,
            _ => 8,
        }
    }

    pub fn direction(self) -> PortDirection {
        match self {
            Signal::Clk
            | Signal::RstN
            | Signal::Ena
            | Signal::UiIn
            | Signal::UioIn => PortDirection::Input,
            Signal::UoOut | Signal::UioOut | Signal::UioOe => {
                PortDirection::Output
            }
        }
    }

    /// The largest value representable on this signal.
    pub fn mask(self) -> u8 {
        ((1u16 << self.width()) - 1) as u8
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("No signal named `{name}` on a Tiny Tapeout module"))]
pub struct ParseSignalError {
    name: String,
}

impl FromStr for Signal {
    type Err = ParseSignalError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Signal::ALL
            .into_iter()
            .find(|signal| signal.name() == name)
            .ok_or_else(|| ParseSignalError {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back_to_the_same_signal() {
        for signal in Signal::ALL {
            assert_eq!(signal.name().parse::<Signal>().ok(), Some(signal));
        }
        assert!("uo_in".parse::<Signal>().is_err());
    }

    #[test]
    fn masks_follow_widths() {
        assert_eq!(Signal::RstN.mask(), 1);
        assert_eq!(Signal::UiIn.mask(), 0xff);
        assert_eq!(Signal::UoOut.direction(), PortDirection::Output);
    }
}
