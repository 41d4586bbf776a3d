// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Simulation time with femtosecond precision.

use std::{fmt, str::FromStr};

use snafu::Snafu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Fs,
    Ps,
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    /// Largest first, for display.
    const DESCENDING: [TimeUnit; 6] = [
        TimeUnit::S,
        TimeUnit::Ms,
        TimeUnit::Us,
        TimeUnit::Ns,
        TimeUnit::Ps,
        TimeUnit::Fs,
    ];

    /// How many femtoseconds one of this unit lasts.
    pub fn femtoseconds(self) -> u64 {
        match self {
            TimeUnit::Fs => 1,
            TimeUnit::Ps => 1_000,
            TimeUnit::Ns => 1_000_000,
            TimeUnit::Us => 1_000_000_000,
            TimeUnit::Ms => 1_000_000_000_000,
            TimeUnit::S => 1_000_000_000_000_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Debug, Snafu)]
#[snafu(display(
    "Unknown time unit `{unit}`, expected one of fs, ps, ns, us, ms, s"
))]
pub struct ParseTimeUnitError {
    unit: String,
}

impl FromStr for TimeUnit {
    type Err = ParseTimeUnitError;

    fn from_str(unit: &str) -> Result<Self, Self::Err> {
        TimeUnit::DESCENDING
            .into_iter()
            .find(|candidate| candidate.as_str() == unit)
            .ok_or_else(|| ParseTimeUnitError {
                unit: unit.to_string(),
            })
    }
}

/// A point in (or span of) simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_femtoseconds(femtoseconds: u64) -> Self {
        Self(femtoseconds)
    }

    /// Returns `None` on overflow.
    pub fn from_units(amount: u64, unit: TimeUnit) -> Option<Self> {
        amount.checked_mul(unit.femtoseconds()).map(Self)
    }

    pub fn as_femtoseconds(self) -> u64 {
        self.0
    }

    /// Returns `None` on overflow.
    pub fn checked_add(self, rhs: SimTime) -> Option<SimTime> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Truncates toward zero.
    pub fn as_units(self, unit: TimeUnit) -> u64 {
        self.0 / unit.femtoseconds()
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = TimeUnit::DESCENDING
            .into_iter()
            .find(|unit| self.0 % unit.femtoseconds() == 0)
            .unwrap_or(TimeUnit::Fs);
        write!(f, "{} {}", self.as_units(unit), unit)
    }
}
