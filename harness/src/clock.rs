// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use snafu::{Snafu, ensure};

use crate::{
    signal::{PortDirection, Signal},
    time::{SimTime, TimeUnit},
};

#[derive(Debug, Snafu)]
pub enum ClockError {
    #[snafu(display("Clock period must be non-zero"))]
    ZeroPeriod,
    #[snafu(display(
        "Clock period {period} {unit} does not fit in simulation time"
    ))]
    PeriodOverflow { period: u64, unit: TimeUnit },
    #[snafu(display(
        "Clock period {period} {unit} cannot be split into two equal halves at femtosecond precision"
    ))]
    OddPeriod { period: u64, unit: TimeUnit },
    #[snafu(display("Cannot drive a clock on {direction} port {signal}"))]
    NotAnInput {
        signal: Signal,
        direction: PortDirection,
    },
}

/// A periodic toggler bound to one signal. Hand it to
/// [`Simulator::start_clock`](crate::sim::Simulator::start_clock) to start it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    signal: Signal,
    period: u64,
    unit: TimeUnit,
    half_period: SimTime,
}

impl Clock {
    /// A 50% duty cycle clock on `signal` with the given period.
    pub fn new(
        signal: Signal,
        period: u64,
        unit: TimeUnit,
    ) -> Result<Self, ClockError> {
        ensure!(
            signal.direction() == PortDirection::Input,
            NotAnInputSnafu {
                signal,
                direction: signal.direction()
            }
        );
        ensure!(period > 0, ZeroPeriodSnafu);
        let full = SimTime::from_units(period, unit)
            .ok_or(ClockError::PeriodOverflow { period, unit })?;
        ensure!(
            full.as_femtoseconds() % 2 == 0,
            OddPeriodSnafu { period, unit }
        );

        Ok(Self {
            signal,
            period,
            unit,
            half_period: SimTime::from_femtoseconds(
                full.as_femtoseconds() / 2,
            ),
        })
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Time between consecutive edges.
    pub fn half_period(&self) -> SimTime {
        self.half_period
    }
}
