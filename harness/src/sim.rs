// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! A cooperative, single-threaded simulation loop around a [`Dut`].
//!
//! There are two logical tasks: the clock, which toggles its signal every
//! half-period for the rest of the simulation, and the caller, which drives
//! stimulus. The caller only gives up control at [`Simulator::clock_cycles`]
//! and [`Simulator::wait`], so everything between two such calls happens
//! atomically at the current simulation time.

use snafu::{OptionExt, Snafu, ensure};

use crate::{
    clock::Clock,
    dut::Dut,
    signal::{PortDirection, Signal},
    time::{SimTime, TimeUnit},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

#[derive(Debug, Snafu)]
pub enum SimError {
    #[snafu(display(
        "Port {signal} on module {top_module} is an {direction} port, but was used as an {attempted_direction} port"
    ))]
    InvalidPortDirection {
        top_module: String,
        signal: Signal,
        direction: PortDirection,
        attempted_direction: PortDirection,
    },
    #[snafu(display(
        "Port {signal} on module {top_module} has width {width}, but was driven with {value:#x}"
    ))]
    ValueTooWide {
        top_module: String,
        signal: Signal,
        width: usize,
        value: u8,
    },
    #[snafu(display(
        "Port {signal} on module {top_module} is driven by a running clock"
    ))]
    SignalOwnedByClock { top_module: String, signal: Signal },
    #[snafu(display(
        "A clock is already running on {signal}; clocks cannot be restarted"
    ))]
    ClockAlreadyRunning { signal: Signal },
    #[snafu(display("Waited for clock edges but no clock was started"))]
    NoClock,
    #[snafu(display("Advancing past {now} overflows simulation time"))]
    TimeOverflow { now: SimTime },
}

struct RunningClock {
    clock: Clock,
    high: bool,
    next_toggle: SimTime,
}

/// Owns a [`Dut`] and advances simulation time over it.
pub struct Simulator<D: Dut> {
    dut: D,
    now: SimTime,
    clock: Option<RunningClock>,
    /// Whether inputs changed since the last `eval`.
    dirty: bool,
}

impl<D: Dut> Simulator<D> {
    pub fn new(dut: D) -> Self {
        Self {
            dut,
            now: SimTime::ZERO,
            clock: None,
            dirty: true,
        }
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    /// Direct access bypasses the direction and ownership checks.
    pub fn dut_mut(&mut self) -> &mut D {
        self.dirty = true;
        &mut self.dut
    }

    pub fn into_dut(self) -> D {
        self.dut
    }

    /// The current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Starts `clock` in the background: its signal is driven low now and
    /// toggles every half-period until the simulator is dropped.
    pub fn start_clock(&mut self, clock: Clock) -> Result<(), SimError> {
        if let Some(running) = &self.clock {
            return ClockAlreadyRunningSnafu {
                signal: running.clock.signal(),
            }
            .fail();
        }

        let next_toggle = self
            .now
            .checked_add(clock.half_period())
            .context(TimeOverflowSnafu { now: self.now })?;

        log::info!(
            "Starting clock on {} with period {} {}",
            clock.signal(),
            clock.period(),
            clock.unit()
        );
        self.dut.pin(clock.signal(), 0);
        self.dirty = true;
        self.clock = Some(RunningClock {
            clock,
            high: false,
            next_toggle,
        });
        Ok(())
    }

    /// Drives the input `signal`. The value reaches the circuit before the
    /// next clock edge.
    pub fn write(&mut self, signal: Signal, value: u8) -> Result<(), SimError> {
        ensure!(
            signal.direction() == PortDirection::Input,
            InvalidPortDirectionSnafu {
                top_module: self.dut.name(),
                signal,
                direction: signal.direction(),
                attempted_direction: PortDirection::Input,
            }
        );
        ensure!(
            self.clock
                .as_ref()
                .is_none_or(|running| running.clock.signal() != signal),
            SignalOwnedByClockSnafu {
                top_module: self.dut.name(),
                signal,
            }
        );
        ensure!(
            value & !signal.mask() == 0,
            ValueTooWideSnafu {
                top_module: self.dut.name(),
                signal,
                width: signal.width(),
                value,
            }
        );

        log::debug!("{} {} <= {:#04x}", self.now, signal, value);
        self.dut.pin(signal, value);
        self.dirty = true;
        Ok(())
    }

    /// Reads the output `signal` after all prior writes have settled.
    pub fn read(&mut self, signal: Signal) -> Result<u8, SimError> {
        ensure!(
            signal.direction() == PortDirection::Output,
            InvalidPortDirectionSnafu {
                top_module: self.dut.name(),
                signal,
                direction: signal.direction(),
                attempted_direction: PortDirection::Output,
            }
        );
        self.settle();
        Ok(self.dut.read(signal))
    }

    /// Suspends until `cycles` rising edges of the running clock have
    /// elapsed.
    pub fn clock_cycles(&mut self, cycles: u64) -> Result<u64, SimError> {
        self.clock_cycles_on(cycles, Edge::Rising)
    }

    /// Suspends until `cycles` edges of the given polarity have elapsed.
    /// Returns the number of edges waited for.
    pub fn clock_cycles_on(
        &mut self,
        cycles: u64,
        edge: Edge,
    ) -> Result<u64, SimError> {
        ensure!(self.clock.is_some(), NoClockSnafu);

        let mut seen = 0;
        while seen < cycles {
            if self.toggle_clock()? == Some(edge) {
                seen += 1;
            }
        }
        self.settle();
        Ok(seen)
    }

    /// Suspends for a fixed amount of simulation time, performing every
    /// clock toggle scheduled up to and including the target time.
    pub fn wait(
        &mut self,
        amount: u64,
        unit: TimeUnit,
    ) -> Result<(), SimError> {
        let target = SimTime::from_units(amount, unit)
            .and_then(|duration| self.now.checked_add(duration))
            .context(TimeOverflowSnafu { now: self.now })?;

        while self
            .clock
            .as_ref()
            .is_some_and(|running| running.next_toggle <= target)
        {
            self.toggle_clock()?;
        }
        self.now = target;
        self.settle();
        Ok(())
    }

    fn settle(&mut self) {
        if self.dirty {
            self.dut.eval();
            self.dirty = false;
        }
    }

    /// Performs the next scheduled clock toggle. Returns `None` if no clock
    /// is running. A toggle whose successor cannot be scheduled is not
    /// performed.
    fn toggle_clock(&mut self) -> Result<Option<Edge>, SimError> {
        // pending writes land before the edge
        self.settle();

        let Some(running) = self.clock.as_mut() else {
            return Ok(None);
        };
        let next_toggle = running
            .next_toggle
            .checked_add(running.clock.half_period())
            .context(TimeOverflowSnafu {
                now: running.next_toggle,
            })?;
        self.now = running.next_toggle;
        running.high = !running.high;
        running.next_toggle = next_toggle;

        let signal = running.clock.signal();
        let edge = if running.high {
            Edge::Rising
        } else {
            Edge::Falling
        };
        log::trace!("{} {} {:?}", self.now, signal, edge);

        self.dut.pin(signal, running.high as u8);
        self.dut.eval();
        self.dirty = false;
        Ok(Some(edge))
    }
}
