// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Clock sources for mutation timestamps.
//!
//! Queue items are ordered by their creation instant, so producers stamp
//! mutations through a [`ClockSource`]. [`MonotonicClock`] guarantees that
//! two mutations recorded by the same producer never share an instant and
//! never go backwards, even if the wall clock does.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a controllable clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation using `chrono::Utc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now(&self) -> DateTime<Utc> {
        (*self).now()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// A clock whose time only moves when told to.
///
/// Used by replay tooling and tests that need exact instants.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            current: Mutex::new(start),
        }
    }

    /// Sets the current instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A clock that produces strictly increasing instants.
///
/// When the underlying clock stalls or goes backwards, the last issued
/// instant is advanced by one millisecond instead.
pub struct MonotonicClock<C: ClockSource = SystemClock> {
    clock: C,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock<SystemClock> {
    /// Creates a monotonic clock over the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MonotonicClock<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> MonotonicClock<C> {
    /// Creates a monotonic clock over a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        MonotonicClock {
            clock,
            last: Mutex::new(None),
        }
    }
}

impl<C: ClockSource> ClockSource for MonotonicClock<C> {
    fn now(&self) -> DateTime<Utc> {
        let physical = self.clock.now();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let next = match *last {
            Some(prev) if physical <= prev => prev + Duration::milliseconds(1),
            _ => physical,
        };
        *last = Some(next);
        next
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
