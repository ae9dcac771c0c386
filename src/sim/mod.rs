//! Host simulation of the board.
//!
//! Lets the full application run on a workstation: a scripted engine,
//! the process's stdin/stdout as serial console, LEDs as flags.

pub mod engine;
pub mod logger;
pub mod terminal;

use core::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::bridge::Clock;

pub use engine::SimulatedEngine;
pub use terminal::StdioTerminal;

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Delay that yields the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Output pin backed by a shared flag.
///
/// Clones observe the same level, so a test can keep one while the
/// application drives the other.
#[derive(Debug, Clone, Default)]
pub struct VirtualPin {
    level: Arc<AtomicBool>,
}

impl VirtualPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set_high(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

impl ErrorType for VirtualPin {
    type Error = Infallible;
}

impl OutputPin for VirtualPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.store(false, Ordering::Release);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.store(true, Ordering::Release);
        Ok(())
    }
}
