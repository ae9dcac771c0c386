//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use radar_presence::gate::CondvarGate;
use radar_presence::sim::SimulatedEngine;
use radar_presence::{
    CancelToken, Clock, ConsoleGate, EngineError, EventMask, GateError, Parameter,
    PresenceListener, SensingEngine, Terminal, TerminalError, Timeout,
};

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Single-task gate that counts what happens to it.
///
/// Never blocks: waiting forever on a taken gate is recorded as a deadlock
/// and fails instead.
#[derive(Default)]
pub struct CountingGate {
    held: AtomicBool,
    contended: AtomicBool,
    acquired: AtomicU32,
    released: AtomicU32,
    refused: AtomicU32,
    unbalanced: AtomicU32,
    deadlocks: AtomicU32,
}

impl CountingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend another task holds the gate.
    pub fn set_contended(&self, contended: bool) {
        self.contended.store(contended, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u32 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }

    /// Acquisitions that timed out.
    pub fn refused(&self) -> u32 {
        self.refused.load(Ordering::SeqCst)
    }

    /// Releases without a matching acquisition.
    pub fn unbalanced(&self) -> u32 {
        self.unbalanced.load(Ordering::SeqCst)
    }

    pub fn deadlocks(&self) -> u32 {
        self.deadlocks.load(Ordering::SeqCst)
    }

    pub fn assert_balanced(&self) {
        assert!(!self.is_held(), "gate left held");
        assert_eq!(self.acquired(), self.released());
        assert_eq!(self.unbalanced(), 0);
        assert_eq!(self.deadlocks(), 0);
    }
}

impl ConsoleGate for CountingGate {
    fn acquire(&self, timeout: Timeout) -> Result<(), GateError> {
        let taken = self.contended.load(Ordering::SeqCst) || self.held.load(Ordering::SeqCst);
        if taken {
            if timeout == Timeout::Forever {
                self.deadlocks.fetch_add(1, Ordering::SeqCst);
                return Err(GateError::Failed);
            }
            self.refused.fetch_add(1, Ordering::SeqCst);
            return Err(GateError::Timeout);
        }
        self.held.store(true, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> Result<(), GateError> {
        if !self.held.swap(false, Ordering::SeqCst) {
            self.unbalanced.fetch_add(1, Ordering::SeqCst);
            return Err(GateError::NotHeld);
        }
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Blocking gate shared by real tasks, checking net outstanding holds.
///
/// Every acquire and release asserts that at most one hold is outstanding
/// and that no release comes without an acquire.
#[derive(Default)]
pub struct HoldTrackingGate {
    inner: CondvarGate,
    holds: AtomicI32,
    peak: AtomicI32,
    acquired: AtomicU32,
}

impl HoldTrackingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds not released yet.
    pub fn holds(&self) -> i32 {
        self.holds.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous holds seen.
    pub fn peak(&self) -> i32 {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u32 {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl ConsoleGate for HoldTrackingGate {
    fn acquire(&self, timeout: Timeout) -> Result<(), GateError> {
        self.inner.acquire(timeout)?;
        let holds = self.holds.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(holds, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        assert!((0..=1).contains(&holds), "{holds} holds after acquire");
        Ok(())
    }

    fn release(&self) -> Result<(), GateError> {
        // Count down first: the next holder may get in as soon as we release
        let holds = self.holds.fetch_sub(1, Ordering::SeqCst) - 1;
        assert!((0..=1).contains(&holds), "{holds} holds after release");
        self.inner.release()
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Terminal fed from a byte script, capturing everything written.
///
/// A closing terminal reports `Closed` once the script is drained. An open
/// one idles like a quiet serial port until [`ScriptedTerminal::close`].
pub struct ScriptedTerminal {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
    open: AtomicBool,
}

impl ScriptedTerminal {
    /// Closes after `input` is consumed.
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: Mutex::new(input.iter().copied().collect()),
            output: Mutex::new(Vec::new()),
            open: AtomicBool::new(false),
        }
    }

    /// Stays open after `input` is consumed.
    pub fn open(input: &[u8]) -> Self {
        let terminal = Self::new(input);
        terminal.open.store(true, Ordering::SeqCst);
        terminal
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.input.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Bytes not read yet.
    pub fn pending_input(&self) -> usize {
        self.input.lock().unwrap().len()
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output.lock().unwrap()).into_owned()
    }

    pub fn clear_output(&self) {
        self.output.lock().unwrap().clear();
    }

    fn pop(&self) -> Option<u8> {
        self.input.lock().unwrap().pop_front()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Terminal for ScriptedTerminal {
    fn write_bytes(&self, bytes: &[u8]) -> Result<(), TerminalError> {
        self.output.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }

    fn read_byte(&self, timeout: Timeout) -> Result<Option<u8>, TerminalError> {
        if let Some(byte) = self.pop() {
            return Ok(Some(byte));
        }
        if !self.is_open() {
            return Err(TerminalError::Closed);
        }

        match timeout {
            Timeout::NoWait => Ok(None),
            Timeout::Millis(ms) => {
                thread::sleep(Duration::from_millis(u64::from(ms)));
                Ok(self.pop())
            }
            Timeout::Forever => loop {
                if let Some(byte) = self.pop() {
                    return Ok(Some(byte));
                }
                if !self.is_open() {
                    return Err(TerminalError::Closed);
                }
                thread::sleep(Duration::from_millis(1));
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Simulated engine that logs every call by name.
pub struct RecordingEngine {
    pub inner: SimulatedEngine,
    calls: Mutex<Vec<&'static str>>,
    failing_reads: bool,
}

impl RecordingEngine {
    pub fn new(inner: SimulatedEngine) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failing_reads: false,
        }
    }

    /// Every `get_parameter` fails.
    pub fn with_failing_reads(mut self) -> Self {
        self.failing_reads = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

impl SensingEngine for RecordingEngine {
    type HwConfig = ();

    fn init(&mut self, hw: &(), mask: EventMask) -> Result<(), EngineError> {
        self.record("init");
        self.inner.init(hw, mask)
    }

    fn register_callback(&mut self) -> Result<(), EngineError> {
        self.record("register_callback");
        self.inner.register_callback()
    }

    fn set_parameter(&self, name: &str, value: &str) -> Result<(), EngineError> {
        self.record("set_parameter");
        self.inner.set_parameter(name, value)
    }

    fn get_parameter(&self, name: &str, out: &mut [u8]) -> Result<usize, EngineError> {
        self.record("get_parameter");
        if self.failing_reads {
            return Err(EngineError::Status(-1));
        }
        self.inner.get_parameter(name, out)
    }

    fn enable(&mut self) -> Result<(), EngineError> {
        self.record("enable");
        self.inner.enable()
    }

    fn process(
        &self,
        timestamp_ms: u64,
        listener: &mut dyn PresenceListener,
    ) -> Result<(), EngineError> {
        self.record("process");
        self.inner.process(timestamp_ms, listener)
    }
}

/// Engine taken through init, callback registration, defaults and enable.
pub fn ready_engine() -> SimulatedEngine {
    let mut engine = SimulatedEngine::new();
    engine.init(&(), EventMask::PRESENCE).unwrap();
    engine.register_callback().unwrap();
    for param in Parameter::ALL {
        engine
            .set_parameter(param.name(), param.default_value())
            .unwrap();
    }
    engine.enable().unwrap();
    engine
}

/// Current text value of `param`.
pub fn value_of<E: SensingEngine>(engine: &E, param: Parameter) -> String {
    let mut buf = [0u8; 256];
    radar_presence::engine::read_parameter(engine, param.name(), &mut buf)
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Clock that advances by `step_ms` on every read.
pub struct TickClock {
    now: Cell<u64>,
    step_ms: u64,
}

impl TickClock {
    pub fn new(step_ms: u64) -> Self {
        Self {
            now: Cell::new(0),
            step_ms,
        }
    }
}

impl Clock for TickClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step_ms);
        now
    }
}

/// Delay that returns at once and fires `cancel` after `steps` delays.
pub struct StepDelay<'a> {
    cancel: &'a CancelToken,
    steps_left: u32,
    pub total_ms: u64,
}

impl<'a> StepDelay<'a> {
    pub fn new(cancel: &'a CancelToken, steps: u32) -> Self {
        Self {
            cancel,
            steps_left: steps,
            total_ms: 0,
        }
    }
}

impl DelayNs for StepDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
        self.steps_left = self.steps_left.saturating_sub(1);
        if self.steps_left == 0 {
            self.cancel.cancel();
        }
    }
}
