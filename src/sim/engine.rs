//! Simulated sensing engine.
//!
//! Honours the engine contract (lifecycle order, parameter validation,
//! event subscription) without any radar behind it. Presence events come
//! from a script and are delivered once the process timestamp reaches them.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::config::params::parse_range;
use crate::config::{Parameter, Sensitivity};
use crate::engine::{EngineError, EventMask, PresenceEvent, PresenceListener, SensingEngine};

/// Raw status returned by an injected process failure.
pub const SIM_PROCESS_FAULT: i32 = -100;

struct SimState {
    initialized: bool,
    mask: EventMask,
    callback_registered: bool,
    enabled: bool,
    range_max: String,
    sensitivity: Sensitivity,
    script: VecDeque<PresenceEvent>,
    fail_at_ms: Option<u64>,
    process_calls: u64,
}

/// Host stand-in for the vendor engine.
pub struct SimulatedEngine {
    connected: bool,
    state: Mutex<SimState>,
}

impl SimulatedEngine {
    /// Engine with a sensor board attached.
    pub fn new() -> Self {
        Self::with_connection(true)
    }

    /// Engine whose board does not answer: `init` fails.
    pub fn disconnected() -> Self {
        Self::with_connection(false)
    }

    fn with_connection(connected: bool) -> Self {
        Self {
            connected,
            state: Mutex::new(SimState {
                initialized: false,
                mask: EventMask::PRESENCE,
                callback_registered: false,
                enabled: false,
                range_max: canonical_range(Parameter::MaxRange.default_value()),
                sensitivity: Sensitivity::Medium,
                script: VecDeque::new(),
                fail_at_ms: None,
                process_calls: 0,
            }),
        }
    }

    /// Queue events; each fires at its own timestamp.
    pub fn with_events(self, events: impl IntoIterator<Item = PresenceEvent>) -> Self {
        for event in events {
            self.push_event(event);
        }
        self
    }

    /// Fail every process step at or after `timestamp_ms`.
    pub fn fail_process_at(self, timestamp_ms: u64) -> Self {
        self.lock().fail_at_ms = Some(timestamp_ms);
        self
    }

    /// Queue one event, keeping the script ordered by timestamp.
    pub fn push_event(&self, event: PresenceEvent) {
        let mut state = self.lock();
        let at = state
            .script
            .iter()
            .position(|e| e.timestamp_ms() > event.timestamp_ms())
            .unwrap_or(state.script.len());
        state.script.insert(at, event);
    }

    /// Events not yet delivered.
    pub fn pending_events(&self) -> usize {
        self.lock().script.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn process_calls(&self) -> u64 {
        self.lock().process_calls
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not take the engine down with it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored form of a range value.
fn canonical_range(value: &str) -> String {
    match parse_range(value) {
        Some(meters) => format!("{:.2}", meters),
        None => String::from(value),
    }
}

impl SensingEngine for SimulatedEngine {
    type HwConfig = ();

    fn init(&mut self, _hw: &(), mask: EventMask) -> Result<(), EngineError> {
        if !self.connected {
            return Err(EngineError::NotConnected);
        }
        let mut state = self.lock();
        state.initialized = true;
        state.mask = mask;
        Ok(())
    }

    fn register_callback(&mut self) -> Result<(), EngineError> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(EngineError::NotInitialized);
        }
        state.callback_registered = true;
        Ok(())
    }

    fn set_parameter(&self, name: &str, value: &str) -> Result<(), EngineError> {
        let param = Parameter::from_name(name).ok_or(EngineError::UnknownParameter)?;
        let mut state = self.lock();
        if !state.initialized {
            return Err(EngineError::NotInitialized);
        }

        match param {
            Parameter::MaxRange => {
                let meters = parse_range(value).ok_or(EngineError::InvalidValue)?;
                state.range_max = format!("{:.2}", meters);
            }
            Parameter::Sensitivity => {
                state.sensitivity = value.parse().map_err(|_| EngineError::InvalidValue)?;
            }
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str, out: &mut [u8]) -> Result<usize, EngineError> {
        let param = Parameter::from_name(name).ok_or(EngineError::UnknownParameter)?;
        let state = self.lock();
        let value = match param {
            Parameter::MaxRange => state.range_max.as_str(),
            Parameter::Sensitivity => state.sensitivity.as_str(),
        };

        let bytes = value.as_bytes();
        // Room for the terminator, like the C API
        if out.len() <= bytes.len() {
            return Err(EngineError::BufferTooSmall);
        }
        out[..bytes.len()].copy_from_slice(bytes);
        out[bytes.len()] = 0;
        Ok(bytes.len())
    }

    fn enable(&mut self) -> Result<(), EngineError> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(EngineError::NotInitialized);
        }
        state.enabled = true;
        Ok(())
    }

    fn process(
        &self,
        timestamp_ms: u64,
        listener: &mut dyn PresenceListener,
    ) -> Result<(), EngineError> {
        let due: Vec<PresenceEvent> = {
            let mut state = self.lock();
            state.process_calls += 1;
            if !state.enabled {
                return Err(EngineError::NotEnabled);
            }
            if state.fail_at_ms.is_some_and(|at| timestamp_ms >= at) {
                return Err(EngineError::Status(SIM_PROCESS_FAULT));
            }

            let mut due = Vec::new();
            while state
                .script
                .front()
                .is_some_and(|e| e.timestamp_ms() <= timestamp_ms)
            {
                if let Some(event) = state.script.pop_front() {
                    if state.callback_registered && state.mask.contains(event.class()) {
                        due.push(event);
                    }
                }
            }
            due
        };

        // Deliver without holding the lock so parameter calls stay responsive
        for event in &due {
            listener.on_event(event);
        }
        Ok(())
    }
}
