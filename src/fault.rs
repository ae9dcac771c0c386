//! Fault state management for RadarPresence.
//!
//! A sensing loop that keeps running after the engine lost sync with the
//! radar reports garbage. A stopped device reports nothing. Every fatal
//! condition therefore lands here, and the supervisor halts on it.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes indicating why sensing stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Engine construction failed: sensor board missing or miswired.
    EngineInit = 1,

    /// Event callback registration rejected.
    CallbackRegistration = 2,

    /// A default parameter was rejected at bring-up.
    DefaultParameters = 3,

    /// Engine refused to start sensing.
    Enable = 4,

    /// Process step failed: engine out of sync with the hardware.
    Process = 5,

    /// A long-running task could not be spawned.
    TaskSpawn = 6,

    /// A long-running task ended abnormally.
    TaskAborted = 7,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::EngineInit,
            2 => FaultCode::CallbackRegistration,
            3 => FaultCode::DefaultParameters,
            4 => FaultCode::Enable,
            5 => FaultCode::Process,
            6 => FaultCode::TaskSpawn,
            7 => FaultCode::TaskAborted,
            _ => FaultCode::None,
        }
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "none",
            FaultCode::EngineInit => "engine init",
            FaultCode::CallbackRegistration => "callback registration",
            FaultCode::DefaultParameters => "default parameters",
            FaultCode::Enable => "enable",
            FaultCode::Process => "process",
            FaultCode::TaskSpawn => "task spawn",
            FaultCode::TaskAborted => "task aborted",
        }
    }
}

/// Thread-safe fault state.
///
/// Set by the sensing task (or bring-up) on a fatal error.
/// Polled by the supervisor, which stops the device.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// // In the sensing task:
/// if let Err(e) = engine.process(now, &mut handler) {
///     FAULT.set(FaultCode::Process, e.status() as u32);
///     return;
/// }
///
/// // In the supervisor:
/// if FAULT.is_active() {
///     cancel.cancel();
///     halt();
/// }
/// ```
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (raw engine status).
    data: AtomicU32,

    /// Total fault count since boot.
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Set fault state.
    ///
    /// Atomically marks the fault active with the given code and data.
    /// Increments the fault counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Check if fault is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Get fault data (raw engine status, if any).
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get a snapshot of the current fault state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_state_basic() {
        let fault = FaultState::new();

        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);
        assert_eq!(fault.count(), 0);

        fault.set(FaultCode::Process, 42);

        assert!(fault.is_active());
        assert_eq!(fault.code(), FaultCode::Process);
        assert_eq!(fault.data(), 42);
        assert_eq!(fault.count(), 1);
    }

    #[test]
    fn test_fault_code_round_trip() {
        for code in [
            FaultCode::None,
            FaultCode::EngineInit,
            FaultCode::CallbackRegistration,
            FaultCode::DefaultParameters,
            FaultCode::Enable,
            FaultCode::Process,
            FaultCode::TaskSpawn,
            FaultCode::TaskAborted,
        ] {
            assert_eq!(FaultCode::from_u8(code as u8), code);
        }
        assert_eq!(FaultCode::from_u8(200), FaultCode::None);
    }

    #[test]
    fn test_snapshot_reflects_last_fault() {
        let fault = FaultState::new();
        fault.set(FaultCode::EngineInit, 1);
        fault.set(FaultCode::Process, 7);

        let snap = fault.snapshot();
        assert!(snap.active);
        assert_eq!(snap.code, FaultCode::Process);
        assert_eq!(snap.data, 7);
        assert_eq!(snap.count, 2);
    }
}
