//! Console gate: a binary lock serializing text output between tasks.
//!
//! The gate is used two ways:
//! - as a short critical section around one printed line
//! - as a "mute": held with [`Timeout::Forever`] for a whole menu or prompt,
//!   which silences the other task for that long
//!
//! The gate is not reentrant. Every successful `acquire` must be paired with
//! exactly one `release`; an unpaired mute leaves the other task's output
//! blocked (or dropped) forever. [`GateGuard`] does the pairing for scoped use.

/// How long `acquire` may wait for the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Fail immediately if the gate is held.
    NoWait,
    /// Wait at most this many milliseconds.
    Millis(u32),
    /// Wait until the gate is released.
    Forever,
}

/// Gate error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// G01: Gate still held when the timeout expired
    Timeout,
    /// G02: Release without a matching acquisition
    NotHeld,
    /// G03: Underlying primitive failed
    Failed,
}

impl GateError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "G01",
            Self::NotHeld => "G02",
            Self::Failed => "G03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Timeout => "gate busy",
            Self::NotHeld => "gate not held",
            Self::Failed => "gate failure",
        }
    }
}

impl core::fmt::Display for GateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Mutual exclusion for console output, shared by reference between tasks.
///
/// No fairness or priority inheritance is promised beyond what the
/// underlying scheduler primitive offers.
pub trait ConsoleGate: Sync {
    /// Take the gate, waiting according to `timeout`.
    fn acquire(&self, timeout: Timeout) -> Result<(), GateError>;

    /// Give the gate back. Only valid after a successful `acquire`.
    fn release(&self) -> Result<(), GateError>;

    /// Take the gate and hand back a guard that releases it on drop.
    fn lock(&self, timeout: Timeout) -> Result<GateGuard<'_, Self>, GateError> {
        self.acquire(timeout)?;
        Ok(GateGuard { gate: self })
    }
}

/// Proof that the gate is held; releases it when dropped.
///
/// Functions that must run muted take `&GateGuard` instead of acquiring the
/// (non-reentrant) gate a second time.
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a, G: ConsoleGate + ?Sized> {
    gate: &'a G,
}

impl<G: ConsoleGate + ?Sized> Drop for GateGuard<'_, G> {
    fn drop(&mut self) {
        let _ = self.gate.release();
    }
}

#[cfg(feature = "std")]
pub use self::condvar::CondvarGate;

#[cfg(feature = "std")]
mod condvar {
    use super::{ConsoleGate, GateError, Timeout};
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    /// Gate built on `std::sync::{Mutex, Condvar}`.
    ///
    /// Binary-semaphore semantics: the holder is not tracked, any thread
    /// may release a held gate.
    pub struct CondvarGate {
        held: Mutex<bool>,
        freed: Condvar,
    }

    impl CondvarGate {
        pub const fn new() -> Self {
            Self {
                held: Mutex::new(false),
                freed: Condvar::new(),
            }
        }

        /// Check whether some task currently holds the gate.
        pub fn is_held(&self) -> bool {
            self.held.lock().map(|held| *held).unwrap_or(true)
        }
    }

    impl Default for CondvarGate {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ConsoleGate for CondvarGate {
        fn acquire(&self, timeout: Timeout) -> Result<(), GateError> {
            let mut held = self.held.lock().map_err(|_| GateError::Failed)?;

            match timeout {
                Timeout::NoWait => {
                    if *held {
                        return Err(GateError::Timeout);
                    }
                }
                Timeout::Forever => {
                    while *held {
                        held = self.freed.wait(held).map_err(|_| GateError::Failed)?;
                    }
                }
                Timeout::Millis(ms) => {
                    let deadline = Instant::now() + Duration::from_millis(u64::from(ms));
                    while *held {
                        let now = Instant::now();
                        if now >= deadline {
                            return Err(GateError::Timeout);
                        }
                        let (guard, _) = self
                            .freed
                            .wait_timeout(held, deadline - now)
                            .map_err(|_| GateError::Failed)?;
                        held = guard;
                    }
                }
            }

            *held = true;
            Ok(())
        }

        fn release(&self) -> Result<(), GateError> {
            let mut held = self.held.lock().map_err(|_| GateError::Failed)?;
            if !*held {
                return Err(GateError::NotHeld);
            }
            *held = false;
            drop(held);
            self.freed.notify_one();
            Ok(())
        }
    }
}
