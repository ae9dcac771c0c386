//! Cooperative cancellation for the task loops.
//!
//! Firmware never cancels; the token exists so a supervisor (or a test)
//! can stop both loops at their next iteration.

use core::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag checked once per loop iteration.
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request every loop holding this token to stop.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
