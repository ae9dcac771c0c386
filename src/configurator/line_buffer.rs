//! Fixed-capacity buffer for one edited value

use crate::config::VALUE_MAX_LEN;

/// Line input buffer
///
/// Holds at most `VALUE_MAX_LEN - 1` bytes, so a value always fits an
/// engine buffer together with its terminator.
pub struct LineBuffer {
    buf: [u8; LineBuffer::CAPACITY],
    len: usize,
}

impl LineBuffer {
    /// Usable bytes.
    pub const CAPACITY: usize = VALUE_MAX_LEN - 1;

    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; Self::CAPACITY],
            len: 0,
        }
    }

    /// Push a byte, ignored once full
    pub fn push(&mut self, c: u8) {
        if self.len < Self::CAPACITY {
            self.buf[self.len] = c;
            self.len += 1;
        }
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get buffer as string slice, empty if not UTF-8
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
