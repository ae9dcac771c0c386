//! Serial text console shared by both tasks.
//!
//! The port is byte oriented. Line editing happens in software
//! (see [`crate::configurator::line_editor`]), never in the port.

use crate::gate::Timeout;

/// Terminal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalError {
    /// T01: Port has been torn down
    Closed,
    /// T02: Driver reported an I/O failure
    Io,
}

impl TerminalError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Closed => "T01",
            Self::Io => "T02",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Closed => "port closed",
            Self::Io => "I/O error",
        }
    }
}

impl core::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Byte-oriented serial port.
///
/// Both methods take `&self`: the sensing task writes while the
/// configurator reads and writes. Output ordering between tasks is the
/// console gate's job, not the port's.
pub trait Terminal: Sync {
    /// Write all bytes to the port.
    fn write_bytes(&self, bytes: &[u8]) -> Result<(), TerminalError>;

    /// Read one byte.
    ///
    /// Returns `Ok(None)` when nothing arrived within `timeout`.
    fn read_byte(&self, timeout: Timeout) -> Result<Option<u8>, TerminalError>;

    /// Formatted-text adapter for `write!`/`writeln!`.
    fn writer(&self) -> TermWriter<'_, Self> {
        TermWriter { term: self }
    }
}

/// `core::fmt::Write` on top of a [`Terminal`].
pub struct TermWriter<'a, T: Terminal + ?Sized> {
    term: &'a T,
}

impl<T: Terminal + ?Sized> core::fmt::Write for TermWriter<'_, T> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.term
            .write_bytes(s.as_bytes())
            .map_err(|_| core::fmt::Error)
    }
}
