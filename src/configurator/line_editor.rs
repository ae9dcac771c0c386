//! Software line editing on a raw serial port.
//!
//! Contract:
//! - runs muted (caller proves it by passing the gate guard)
//! - one byte at a time, polled so a cancel request ends the edit
//! - every byte is echoed; whitespace is echoed but not kept
//! - carriage return ends the line, a newline is echoed after it
//! - at most `LineBuffer::CAPACITY` bytes are read; a line that long ends
//!   without waiting for the carriage return

use super::line_buffer::LineBuffer;
use crate::cancel::CancelToken;
use crate::config::INPUT_POLL_MS;
use crate::gate::{ConsoleGate, GateGuard, Timeout};
use crate::terminal::{Terminal, TerminalError};

/// C `isspace`: space, \t, \n, \v, \f, \r.
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

/// Wait for the next byte, `None` once `cancel` fires.
fn next_byte<T: Terminal + ?Sized>(
    terminal: &T,
    cancel: &CancelToken,
) -> Result<Option<u8>, TerminalError> {
    while !cancel.is_cancelled() {
        if let Some(byte) = terminal.read_byte(Timeout::Millis(INPUT_POLL_MS))? {
            return Ok(Some(byte));
        }
    }
    Ok(None)
}

/// Read one line into `line` and return it.
///
/// Returns `Ok(None)` when `cancel` fires before the line is complete; the
/// partial input is discarded. A line that is not valid UTF-8 comes back
/// empty.
pub fn read_line<'b, T, G>(
    terminal: &T,
    _muted: &GateGuard<'_, G>,
    line: &'b mut LineBuffer,
    cancel: &CancelToken,
) -> Result<Option<&'b str>, TerminalError>
where
    T: Terminal + ?Sized,
    G: ConsoleGate + ?Sized,
{
    line.clear();

    for _ in 0..LineBuffer::CAPACITY {
        let Some(byte) = next_byte(terminal, cancel)? else {
            line.clear();
            terminal.write_bytes(b"\n")?;
            return Ok(None);
        };
        terminal.write_bytes(&[byte])?;

        if byte == b'\r' {
            break;
        }
        if is_space(byte) {
            continue;
        }
        line.push(byte);
    }

    terminal.write_bytes(b"\n")?;
    Ok(Some(line.as_str()))
}
