//! Serial console on UART0.

use esp_idf_svc::hal::delay::{TickType, BLOCK, NON_BLOCK};
use esp_idf_svc::hal::uart::UartDriver;

use crate::gate::Timeout;
use crate::terminal::{Terminal, TerminalError};

/// [`Terminal`] over an ESP-IDF UART driver.
///
/// Output newlines go out as CR LF, as serial monitors expect.
pub struct UartTerminal {
    uart: UartDriver<'static>,
}

// SAFETY: the ESP-IDF UART driver locks internally; reads and writes from
// different tasks are allowed.
unsafe impl Sync for UartTerminal {}

impl UartTerminal {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self { uart }
    }

    fn write_all(&self, mut bytes: &[u8]) -> Result<(), TerminalError> {
        while !bytes.is_empty() {
            let n = self.uart.write(bytes).map_err(|_| TerminalError::Io)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

impl Terminal for UartTerminal {
    fn write_bytes(&self, bytes: &[u8]) -> Result<(), TerminalError> {
        for chunk in bytes.split_inclusive(|&b| b == b'\n') {
            match chunk.split_last() {
                Some((b'\n', body)) => {
                    self.write_all(body)?;
                    self.write_all(b"\r\n")?;
                }
                _ => self.write_all(chunk)?,
            }
        }
        Ok(())
    }

    fn read_byte(&self, timeout: Timeout) -> Result<Option<u8>, TerminalError> {
        let ticks = match timeout {
            Timeout::NoWait => NON_BLOCK,
            Timeout::Millis(ms) => TickType::new_millis(u64::from(ms)).ticks(),
            Timeout::Forever => BLOCK,
        };

        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, ticks) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(_) => Err(TerminalError::Io),
        }
    }
}
