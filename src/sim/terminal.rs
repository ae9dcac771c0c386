//! Terminal on the host's stdin/stdout.
//!
//! Expects a raw-mode terminal (`stty raw -echo`), like a serial monitor:
//! Enter must arrive as a carriage return and nothing may be echoed
//! locally. Output newlines are expanded to CR LF.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::gate::Timeout;
use crate::terminal::{Terminal, TerminalError};

/// Stdio-backed [`Terminal`].
///
/// A reader thread forwards stdin bytes; end of input closes the port.
pub struct StdioTerminal {
    input: Mutex<Receiver<u8>>,
}

impl StdioTerminal {
    pub fn new() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin reader".into())
            .spawn(move || {
                for byte in io::stdin().lock().bytes() {
                    let Ok(byte) = byte else { break };
                    if tx.send(byte).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            input: Mutex::new(rx),
        })
    }
}

impl Terminal for StdioTerminal {
    fn write_bytes(&self, bytes: &[u8]) -> Result<(), TerminalError> {
        let mut out = io::stdout().lock();
        for chunk in bytes.split_inclusive(|&b| b == b'\n') {
            match chunk.split_last() {
                Some((b'\n', body)) => {
                    out.write_all(body).map_err(|_| TerminalError::Io)?;
                    out.write_all(b"\r\n").map_err(|_| TerminalError::Io)?;
                }
                _ => out.write_all(chunk).map_err(|_| TerminalError::Io)?,
            }
        }
        out.flush().map_err(|_| TerminalError::Io)
    }

    fn read_byte(&self, timeout: Timeout) -> Result<Option<u8>, TerminalError> {
        let input = self.input.lock().map_err(|_| TerminalError::Io)?;
        match timeout {
            Timeout::NoWait => match input.try_recv() {
                Ok(byte) => Ok(Some(byte)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(TerminalError::Closed),
            },
            Timeout::Millis(ms) => {
                match input.recv_timeout(Duration::from_millis(u64::from(ms))) {
                    Ok(byte) => Ok(Some(byte)),
                    Err(RecvTimeoutError::Timeout) => Ok(None),
                    Err(RecvTimeoutError::Disconnected) => Err(TerminalError::Closed),
                }
            }
            Timeout::Forever => input.recv().map(Some).map_err(|_| TerminalError::Closed),
        }
    }
}
