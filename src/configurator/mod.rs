//! Interactive configurator: single-key menu on the serial console.
//!
//! Keys:
//! - `?` reprint the menu with the current values
//! - `r` edit the maximum presence range
//! - `s` edit the sensitivity
//! - anything else prints a hint
//!
//! Multi-line output runs muted (gate held with `Timeout::Forever`).
//! Between keystrokes the gate is free, so presence lines can print.

pub mod line_buffer;
pub mod line_editor;

use core::fmt::Write;

pub use line_buffer::LineBuffer;

use crate::cancel::CancelToken;
use crate::config::{Parameter, INPUT_POLL_MS, VALUE_MAX_LEN};
use crate::engine::{read_parameter, SensingEngine};
use crate::gate::{ConsoleGate, GateError, Timeout};
use crate::terminal::{Terminal, TerminalError};

/// Shown for a value the engine could not report.
const UNKNOWN_VALUE: &str = "unknown";

/// Configurator error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfiguratorError {
    /// C01: Console gate failed
    Gate(GateError),
    /// C02: Serial port failed or closed
    Terminal(TerminalError),
}

impl ConfiguratorError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Gate(_) => "C01",
            Self::Terminal(_) => "C02",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Gate(_) => "console gate error",
            Self::Terminal(_) => "terminal error",
        }
    }
}

impl core::fmt::Display for ConfiguratorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Gate(e) => write!(f, "{}: {} [{}]", self.code(), self.message(), e),
            Self::Terminal(e) => write!(f, "{}: {} [{}]", self.code(), self.message(), e),
        }
    }
}

impl From<GateError> for ConfiguratorError {
    fn from(e: GateError) -> Self {
        Self::Gate(e)
    }
}

impl From<TerminalError> for ConfiguratorError {
    fn from(e: TerminalError) -> Self {
        Self::Terminal(e)
    }
}

/// Key-driven parameter editor.
///
/// Reads and writes parameters straight through the engine handle; no
/// value is cached here.
pub struct Configurator<'a, E, G, T> {
    engine: &'a E,
    gate: &'a G,
    terminal: &'a T,
    line: LineBuffer,
}

impl<'a, E, G, T> Configurator<'a, E, G, T>
where
    E: SensingEngine,
    G: ConsoleGate,
    T: Terminal,
{
    pub fn new(engine: &'a E, gate: &'a G, terminal: &'a T) -> Self {
        Self {
            engine,
            gate,
            terminal,
            line: LineBuffer::new(),
        }
    }

    /// Task body: menu, then keystrokes until the port fails or `cancel`
    /// fires. Prints a farewell either way.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<(), ConfiguratorError> {
        let result = self.serve(cancel);
        if let Err(ref e) = result {
            log::warn!("terminal ui stopped: {}", e);
        }
        self.print_farewell();
        result
    }

    fn serve(&mut self, cancel: &CancelToken) -> Result<(), ConfiguratorError> {
        self.print_menu()?;

        while !cancel.is_cancelled() {
            if let Some(key) = self.terminal.read_byte(Timeout::Millis(INPUT_POLL_MS))? {
                self.handle_key(key, cancel)?;
            }
        }
        Ok(())
    }

    /// Dispatch one menu keystroke. An edit started here gives up once
    /// `cancel` fires.
    pub fn handle_key(&mut self, key: u8, cancel: &CancelToken) -> Result<(), ConfiguratorError> {
        if key == b'?' {
            return self.print_menu();
        }
        match Parameter::from_key(key) {
            Some(param) => self.edit(param, cancel),
            None => self.print_hint(),
        }
    }

    /// Print every parameter with its editing key and current value.
    pub fn print_menu(&self) -> Result<(), ConfiguratorError> {
        let _muted = self.gate.lock(Timeout::Forever)?;
        let mut out = self.terminal.writer();
        let mut value = [0u8; VALUE_MAX_LEN];

        let _ = writeln!(out, "Select a setting to configure");
        for param in Parameter::ALL {
            let text = read_parameter(self.engine, param.name(), &mut value).unwrap_or(UNKNOWN_VALUE);
            let _ = writeln!(out, "'{}': {} ({})", param.key() as char, param.menu_label(), text);
        }
        let _ = writeln!(out);
        Ok(())
    }

    /// Prompt for a new value, hand it to the engine and report the result.
    fn edit(&mut self, param: Parameter, cancel: &CancelToken) -> Result<(), ConfiguratorError> {
        let muted = self.gate.lock(Timeout::Forever)?;

        let _ = writeln!(self.terminal.writer(), "{}", param.prompt());
        let Some(value) = line_editor::read_line(self.terminal, &muted, &mut self.line, cancel)?
        else {
            return Ok(());
        };

        let status = match self.engine.set_parameter(param.name(), value) {
            Ok(()) => "OK",
            Err(_) => "ERROR",
        };
        let _ = writeln!(self.terminal.writer(), "{}", status);
        Ok(())
    }

    fn print_hint(&self) -> Result<(), ConfiguratorError> {
        let _guard = self.gate.lock(Timeout::Forever)?;
        let _ = writeln!(self.terminal.writer(), "Press '?' to list all radar presence settings");
        Ok(())
    }

    fn print_farewell(&self) {
        // The gate may be the reason we stopped, print regardless
        let _guard = self.gate.lock(Timeout::Forever).ok();
        let _ = writeln!(self.terminal.writer(), "Exiting terminal ui");
    }
}
