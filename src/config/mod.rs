//! Module: config
//!
//! Purpose: Board, bus and task configuration for RadarPresence.
//!
//! Architecture:
//! - Compile-time constants for timing and buffer sizes
//! - [`BoardConfig`]: radar bus, console and pin assignment
//! - [`TaskConfig`]: name, stack and priority of each long-running task
//! - [`params`]: the two engine parameters the console can edit
//!
//! Nothing here is persisted. Every restart comes up with these defaults.

pub mod params;

pub use params::{Parameter, ParseSensitivityError, Sensitivity};

/// Radar SPI clock (25 MHz).
pub const SPI_FREQUENCY_HZ: u32 = 25_000_000;

/// Sleep between two engine process steps.
pub const PROCESS_INTERVAL_MS: u32 = 2;

/// Configurator wait for a keystroke before re-checking for cancellation.
pub const INPUT_POLL_MS: u32 = 10;

/// Supervisor fault check period.
pub const SUPERVISOR_POLL_MS: u32 = 100;

/// Capacity of parameter value buffers, terminator included.
pub const VALUE_MAX_LEN: usize = 256;

/// GPIO numbers of every line the application drives or reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    pub presence_led: i32,
    pub absence_led: i32,
    pub radar_reset: i32,
    pub radar_ldo_en: i32,
    /// Input with pull-down
    pub radar_irq: i32,
    /// Driven by the sensing library, not by the SPI peripheral
    pub spi_cs: i32,
    pub spi_sclk: i32,
    pub spi_mosi: i32,
    pub spi_miso: i32,
    pub console_tx: i32,
    pub console_rx: i32,
}

impl BoardPins {
    fn all(&self) -> [i32; 11] {
        [
            self.presence_led,
            self.absence_led,
            self.radar_reset,
            self.radar_ldo_en,
            self.radar_irq,
            self.spi_cs,
            self.spi_sclk,
            self.spi_mosi,
            self.spi_miso,
            self.console_tx,
            self.console_rx,
        ]
    }

    /// First GPIO number assigned to more than one line.
    pub fn first_duplicate(&self) -> Option<i32> {
        let pins = self.all();
        pins.iter()
            .enumerate()
            .find(|&(i, pin)| pins[i + 1..].contains(pin))
            .map(|(_, pin)| *pin)
    }
}

impl Default for BoardPins {
    fn default() -> Self {
        Self {
            presence_led: 4,
            absence_led: 5,
            radar_reset: 9,
            radar_ldo_en: 8,
            radar_irq: 7,
            spi_cs: 10,
            spi_sclk: 12,
            spi_mosi: 11,
            spi_miso: 13,
            console_tx: 43,
            console_rx: 44,
        }
    }
}

/// Radar bus and console settings.
///
/// SPI transfers are byte wide; the driver has no other word size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// SPI clock in Hz
    pub spi_frequency_hz: u32,
    /// SPI clock polarity/phase mode (0-3)
    pub spi_mode: u8,
    /// Console UART baud rate
    pub console_baud_rate: u32,
    pub pins: BoardPins,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            spi_frequency_hz: SPI_FREQUENCY_HZ,
            spi_mode: 0,
            console_baud_rate: 115_200,
            pins: BoardPins::default(),
        }
    }
}

/// Spawn settings for one long-running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    /// Thread name (also shown in panics)
    pub name: &'static str,
    /// FreeRTOS task name, NUL terminated, at most 16 bytes
    pub rtos_name: &'static [u8],
    /// Stack size in bytes
    pub stack_size: usize,
    /// FreeRTOS priority (higher runs first)
    pub priority: u8,
}

/// Sensing bridge task. Must not be starved: it drives sensor polling.
pub const RADAR_TASK: TaskConfig = TaskConfig {
    name: "RADAR PRESENCE TASK",
    rtos_name: b"radar\0",
    stack_size: 4096,
    priority: 5,
};

/// Terminal configurator task, below the radar task.
pub const TERMINAL_UI_TASK: TaskConfig = TaskConfig {
    name: "RADAR PRESENCE TERMINAL UI",
    rtos_name: b"terminal_ui\0",
    stack_size: 4096,
    priority: 4,
};
