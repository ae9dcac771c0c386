//! Hardware Abstraction Layer for RadarPresence.
//!
//! Thin wrappers around ESP-IDF peripherals and the vendor sensing library.
//! Business logic stays in core modules, HAL is just I/O.

pub mod board;
pub mod engine;
pub mod gate;
pub mod terminal;

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
use esp_idf_svc::sys;

use crate::bridge::Clock;
use crate::config::TaskConfig;

pub use board::{Board, RadarBus};
pub use engine::{RadarHwConfig, RadarSensing};
pub use gate::FreeRtosGate;
pub use terminal::UartTerminal;

/// Milliseconds since boot from the high-resolution ESP timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u64 {
        // SAFETY: reads a monotonic 64-bit counter, no preconditions
        let us = unsafe { sys::esp_timer_get_time() };
        (us / 1000) as u64
    }
}

/// Make the next `std::thread` spawn a FreeRTOS task with `task`'s name,
/// stack and priority.
pub fn apply_task_config(task: &TaskConfig) {
    let conf = ThreadSpawnConfiguration {
        name: Some(task.rtos_name),
        stack_size: task.stack_size,
        priority: task.priority,
        ..Default::default()
    };
    if let Err(e) = conf.set() {
        log::warn!("{}: spawn configuration rejected: {}", task.name, e);
    }
}

/// Stop for good. Other tasks keep their state but no new work starts here.
pub fn halt() -> ! {
    log::error!("halted");
    loop {
        FreeRtos::delay_ms(1000);
    }
}
