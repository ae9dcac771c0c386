//! RadarPresence - Main entry point
//!
//! On the ESP32-S3:
//! 1. Initialize logging and board peripherals
//! 2. Bring up the sensing engine
//! 3. Start the radar task and the terminal ui task
//! 4. Supervise; halt on the first fatal error
//!
//! On a workstation the same wiring runs against a simulated engine with
//! stdin/stdout as the serial console. Put the terminal in raw mode first
//! (`stty raw -echo`) so keystrokes arrive one by one.

use radar_presence::app::{self, BoardParts, Shared};
use radar_presence::{CancelToken, FaultState, Indicators};

#[cfg(target_os = "espidf")]
fn main() {
    use esp_idf_svc::hal::delay::FreeRtos;
    use radar_presence::config::BoardConfig;
    use radar_presence::hal::{self, Board, EspClock, FreeRtosGate, RadarSensing};

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("{}", app::VERSION);

    let board = match Board::take(&BoardConfig::default()) {
        Ok(board) => board,
        Err(e) => {
            log::error!("board bring-up failed: {}", e);
            hal::halt();
        }
    };
    let gate = match FreeRtosGate::new() {
        Ok(gate) => gate,
        Err(e) => {
            log::error!("console gate: {}", e);
            hal::halt();
        }
    };

    let hw = board.radar.hw_config();
    let mut engine = RadarSensing::new();
    let fault = FaultState::new();
    let cancel = CancelToken::new();

    let shared = Shared {
        gate: &gate,
        terminal: &board.console,
        fault: &fault,
        cancel: &cancel,
    };
    let parts = BoardParts {
        indicators: Indicators::new(board.presence_led, board.absence_led),
        clock: EspClock,
        delay: FreeRtos,
    };

    if let Err(e) = app::run(&mut engine, &hw, shared, parts, hal::apply_task_config) {
        log::error!("{}", e);
    }
    hal::halt();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use radar_presence::gate::CondvarGate;
    use radar_presence::sim::{self, SimulatedEngine, StdClock, StdioTerminal, ThreadDelay, VirtualPin};
    use radar_presence::PresenceEvent;

    if let Err(e) = sim::logger::init(log::LevelFilter::Info) {
        eprintln!("logger: {}", e);
    }

    let terminal = match StdioTerminal::new() {
        Ok(terminal) => terminal,
        Err(e) => {
            log::error!("stdin: {}", e);
            std::process::exit(1);
        }
    };

    // Someone walks in, lingers, leaves, comes back closer
    let mut engine = SimulatedEngine::new().with_events([
        PresenceEvent::In { timestamp_ms: 3_000, distance: 1.8, accuracy: 0.25 },
        PresenceEvent::Out { timestamp_ms: 9_500 },
        PresenceEvent::In { timestamp_ms: 15_000, distance: 0.9, accuracy: 0.15 },
        PresenceEvent::Out { timestamp_ms: 22_000 },
    ]);

    let gate = CondvarGate::new();
    let fault = FaultState::new();
    let cancel = CancelToken::new();

    let shared = Shared {
        gate: &gate,
        terminal: &terminal,
        fault: &fault,
        cancel: &cancel,
    };
    let parts = BoardParts {
        indicators: Indicators::new(VirtualPin::new(), VirtualPin::new()),
        clock: StdClock::new(),
        delay: ThreadDelay,
    };

    let result = app::run(&mut engine, &(), shared, parts, |task| {
        log::debug!("spawning {} ({} bytes stack)", task.name, task.stack_size)
    });
    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
