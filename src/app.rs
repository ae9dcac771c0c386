//! Application wiring: banner, bring-up, the two tasks and their supervisor.
//!
//! ```text
//!  main ──▶ banner ──▶ bring_up ──▶ spawn radar task ─────┐
//!                         │         spawn terminal ui ────┤
//!                         ▼                               ▼
//!                   report + Err            supervise (fault? cancel, join)
//! ```
//!
//! Both tasks borrow the engine, gate and terminal from the caller through
//! scoped threads. `run` returns only on a fatal error or after `cancel`
//! stopped both tasks.

use core::fmt::Write;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::bridge::{radar_task, report_fatal, BridgeError, Clock, PresenceHandler, SensingBridge};
use crate::cancel::CancelToken;
use crate::config::{TaskConfig, RADAR_TASK, SUPERVISOR_POLL_MS, TERMINAL_UI_TASK};
use crate::configurator::Configurator;
use crate::engine::SensingEngine;
use crate::fault::FaultState;
use crate::gate::ConsoleGate;
use crate::indicator::Indicators;
use crate::terminal::Terminal;

/// Build version shown in the banner.
pub const VERSION: &str = env!("VERSION_STRING");

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[;H";
const RULE: &str = "============================================================";
const TITLE: &str = "Connected Sensor Kit: Radar Presence Application on FreeRTOS";

/// Resources both tasks share. Outlive every task.
pub struct Shared<'s, G, T> {
    pub gate: &'s G,
    pub terminal: &'s T,
    pub fault: &'s FaultState,
    pub cancel: &'s CancelToken,
}

// Derived Clone/Copy would require G: Copy and T: Copy
impl<G, T> Clone for Shared<'_, G, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, T> Copy for Shared<'_, G, T> {}

/// Peripherals handed over to the radar task.
pub struct BoardParts<P, A, C, D> {
    pub indicators: Indicators<P, A>,
    pub clock: C,
    pub delay: D,
}

/// Print the start-up banner.
pub fn print_banner<T: Terminal + ?Sized>(terminal: &T) {
    let mut out = terminal.writer();
    let _ = write!(out, "{}", CLEAR_SCREEN);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out, "{}", VERSION);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);
}

/// Run the application.
///
/// `prepare_task` is called right before each task is spawned, so the
/// platform can apply the task's priority and core affinity.
pub fn run<E, G, T, P, A, C, D, F>(
    engine: &mut E,
    hw: &E::HwConfig,
    shared: Shared<'_, G, T>,
    parts: BoardParts<P, A, C, D>,
    prepare_task: F,
) -> Result<(), BridgeError>
where
    E: SensingEngine,
    G: ConsoleGate,
    T: Terminal,
    P: OutputPin + Send,
    A: OutputPin + Send,
    C: Clock + Send,
    D: DelayNs + Send,
    F: Fn(&TaskConfig),
{
    print_banner(shared.terminal);

    let handler = PresenceHandler::new(shared.gate, shared.terminal, parts.indicators);
    let mut bridge = SensingBridge::new(handler, parts.clock, parts.delay);

    if let Err(e) = bridge.bring_up(engine, hw) {
        report_fatal(shared.terminal, shared.fault, &e);
        return Err(e);
    }
    log::info!("bring-up complete, starting tasks");

    let engine: &E = engine;
    let result = thread::scope(|s| {
        prepare_task(&RADAR_TASK);
        let radar = spawn_task(s, &RADAR_TASK, || {
            radar_task(&mut bridge, engine, shared.terminal, shared.fault, shared.cancel)
        })?;

        prepare_task(&TERMINAL_UI_TASK);
        let ui = match spawn_task(s, &TERMINAL_UI_TASK, || {
            // Console errors end the terminal ui only, sensing keeps going
            let _ = Configurator::new(engine, shared.gate, shared.terminal).run(shared.cancel);
        }) {
            Ok(ui) => ui,
            Err(e) => {
                shared.cancel.cancel();
                let _ = radar.join();
                return Err(e);
            }
        };

        supervise(shared, || radar.is_finished() && ui.is_finished(), || radar.is_finished());

        let _ = ui.join();
        radar.join().unwrap_or(Err(BridgeError::TaskAborted))
    });

    match result {
        // The radar task reports its own failures
        Err(BridgeError::Process(_)) => {}
        Err(ref e) => report_fatal(shared.terminal, shared.fault, e),
        Ok(()) => log::info!("tasks stopped"),
    }
    result
}

fn spawn_task<'scope, 'env, R, B>(
    scope: &'scope thread::Scope<'scope, 'env>,
    task: &TaskConfig,
    body: B,
) -> Result<thread::ScopedJoinHandle<'scope, R>, BridgeError>
where
    B: FnOnce() -> R + Send + 'scope,
    R: Send + 'scope,
{
    thread::Builder::new()
        .name(task.name.into())
        .stack_size(task.stack_size)
        .spawn_scoped(scope, body)
        .map_err(|e| {
            log::error!("failed to spawn {}: {}", task.name, e);
            BridgeError::TaskSpawn
        })
}

/// Poll until both tasks are done. A raised fault, or a radar task that
/// stopped on its own, cancels everything.
fn supervise<G, T>(
    shared: Shared<'_, G, T>,
    all_done: impl Fn() -> bool,
    radar_done: impl Fn() -> bool,
) {
    let mut reported = false;
    while !all_done() {
        if shared.fault.is_active() && !reported {
            let snap = shared.fault.snapshot();
            log::error!("fault {} (data {}), stopping tasks", snap.code.as_str(), snap.data);
            reported = true;
        }
        if shared.fault.is_active() || radar_done() {
            shared.cancel.cancel();
        }
        thread::sleep(Duration::from_millis(u64::from(SUPERVISOR_POLL_MS)));
    }
}
