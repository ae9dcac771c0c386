//! Sensing bridge: engine bring-up, the processing loop and event
//! translation.
//!
//! ```text
//! Uninitialized ──init──▶ Configuring ──defaults, enable──▶ Ready ──run──▶ Running
//!        │                     │                                             │
//!        └─────────────────────┴──────────── any error ──────────▶ Faulted ◀─┘
//! ```
//!
//! Every error is fatal. There is no retry: a failed bring-up means a missing
//! or miswired sensor board, a failed process step means the engine lost
//! sync with the radar.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::cancel::CancelToken;
use crate::config::{Parameter, PROCESS_INTERVAL_MS};
use crate::engine::{EngineError, EventMask, PresenceEvent, PresenceListener, SensingEngine};
use crate::fault::{FaultCode, FaultState};
use crate::gate::{ConsoleGate, Timeout};
use crate::indicator::Indicators;
use crate::terminal::Terminal;

/// Monotonic time source, milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Format one presence event as a console line.
///
/// `<seconds>: Presence IN <lo>-<hi>` or `<seconds>: Presence OUT`.
pub fn write_event_line<W: Write + ?Sized>(out: &mut W, event: &PresenceEvent) -> core::fmt::Result {
    let seconds = event.timestamp_ms() as f64 / 1000.0;
    match event.interval() {
        Some((low, high)) => writeln!(out, "{:.3}: Presence IN {:.2}-{:.2}", seconds, low, high),
        None => writeln!(out, "{:.3}: Presence OUT", seconds),
    }
}

/// Event callback: drives the indicators and prints a best-effort line.
///
/// Runs on the processing task inside the engine's process step, so it
/// never waits for the console. If the configurator holds the gate, the
/// line is dropped; dropping is intended and only counted.
pub struct PresenceHandler<'a, G, T, P, A> {
    gate: &'a G,
    terminal: &'a T,
    indicators: Indicators<P, A>,
    dropped: u32,
}

impl<'a, G, T, P, A> PresenceHandler<'a, G, T, P, A>
where
    G: ConsoleGate,
    T: Terminal,
    P: OutputPin,
    A: OutputPin,
{
    pub fn new(gate: &'a G, terminal: &'a T, indicators: Indicators<P, A>) -> Self {
        Self {
            gate,
            terminal,
            indicators,
            dropped: 0,
        }
    }

    /// Event lines skipped because the console was busy.
    pub fn dropped_prints(&self) -> u32 {
        self.dropped
    }
}

impl<G, T, P, A> PresenceListener for PresenceHandler<'_, G, T, P, A>
where
    G: ConsoleGate,
    T: Terminal,
    P: OutputPin,
    A: OutputPin,
{
    fn on_event(&mut self, event: &PresenceEvent) {
        match event {
            PresenceEvent::In { .. } => self.indicators.show_presence(),
            PresenceEvent::Out { .. } => self.indicators.show_absence(),
        }

        match self.gate.lock(Timeout::NoWait) {
            Ok(_guard) => {
                let _ = write_event_line(&mut self.terminal.writer(), event);
            }
            Err(_) => {
                self.dropped = self.dropped.wrapping_add(1);
                log::trace!("console busy, event line dropped ({} total)", self.dropped);
            }
        }
    }
}

/// Lifecycle of the sensing bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Configuring,
    /// Engine enabled, loop not running
    Ready,
    Running,
    Faulted,
}

/// Fatal bridge error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// B01: Engine construction failed
    Init(EngineError),
    /// B02: Callback registration failed
    RegisterCallback(EngineError),
    /// B03: A default parameter was rejected
    Defaults(Parameter, EngineError),
    /// B04: Engine refused to start
    Enable(EngineError),
    /// B05: Process step failed
    Process(EngineError),
    /// B06: Operation not valid in the current state
    NotReady,
    /// B07: Task could not be spawned
    TaskSpawn,
    /// B08: Task ended abnormally
    TaskAborted,
}

impl BridgeError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Init(_) => "B01",
            Self::RegisterCallback(_) => "B02",
            Self::Defaults(..) => "B03",
            Self::Enable(_) => "B04",
            Self::Process(_) => "B05",
            Self::NotReady => "B06",
            Self::TaskSpawn => "B07",
            Self::TaskAborted => "B08",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Init(_) => "engine init failed",
            Self::RegisterCallback(_) => "callback registration failed",
            Self::Defaults(..) => "default parameter rejected",
            Self::Enable(_) => "engine enable failed",
            Self::Process(_) => "process step failed",
            Self::NotReady => "bridge not ready",
            Self::TaskSpawn => "task spawn failed",
            Self::TaskAborted => "task aborted",
        }
    }

    /// Engine error behind this failure, if any.
    pub fn engine_error(&self) -> Option<EngineError> {
        match *self {
            Self::Init(e)
            | Self::RegisterCallback(e)
            | Self::Defaults(_, e)
            | Self::Enable(e)
            | Self::Process(e) => Some(e),
            Self::NotReady | Self::TaskSpawn | Self::TaskAborted => None,
        }
    }

    pub fn fault_code(&self) -> FaultCode {
        match self {
            Self::Init(_) | Self::NotReady => FaultCode::EngineInit,
            Self::RegisterCallback(_) => FaultCode::CallbackRegistration,
            Self::Defaults(..) => FaultCode::DefaultParameters,
            Self::Enable(_) => FaultCode::Enable,
            Self::Process(_) => FaultCode::Process,
            Self::TaskSpawn => FaultCode::TaskSpawn,
            Self::TaskAborted => FaultCode::TaskAborted,
        }
    }

    /// Console line printed before halting, for the failures a user can act on.
    pub fn diagnostic(&self) -> Option<&'static str> {
        match self {
            Self::Init(_) => Some("ifx_radar_sensing_init error - Radar Wingboard not connected?"),
            Self::Process(_) => Some("ifx_radar_sensing_process error"),
            _ => None,
        }
    }
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        if let Self::Defaults(param, _) = self {
            write!(f, " ({})", param.name())?;
        }
        if let Some(e) = self.engine_error() {
            write!(f, " [{}]", e)?;
        }
        Ok(())
    }
}

/// Owns the event handler and the timing of the processing loop.
///
/// The engine itself is not owned: bring-up borrows it exclusively, the
/// loop borrows it shared so the configurator can reach its parameters.
pub struct SensingBridge<H, C, D> {
    handler: H,
    clock: C,
    delay: D,
    state: BridgeState,
    steps: u64,
}

impl<H, C, D> SensingBridge<H, C, D>
where
    H: PresenceListener,
    C: Clock,
    D: DelayNs,
{
    pub fn new(handler: H, clock: C, delay: D) -> Self {
        Self {
            handler,
            clock,
            delay,
            state: BridgeState::Uninitialized,
            steps: 0,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Process steps completed since start.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Initialize the engine, register the callback, apply the default
    /// parameters and enable sensing.
    ///
    /// Stops at the first failure and leaves the bridge `Faulted`.
    pub fn bring_up<E: SensingEngine>(
        &mut self,
        engine: &mut E,
        hw: &E::HwConfig,
    ) -> Result<(), BridgeError> {
        if self.state != BridgeState::Uninitialized {
            return Err(BridgeError::NotReady);
        }

        let result = self.configure(engine, hw);
        self.state = match result {
            Ok(()) => BridgeState::Ready,
            Err(_) => BridgeState::Faulted,
        };
        result
    }

    fn configure<E: SensingEngine>(
        &mut self,
        engine: &mut E,
        hw: &E::HwConfig,
    ) -> Result<(), BridgeError> {
        engine
            .init(hw, EventMask::PRESENCE)
            .map_err(BridgeError::Init)?;
        log::info!("sensing engine initialized");

        self.state = BridgeState::Configuring;
        engine
            .register_callback()
            .map_err(BridgeError::RegisterCallback)?;

        for param in Parameter::ALL {
            engine
                .set_parameter(param.name(), param.default_value())
                .map_err(|e| BridgeError::Defaults(param, e))?;
            log::info!("{} = {}", param.name(), param.default_value());
        }

        engine.enable().map_err(BridgeError::Enable)?;
        log::info!("sensing engine enabled");
        Ok(())
    }

    /// Pump the engine until `cancel` fires.
    ///
    /// Each step hands the current time to the engine, which may call back
    /// into the handler, then sleeps for the process interval.
    pub fn run<E: SensingEngine>(
        &mut self,
        engine: &E,
        cancel: &CancelToken,
    ) -> Result<(), BridgeError> {
        if self.state != BridgeState::Ready {
            return Err(BridgeError::NotReady);
        }
        self.state = BridgeState::Running;

        while !cancel.is_cancelled() {
            let now = self.clock.now_ms();
            if let Err(e) = engine.process(now, &mut self.handler) {
                self.state = BridgeState::Faulted;
                return Err(BridgeError::Process(e));
            }
            self.steps += 1;
            self.delay.delay_ms(PROCESS_INTERVAL_MS);
        }

        self.state = BridgeState::Ready;
        Ok(())
    }
}

/// Body of the sensing task.
///
/// Runs the loop; on a fatal error prints the diagnostic, records the fault
/// for the supervisor and returns the error.
pub fn radar_task<E, H, C, D, T>(
    bridge: &mut SensingBridge<H, C, D>,
    engine: &E,
    terminal: &T,
    fault: &FaultState,
    cancel: &CancelToken,
) -> Result<(), BridgeError>
where
    E: SensingEngine,
    H: PresenceListener,
    C: Clock,
    D: DelayNs,
    T: Terminal,
{
    let result = bridge.run(engine, cancel);
    if let Err(ref e) = result {
        report_fatal(terminal, fault, e);
    }
    result
}

/// Print the diagnostic for `error` (if any), log it and raise the fault.
///
/// The diagnostic bypasses the console gate: the device stops right after.
pub fn report_fatal<T: Terminal + ?Sized>(terminal: &T, fault: &FaultState, error: &BridgeError) {
    if let Some(text) = error.diagnostic() {
        let _ = writeln!(terminal.writer(), "{}", text);
    }
    log::error!("fatal: {}", error);

    let data = error.engine_error().map(|e| e.status() as u32).unwrap_or(0);
    fault.set(error.fault_code(), data);
}
