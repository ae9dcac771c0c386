//! Sensing engine seam.
//!
//! The presence-detection engine is an external black box. Signal
//! processing, calibration and the detection state machine all live behind
//! [`SensingEngine`]; this crate only initializes it, tunes two named
//! parameters and pumps it with timestamps.

/// Classes of events the engine should report.
///
/// Bits are this crate's own; an engine binding maps them onto its
/// library's mask values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask(u32);

impl EventMask {
    /// Presence in / presence out.
    pub const PRESENCE: EventMask = EventMask(1 << 0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Notification that a target entered or left the configured range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresenceEvent {
    /// Target detected at `distance` ± `accuracy` meters.
    In {
        timestamp_ms: u64,
        distance: f32,
        accuracy: f32,
    },
    /// Target no longer detected.
    Out { timestamp_ms: u64 },
}

impl PresenceEvent {
    /// Engine time of the event, ms since boot.
    pub fn timestamp_ms(&self) -> u64 {
        match *self {
            Self::In { timestamp_ms, .. } | Self::Out { timestamp_ms } => timestamp_ms,
        }
    }

    /// Detection interval `[distance - accuracy, distance + accuracy]`.
    pub fn interval(&self) -> Option<(f32, f32)> {
        match *self {
            Self::In {
                distance, accuracy, ..
            } => Some((distance - accuracy, distance + accuracy)),
            Self::Out { .. } => None,
        }
    }

    /// Mask class this event belongs to.
    pub fn class(&self) -> EventMask {
        EventMask::PRESENCE
    }
}

/// Receiver of engine events, called synchronously from inside
/// [`SensingEngine::process`] on the processing task.
pub trait PresenceListener {
    fn on_event(&mut self, event: &PresenceEvent);
}

impl<F: FnMut(&PresenceEvent)> PresenceListener for F {
    fn on_event(&mut self, event: &PresenceEvent) {
        self(event)
    }
}

/// Engine error
///
/// The engine only reports success or failure; the variants exist for
/// diagnostics and are never acted upon individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// R01: Sensor board not responding
    NotConnected,
    /// R02: Operation before `init`
    NotInitialized,
    /// R03: `process` before `enable`
    NotEnabled,
    /// R04: No parameter with that name
    UnknownParameter,
    /// R05: Parameter value rejected
    InvalidValue,
    /// R06: Output buffer cannot hold the value
    BufferTooSmall,
    /// R07: Raw failure status from the engine
    Status(i32),
}

impl EngineError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConnected => "R01",
            Self::NotInitialized => "R02",
            Self::NotEnabled => "R03",
            Self::UnknownParameter => "R04",
            Self::InvalidValue => "R05",
            Self::BufferTooSmall => "R06",
            Self::Status(_) => "R07",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotConnected => "sensor not connected",
            Self::NotInitialized => "engine not initialized",
            Self::NotEnabled => "engine not enabled",
            Self::UnknownParameter => "unknown parameter",
            Self::InvalidValue => "invalid value",
            Self::BufferTooSmall => "buffer too small",
            Self::Status(_) => "engine failure",
        }
    }

    /// Numeric status, recorded as fault data.
    pub fn status(&self) -> i32 {
        match *self {
            Self::Status(raw) => raw,
            Self::NotConnected => 1,
            Self::NotInitialized => 2,
            Self::NotEnabled => 3,
            Self::UnknownParameter => 4,
            Self::InvalidValue => 5,
            Self::BufferTooSmall => 6,
        }
    }
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Status(raw) => write!(f, "{}: {} ({})", self.code(), self.message(), raw),
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

/// Handle to the external detection engine.
///
/// Lifecycle: `init` → `register_callback` → `set_parameter` (defaults) →
/// `enable`, all with exclusive access during bring-up. Afterwards the
/// handle is shared: the processing task calls `process` while the
/// configurator calls `get_parameter`/`set_parameter` concurrently. The
/// engine serializes those internally; callers add no locking of their own.
pub trait SensingEngine: Sync {
    /// Bus and control lines the engine is constructed against.
    type HwConfig;

    /// Construct engine state against the hardware, subscribing to `mask`.
    fn init(&mut self, hw: &Self::HwConfig, mask: EventMask) -> Result<(), EngineError>;

    /// Route engine events to the listener passed to [`Self::process`].
    /// Until this succeeds, events are discarded by the engine.
    fn register_callback(&mut self) -> Result<(), EngineError>;

    /// Set a named parameter from its text form.
    fn set_parameter(&self, name: &str, value: &str) -> Result<(), EngineError>;

    /// Copy a named parameter's text into `out`, returning its length.
    fn get_parameter(&self, name: &str, out: &mut [u8]) -> Result<usize, EngineError>;

    /// Start sensing.
    fn enable(&mut self) -> Result<(), EngineError>;

    /// Run one processing step at `timestamp_ms` (monotonic, since boot).
    ///
    /// Due events are delivered to `listener` before this returns.
    fn process(
        &self,
        timestamp_ms: u64,
        listener: &mut dyn PresenceListener,
    ) -> Result<(), EngineError>;
}

/// Read a parameter as text into `buf`.
pub fn read_parameter<'b, E: SensingEngine + ?Sized>(
    engine: &E,
    name: &str,
    buf: &'b mut [u8],
) -> Result<&'b str, EngineError> {
    let len = engine.get_parameter(name, buf)?;
    let bytes = &buf[..len.min(buf.len())];
    // Engines may hand back a C string, stop at the first NUL
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).map_err(|_| EngineError::InvalidValue)
}
