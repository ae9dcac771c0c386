//! Presence / absence indicator LEDs.
//!
//! Two independent outputs. They are kept mutually exclusive only because
//! every event path switches one on and the other off together.

use embedded_hal::digital::OutputPin;

/// The two indicator outputs driven by presence events.
pub struct Indicators<P, A> {
    presence: P,
    absence: A,
}

impl<P: OutputPin, A: OutputPin> Indicators<P, A> {
    /// Take ownership of both pins and switch them off.
    pub fn new(presence: P, absence: A) -> Self {
        let mut indicators = Self { presence, absence };
        indicators.all_off();
        indicators
    }

    /// Presence on, absence off.
    pub fn show_presence(&mut self) {
        // Pin writes are best effort, a failed LED must not stop sensing
        let _ = self.presence.set_high();
        let _ = self.absence.set_low();
    }

    /// Presence off, absence on.
    pub fn show_absence(&mut self) {
        let _ = self.presence.set_low();
        let _ = self.absence.set_high();
    }

    pub fn all_off(&mut self) {
        let _ = self.presence.set_low();
        let _ = self.absence.set_low();
    }
}
