//! Delay and sound countdown timers.
//!
//! Both count down once per `tick` and stop at zero. The host decides how
//! often to tick them, conventionally 60 Hz.

use serde::{Serialize, Deserialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrement each non-zero timer by one.
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// True while the buzzer should sound.
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}
