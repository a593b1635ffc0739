//! Tunable behavior of the key state machine.

use embassy_time::Duration;

/// Options for configurable keypad behavior.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorConfig {
    pub typing: TypingConfig,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            typing: TypingConfig::default(),
        }
    }
}

/// Pacing of string typing.
///
/// Typing is the part of sequence execution that races the host's scan
/// rate: every shift toggle, key press and key release must be a separate
/// report the host actually observes. These intervals slow the report
/// stream down enough for that.
#[derive(Debug, Clone, Copy)]
pub struct TypingConfig {
    /// Pause after each individual key event (shift toggle, press, release).
    pub key_event_interval: Duration,
    /// Additional pause between consecutive characters.
    pub inter_char_interval: Duration,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            key_event_interval: Duration::from_millis(10),
            inter_char_interval: Duration::from_millis(20),
        }
    }
}
