//! T-bar position reconciliation
//!
//! The panel reports an absolute fader reading (0-255) while the switcher expects
//! a transition position in 0..=10000. After the fader reaches the far end of a
//! transition the direction is flipped, so the next physical stroke in the other
//! direction drives a new transition from 0 again. The operator rocks the fader
//! back and forth instead of returning it to a fixed start.

use tracing::debug;

/// Highest raw fader reading
pub const RAW_MAX: u8 = 255;

/// Raw readings at or above this at startup start in reversed mode
pub const RAW_MIDPOINT: u8 = 128;

/// Full travel in switcher units
pub const POSITION_MAX: u16 = 10_000;

/// Reconciliation state for one T-bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TbarState {
    last_raw: Option<u8>,
    reversed: bool,
}

impl TbarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_raw(&self) -> Option<u8> {
        self.last_raw
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Feed one raw sample, returning the transition position to send
    pub fn sample(&mut self, raw: u8) -> Option<u16> {
        let Some(last) = self.last_raw else {
            self.last_raw = Some(raw);
            self.reversed = raw >= RAW_MIDPOINT;
            debug!("T-bar initialized at {} (reversed={})", raw, self.reversed);
            return None;
        };

        if raw == last {
            return None;
        }
        self.last_raw = Some(raw);

        let effective = if self.reversed { RAW_MAX - raw } else { raw };
        let position = scale(effective);

        if position == POSITION_MAX {
            self.reversed = !self.reversed;
            debug!("T-bar reached full travel, reversed={}", self.reversed);
        }

        Some(position)
    }
}

/// Scale a raw reading to switcher units, rounding half up
pub fn scale(raw: u8) -> u16 {
    let raw = raw as u32;
    let max = RAW_MAX as u32;
    let scaled = (raw * POSITION_MAX as u32 + max / 2) / max;
    scaled.min(POSITION_MAX as u32) as u16
}

/// Encode a transition position as the big-endian wire pair
pub fn encode_position(position: u16) -> [u8; 2] {
    position.to_be_bytes()
}
