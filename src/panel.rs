//! X-keys panel interface
//!
//! The USB driver lives outside the gateway. It delivers [`PanelEvent`]s and
//! accepts [`PanelCommand`]s through the [`Panel`] trait.

use anyhow::Result;

use crate::led::LedParams;

/// Scan frequency set on the panel at startup
pub const SCAN_FREQUENCY: u8 = 8;

/// Event from the panel hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    KeyDown(u16),
    KeyUp(u16),
    /// Absolute T-bar reading, 0-255
    Tbar(u8),
}

/// Command sent to the panel hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    SetBacklight { key: u16, params: LedParams },
    SetAllBacklights(LedParams),
    SetIntensity(u8),
    SetFrequency(u8),
}

/// Outbound side of the panel driver
///
/// Writes are fire-and-forget: an error means the command could not be handed
/// to the driver, not that the hardware rejected it.
pub trait Panel {
    fn send(&mut self, command: PanelCommand) -> Result<()>;
}

/// Panel double recording every command
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPanel {
    pub commands: Vec<PanelCommand>,
    pub fail_writes: bool,
    /// Reject backlight writes to this key only
    pub failing_key: Option<u16>,
}

#[cfg(test)]
impl RecordingPanel {
    /// Params written to one key, in order
    pub fn backlight_writes(&self, key: u16) -> Vec<LedParams> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                PanelCommand::SetBacklight { key: k, params } if *k == key => Some(*params),
                _ => None,
            })
            .collect()
    }

    /// Last params written to one key
    pub fn last_backlight(&self, key: u16) -> Option<LedParams> {
        self.backlight_writes(key).last().copied()
    }
}

#[cfg(test)]
impl Panel for RecordingPanel {
    fn send(&mut self, command: PanelCommand) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("panel unavailable");
        }
        if let PanelCommand::SetBacklight { key, .. } = &command {
            if self.failing_key == Some(*key) {
                anyhow::bail!("key {} rejected", key);
            }
        }
        self.commands.push(command);
        Ok(())
    }
}
