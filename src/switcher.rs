//! Video switcher interface
//!
//! The protocol client lives outside the gateway. It delivers [`SwitcherEvent`]s
//! (typed bus changes plus a few raw status packets) and accepts
//! [`SwitcherCommand`]s through the [`Switcher`] trait.

use anyhow::Result;
use bytes::Bytes;
use std::fmt;
use tracing::trace;

use crate::tbar::encode_position;

/// Highest wipe pattern index (18 patterns)
pub const WIPE_PATTERN_MAX: u8 = 17;

/// Length of the set-wipe-pattern payload
const WIPE_PAYLOAD_LEN: usize = 20;

/// Switcher link state as reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Event from the switcher client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitcherEvent {
    Connection(ConnectionState),
    PreviewBus(u16),
    ProgramBus(u16),
    /// `TrPs`: bit 0 of byte 1 is the transitioning flag
    TransitionPosition(Bytes),
    /// `FtbS`: bit 0 of byte 1 or byte 2 is the fade-to-black flag
    FadeToBlack(Bytes),
    /// `TrSS`: byte 1 is the selected transition style
    TransitionStyle(Bytes),
    /// `TWpP`: byte 2 is the wipe pattern index
    WipePattern(Bytes),
}

impl SwitcherEvent {
    /// Transitioning flag of a `TrPs` packet
    pub fn transitioning(packet: &[u8]) -> bool {
        packet_byte(packet, 1) & 1 == 1
    }

    /// Fade-to-black flag of an `FtbS` packet
    pub fn fade_to_black(packet: &[u8]) -> bool {
        packet_byte(packet, 1) & 1 == 1 || packet_byte(packet, 2) & 1 == 1
    }

    /// Selected style of a `TrSS` packet
    pub fn transition_style(packet: &[u8]) -> u8 {
        packet_byte(packet, 1)
    }

    /// Pattern index of a `TWpP` packet
    pub fn wipe_pattern(packet: &[u8]) -> u8 {
        packet_byte(packet, 2)
    }
}

/// Packet shape is guaranteed by the client; short packets read as zero
fn packet_byte(packet: &[u8], index: usize) -> u8 {
    match packet.get(index) {
        Some(byte) => *byte,
        None => {
            trace!(
                "Switcher packet too short ({} bytes), reading byte {} as 0",
                packet.len(),
                index
            );
            0
        }
    }
}

/// Command sent to the switcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitcherCommand {
    Cut,
    Auto,
    FadeToBlack,
    SetTransitionStyle(u8),
    SetWipePattern(u8),
    /// Transition position, 0..=10000
    SetTransitionPosition(u16),
    SetProgram(u16),
    SetPreview(u16),
}

/// Raw protocol packet for commands the client sends verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub name: &'static str,
    pub payload: Bytes,
}

impl SwitcherCommand {
    /// Raw packet for this command, if it is not a typed client call
    pub fn raw(&self) -> Option<RawCommand> {
        let (name, payload) = match *self {
            SwitcherCommand::FadeToBlack => ("FtbA", Bytes::from_static(&[0, 2, 0, 0])),
            SwitcherCommand::SetTransitionStyle(style) => {
                ("CTTp", Bytes::copy_from_slice(&[1, 0, style, 0]))
            }
            SwitcherCommand::SetWipePattern(pattern) => {
                let mut data = vec![0u8; WIPE_PAYLOAD_LEN];
                data[1] = 2;
                data[4] = pattern;
                ("CTWp", Bytes::from(data))
            }
            SwitcherCommand::SetTransitionPosition(position) => {
                let [hi, lo] = encode_position(position);
                ("CTPs", Bytes::copy_from_slice(&[0, 0, hi, lo]))
            }
            SwitcherCommand::Cut
            | SwitcherCommand::Auto
            | SwitcherCommand::SetProgram(_)
            | SwitcherCommand::SetPreview(_) => return None,
        };

        Some(RawCommand { name, payload })
    }
}

/// Outbound side of the switcher client, fire-and-forget
pub trait Switcher {
    fn send(&mut self, command: SwitcherCommand) -> Result<()>;
}

/// Last switcher state reported by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitcherState {
    pub connection: Option<ConnectionState>,
    pub preview: Option<u16>,
    pub program: Option<u16>,
    pub wipe: Option<u8>,
    pub transitioning: bool,
    pub fade_to_black: bool,
}

/// Switcher double recording every command
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSwitcher {
    pub commands: Vec<SwitcherCommand>,
}

#[cfg(test)]
impl Switcher for RecordingSwitcher {
    fn send(&mut self, command: SwitcherCommand) -> Result<()> {
        self.commands.push(command);
        Ok(())
    }
}
