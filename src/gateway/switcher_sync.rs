//! Switcher event handling and indicator recomputation
//!
//! Indicator params are a pure function of the switcher state and the panel
//! modes. The only side effect here is handing them to the LED cache.

use crate::config::{KeyFunction, KeyMapping};
use crate::led::{LedColor, LedParams};
use crate::panel::Panel;
use crate::switcher::{ConnectionState, Switcher, SwitcherEvent, SwitcherState};
use tracing::{debug, info};

/// Indicator for a `source` or `source_pgm` key
///
/// Program wins over preview, both together show the combined color. A key showing
/// its shift-layer source flashes when `flash_shifted` is set.
pub fn source_indicator(
    mapping: &KeyMapping,
    state: &SwitcherState,
    shift: bool,
    flash_shifted: bool,
) -> LedParams {
    let Some(source) = mapping.effective_source(shift) else {
        return LedParams::OFF;
    };

    let on_program = mapping.shows_program() && state.program == Some(source);
    let on_preview = mapping.shows_preview() && state.preview == Some(source);

    let color = match (on_program, on_preview) {
        (true, true) => LedColor::RedBlue,
        (true, false) => LedColor::Red,
        (false, true) => LedColor::Blue,
        (false, false) => LedColor::Off,
    };

    LedParams::new(color, flash_shifted && mapping.uses_shift_source(shift))
}

/// Indicator for a key that is either active or off
fn active_indicator(active: bool, color: LedColor, flash: bool) -> LedParams {
    if active {
        LedParams::new(color, flash)
    } else {
        LedParams::OFF
    }
}

impl<P: Panel, S: Switcher> super::Gateway<P, S> {
    pub(super) fn on_connection_state(&mut self, state: ConnectionState) {
        info!("Switcher connection state: {}", state);
        self.switcher_state.connection = Some(state);

        if state != ConnectionState::Open {
            self.flash_all_sources();
        }
    }

    /// Attention indicator while the switcher link is down
    ///
    /// Holds until the next bus event recomputes the real state.
    pub(crate) fn flash_all_sources(&mut self) {
        self.set_group(KeyFunction::Source, |_| LedParams::new(LedColor::Red, true));
    }

    pub(super) fn on_preview_bus(&mut self, source: u16) {
        debug!("← Preview bus: {}", source);
        self.switcher_state.preview = Some(source);
        self.update_source_lights();
    }

    pub(super) fn on_program_bus(&mut self, source: u16) {
        debug!("← Program bus: {}", source);
        self.switcher_state.program = Some(source);
        self.update_source_lights();
    }

    /// Recompute every `source` and `source_pgm` indicator
    pub(crate) fn update_source_lights(&mut self) {
        let state = self.switcher_state;
        let shift = self.mode.shift_mode();
        let flash_shifted = self.config.flash_shifted_sources;

        for function in [KeyFunction::Source, KeyFunction::SourcePgm] {
            self.set_group(function, |mapping| {
                source_indicator(mapping, &state, shift, flash_shifted)
            });
        }
    }

    pub(super) fn on_transition_position(&mut self, packet: &[u8]) {
        let transitioning = SwitcherEvent::transitioning(packet);
        if transitioning != self.switcher_state.transitioning {
            debug!("← Transition in progress: {}", transitioning);
            self.switcher_state.transitioning = transitioning;
        }

        // Recomputed on every packet; the LED cache drops the repeats
        self.set_group(KeyFunction::Auto, |_| {
            active_indicator(transitioning, LedColor::Red, true)
        });
    }

    pub(super) fn on_fade_to_black(&mut self, packet: &[u8]) {
        let fade_to_black = SwitcherEvent::fade_to_black(packet);
        if fade_to_black != self.switcher_state.fade_to_black {
            debug!("← Fade to black: {}", fade_to_black);
            self.switcher_state.fade_to_black = fade_to_black;
        }

        self.set_group(KeyFunction::Ftb, |_| {
            active_indicator(fade_to_black, LedColor::Red, true)
        });
    }

    pub(super) fn on_transition_style(&mut self, packet: &[u8]) {
        let style = SwitcherEvent::transition_style(packet);
        debug!("← Transition style: {}", style);

        self.set_group(KeyFunction::Transition, |mapping| {
            active_indicator(mapping.transition == Some(style), LedColor::Blue, false)
        });
    }

    pub(super) fn on_wipe_pattern(&mut self, packet: &[u8]) {
        let pattern = SwitcherEvent::wipe_pattern(packet);
        debug!("← Wipe pattern: {}", pattern);
        self.switcher_state.wipe = Some(pattern);
    }
}
