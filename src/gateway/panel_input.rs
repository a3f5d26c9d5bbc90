//! Panel input handling and routing to switcher commands

use crate::config::{KeyFunction, KeyMapping};
use crate::led::{LedColor, LedParams};
use crate::panel::{Panel, PanelCommand};
use crate::switcher::{Switcher, SwitcherCommand, WIPE_PATTERN_MAX};
use tracing::{debug, info, trace};

impl<P: Panel, S: Switcher> super::Gateway<P, S> {
    /// Process a key press
    ///
    /// Unmapped keys are ignored.
    pub(super) fn on_key_down(&mut self, key: u16) {
        if self.config.show_key_presses {
            info!("Key {} pressed", key);
        }

        let Some(mapping) = self.mappings.lookup(key).cloned() else {
            trace!("Key {} is not mapped", key);
            return;
        };

        debug!("Key {} pressed: {:?}", key, mapping.function);

        match mapping.function {
            KeyFunction::Cut => self.send_command(SwitcherCommand::Cut),
            KeyFunction::Auto => self.send_command(SwitcherCommand::Auto),
            KeyFunction::Ftb => self.send_command(SwitcherCommand::FadeToBlack),
            KeyFunction::Transition => {
                if let Some(style) = mapping.transition {
                    self.send_command(SwitcherCommand::SetTransitionStyle(style));
                }
            }
            KeyFunction::WipePrev | KeyFunction::WipeNext => {
                let current = self.switcher_state.wipe.unwrap_or(0);
                let pattern = if mapping.function == KeyFunction::WipePrev {
                    current.saturating_sub(1)
                } else {
                    current.saturating_add(1)
                };
                let pattern = pattern.min(WIPE_PATTERN_MAX);
                self.send_command(SwitcherCommand::SetWipePattern(pattern));
            }
            KeyFunction::ProgramMode => {
                let on = self.mode.toggle_program_mode();
                debug!("Program mode: {}", on);
                self.leds.set_led(&mut self.panel, &mapping, mode_indicator(on));
            }
            KeyFunction::Shift => {
                self.mode.set_shift(true);
                self.on_shift_changed();
            }
            KeyFunction::ShiftToggle => {
                self.mode.toggle_shift();
                self.on_shift_changed();
            }
            KeyFunction::Source | KeyFunction::SourcePgm => self.select_source(&mapping),
            KeyFunction::BacklightUp => {
                let brightness = self.mode.brightness_up();
                self.send_panel(PanelCommand::SetIntensity(brightness));
            }
            KeyFunction::BacklightDown => {
                let brightness = self.mode.brightness_down();
                self.send_panel(PanelCommand::SetIntensity(brightness));
            }
        }
    }

    /// Process a key release; only momentary shift reacts
    pub(super) fn on_key_up(&mut self, key: u16) {
        let Some(function) = self.mappings.lookup(key).map(|m| m.function) else {
            return;
        };

        if function == KeyFunction::Shift {
            self.mode.set_shift(false);
            self.on_shift_changed();
        }
    }

    /// Process a raw T-bar reading
    pub(super) fn on_tbar(&mut self, raw: u8) {
        if self.config.disable_tbar {
            return;
        }

        if let Some(position) = self.tbar.sample(raw) {
            self.send_command(SwitcherCommand::SetTransitionPosition(position));
        }
    }

    fn select_source(&mut self, mapping: &KeyMapping) {
        let Some(source) = mapping.effective_source(self.mode.shift_mode()) else {
            trace!("Key {} has no source in the active layer", mapping.key);
            return;
        };

        if mapping.arms_program(self.mode.program_mode()) {
            self.send_command(SwitcherCommand::SetProgram(source));
        } else {
            self.send_command(SwitcherCommand::SetPreview(source));
        }
    }

    /// Shift indicators and source assignments follow the shift flag
    fn on_shift_changed(&mut self) {
        let shift = self.mode.shift_mode();
        debug!("Shift: {}", shift);

        for function in [KeyFunction::Shift, KeyFunction::ShiftToggle] {
            self.set_group(function, |_| mode_indicator(shift));
        }
        self.update_source_lights();
    }
}

/// Indicator of a locally owned mode key
fn mode_indicator(on: bool) -> LedParams {
    if on {
        LedParams::new(LedColor::Red, false)
    } else {
        LedParams::OFF
    }
}
