//! Gateway module - state synchronization between panel and switcher
//!
//! The Gateway owns every piece of runtime state and both collaborators:
//! - Key mapping table resolution
//! - Switcher state tracking and LED recomputation
//! - Panel mode flags (program arming, shift, brightness)
//! - T-bar reconciliation
//! - LED write deduplication
//!
//! Handlers run to completion one event at a time; state is always updated
//! before the matching LED write.

mod panel_input;
mod switcher_sync;

#[cfg(test)]
mod tests;

pub use switcher_sync::source_indicator;

use crate::config::{AppConfig, KeyFunction, KeyMapping};
use crate::led::{LedCache, LedParams};
use crate::mapping::MappingTable;
use crate::mode::ModeState;
use crate::panel::{Panel, PanelCommand, PanelEvent, SCAN_FREQUENCY};
use crate::switcher::{Switcher, SwitcherCommand, SwitcherEvent, SwitcherState};
use crate::tbar::TbarState;
use tracing::{debug, info, warn};

/// Main gateway context
pub struct Gateway<P: Panel, S: Switcher> {
    /// Application configuration
    pub(crate) config: AppConfig,
    /// Key mappings built from the configuration
    pub(crate) mappings: MappingTable,
    /// Last state reported by the switcher
    pub(crate) switcher_state: SwitcherState,
    /// Local panel modes
    pub(crate) mode: ModeState,
    /// T-bar reconciliation state
    pub(crate) tbar: TbarState,
    /// Backlight write cache
    pub(crate) leds: LedCache,
    pub(crate) panel: P,
    pub(crate) switcher: S,
}

/// Point-in-time view of the gateway state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewaySnapshot {
    pub switcher: SwitcherState,
    pub mode: ModeState,
    pub tbar: TbarState,
}

impl<P: Panel, S: Switcher> Gateway<P, S> {
    /// Create a new gateway; call [`Gateway::initialize`] before routing events
    pub fn new(config: AppConfig, panel: P, switcher: S) -> Self {
        let mappings = MappingTable::new(&config.keys);
        let mode = ModeState::new(config.initial_brightness);
        let leds = LedCache::new(config.led_model);

        Self {
            config,
            mappings,
            switcher_state: SwitcherState::default(),
            mode,
            tbar: TbarState::new(),
            leds,
            panel,
            switcher,
        }
    }

    /// Bring the panel to a known state
    ///
    /// Sets intensity and scan frequency, clears backlights, then flashes the
    /// source keys until the switcher reports its buses.
    pub fn initialize(&mut self) {
        info!(
            "Initializing panel: {} mapped keys, brightness {}",
            self.mappings.len(),
            self.mode.brightness()
        );

        self.send_panel(PanelCommand::SetIntensity(self.mode.brightness()));
        self.send_panel(PanelCommand::SetFrequency(SCAN_FREQUENCY));

        if self.config.clear_backlight_on_startup {
            if let Err(e) = self.leds.clear_all(&mut self.panel, LedParams::OFF) {
                warn!("Failed to clear backlights: {}", e);
            }
        } else {
            for mapping in self.mappings.iter() {
                self.leds.set_led(&mut self.panel, mapping, LedParams::OFF);
            }
        }

        self.flash_all_sources();
    }

    /// Route an event from the panel
    pub fn on_panel_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::KeyDown(key) => self.on_key_down(key),
            PanelEvent::KeyUp(key) => self.on_key_up(key),
            PanelEvent::Tbar(raw) => self.on_tbar(raw),
        }
    }

    /// Route an event from the switcher
    pub fn on_switcher_event(&mut self, event: SwitcherEvent) {
        match event {
            SwitcherEvent::Connection(state) => self.on_connection_state(state),
            SwitcherEvent::PreviewBus(source) => self.on_preview_bus(source),
            SwitcherEvent::ProgramBus(source) => self.on_program_bus(source),
            SwitcherEvent::TransitionPosition(packet) => self.on_transition_position(&packet),
            SwitcherEvent::FadeToBlack(packet) => self.on_fade_to_black(&packet),
            SwitcherEvent::TransitionStyle(packet) => self.on_transition_style(&packet),
            SwitcherEvent::WipePattern(packet) => self.on_wipe_pattern(&packet),
        }
    }

    pub fn snapshot(&self) -> GatewaySnapshot {
        GatewaySnapshot {
            switcher: self.switcher_state,
            mode: self.mode,
            tbar: self.tbar,
        }
    }

    /// Drop cached LED state; the next recompute rewrites every key
    pub fn invalidate_leds(&mut self) {
        self.leds.invalidate();
    }

    /// Recompute every indicator owned by one function group
    pub(crate) fn set_group<F>(&mut self, function: KeyFunction, params_for: F)
    where
        F: Fn(&KeyMapping) -> LedParams,
    {
        for mapping in self.mappings.by_function(function) {
            let params = params_for(mapping);
            self.leds.set_led(&mut self.panel, mapping, params);
        }
    }

    pub(crate) fn send_command(&mut self, command: SwitcherCommand) {
        debug!("→ Switcher: {:?}", command);
        if let Err(e) = self.switcher.send(command) {
            warn!("Failed to send {:?} to switcher: {}", command, e);
        }
    }

    pub(crate) fn send_panel(&mut self, command: PanelCommand) {
        debug!("→ Panel: {:?}", command);
        if let Err(e) = self.panel.send(command) {
            warn!("Failed to send {:?} to panel: {}", command, e);
        }
    }
}
