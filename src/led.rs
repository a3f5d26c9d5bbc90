//! Key backlight parameters and the LED write cache
//!
//! The panel exposes two independent backlight channels per key (blue and red),
//! each with an on bit and a flash bit. Single-channel panels are driven through
//! the same model and normalized by [`LedModel`].
//!
//! The cache only suppresses redundant writes. It is never a source of truth and
//! can be invalidated at any time; the cost is at most one redundant write per key.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{trace, warn};

use crate::config::KeyMapping;
use crate::panel::{Panel, PanelCommand};

/// One backlight channel of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Channel {
    pub on: bool,
    pub flash: bool,
}

impl Channel {
    pub const OFF: Channel = Channel {
        on: false,
        flash: false,
    };

    pub const fn lit(flash: bool) -> Self {
        Self { on: true, flash }
    }
}

/// Logical indicator color, mapped onto the two channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Off,
    /// Program / active
    Red,
    /// Preview / selected
    Blue,
    /// On both program and preview
    RedBlue,
}

/// Desired visual state of one key backlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedParams {
    pub blue: Channel,
    pub red: Channel,
}

impl LedParams {
    pub const OFF: LedParams = LedParams {
        blue: Channel::OFF,
        red: Channel::OFF,
    };

    /// Build params for a color. Flash only applies to lit channels.
    pub fn new(color: LedColor, flash: bool) -> Self {
        let (red, blue) = match color {
            LedColor::Off => (false, false),
            LedColor::Red => (true, false),
            LedColor::Blue => (false, true),
            LedColor::RedBlue => (true, true),
        };
        let channel = |on: bool| if on { Channel::lit(flash) } else { Channel::OFF };
        Self {
            blue: channel(blue),
            red: channel(red),
        }
    }

    pub fn color(&self) -> LedColor {
        match (self.red.on, self.blue.on) {
            (false, false) => LedColor::Off,
            (true, false) => LedColor::Red,
            (false, true) => LedColor::Blue,
            (true, true) => LedColor::RedBlue,
        }
    }

    pub fn is_flashing(&self) -> bool {
        (self.red.on && self.red.flash) || (self.blue.on && self.blue.flash)
    }
}

/// Backlight hardware model of the attached panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedModel {
    /// Independent blue and red channels, each with its own flash bit
    #[default]
    Dual,
    /// One color setting with a single flash bit for the whole key
    Single,
}

impl LedModel {
    /// Reduce params to what this hardware can actually show
    pub fn normalize(self, params: LedParams) -> LedParams {
        let mut out = params;
        // Flash on an unlit channel is meaningless on every model
        if !out.red.on {
            out.red.flash = false;
        }
        if !out.blue.on {
            out.blue.flash = false;
        }

        if self == LedModel::Single {
            let flash = out.red.flash || out.blue.flash;
            if out.red.on {
                out.red.flash = flash;
            }
            if out.blue.on {
                out.blue.flash = flash;
            }
        }

        out
    }
}

/// Write-suppressing cache of the last params sent per key index
pub struct LedCache {
    model: LedModel,
    /// Last successfully written params per key
    entries: HashMap<u16, LedParams>,
    /// Value every key holds after a bulk write, until overwritten individually
    baseline: Option<LedParams>,
}

impl LedCache {
    pub fn new(model: LedModel) -> Self {
        Self {
            model,
            entries: HashMap::new(),
            baseline: None,
        }
    }

    /// Last params known to be on the hardware for a key
    pub fn last_sent(&self, key: u16) -> Option<LedParams> {
        self.entries.get(&key).copied().or(self.baseline)
    }

    /// Apply params to a mapping's key and every additional LED mirroring it
    ///
    /// Stops at the first failed write so mirrors never get ahead of the
    /// primary key. Returns the number of hardware writes issued.
    pub fn set_led<P: Panel + ?Sized>(
        &mut self,
        panel: &mut P,
        mapping: &KeyMapping,
        params: LedParams,
    ) -> usize {
        let params = self.model.normalize(params);
        let mut writes = 0;
        for key in mapping.led_keys() {
            match self.write_key(panel, key, params) {
                Ok(true) => writes += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "Failed to set backlight for key {}: {}; skipping remaining LEDs of key {}",
                        key, e, mapping.key
                    );
                    break;
                }
            }
        }
        writes
    }

    fn write_key<P: Panel + ?Sized>(
        &mut self,
        panel: &mut P,
        key: u16,
        params: LedParams,
    ) -> Result<bool> {
        if self.last_sent(key) == Some(params) {
            trace!("LED {} unchanged, write suppressed", key);
            return Ok(false);
        }

        panel.send(PanelCommand::SetBacklight { key, params })?;
        self.entries.insert(key, params);
        Ok(true)
    }

    /// Set every backlight at once, bypassing the cache
    ///
    /// All per-key entries are superseded by the bulk value.
    pub fn clear_all<P: Panel + ?Sized>(&mut self, panel: &mut P, params: LedParams) -> Result<()> {
        let params = self.model.normalize(params);
        self.invalidate();
        panel.send(PanelCommand::SetAllBacklights(params))?;
        self.baseline = Some(params);
        Ok(())
    }

    /// Forget everything; the next write to each key goes through
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.baseline = None;
    }
}
