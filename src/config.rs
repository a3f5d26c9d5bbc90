//! Configuration management for XKeys GW
//!
//! Loads and validates the YAML configuration: switcher address, panel settings and
//! the key mapping table. The configuration is read once at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::fs;
use tracing::warn;

use crate::led::LedModel;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Network address of the switcher
    pub switcher_ip: String,
    /// Backlight intensity applied at startup (0-255)
    #[serde(default = "default_initial_brightness")]
    pub initial_brightness: u8,
    /// Bulk-clear every backlight at startup instead of only the mapped keys
    #[serde(default)]
    pub clear_backlight_on_startup: bool,
    /// Ignore T-bar motion entirely
    #[serde(default)]
    pub disable_tbar: bool,
    /// Flash source keys that are showing their shift-layer source
    #[serde(default)]
    pub flash_shifted_sources: bool,
    /// Log every key press, mapped or not
    #[serde(default)]
    pub show_key_presses: bool,
    /// Backlight hardware model of the panel
    #[serde(default)]
    pub led_model: LedModel,
    /// Key mappings, in file order
    #[serde(default)]
    pub keys: Vec<KeyMapping>,
}

/// Function bound to a physical key
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyFunction {
    Cut,
    Auto,
    Ftb,
    Transition,
    WipePrev,
    WipeNext,
    ProgramMode,
    Shift,
    ShiftToggle,
    Source,
    SourcePgm,
    BacklightUp,
    BacklightDown,
}

/// One configured physical key
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct KeyMapping {
    pub key: u16,
    pub function: KeyFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_source: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<u8>,
    /// Extra key indices whose backlight mirrors this key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_leds: Vec<u16>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub always_program: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub always_preview: bool,
}

impl KeyMapping {
    /// Mapping with only the key and function set
    pub fn new(key: u16, function: KeyFunction) -> Self {
        Self {
            key,
            function,
            source: None,
            shift_source: None,
            transition: None,
            additional_leds: Vec::new(),
            always_program: false,
            always_preview: false,
        }
    }

    /// Primary key followed by every additional LED
    pub fn led_keys(&self) -> impl Iterator<Item = u16> + '_ {
        std::iter::once(self.key).chain(self.additional_leds.iter().copied())
    }

    /// Whether the shift layer applies to this key in the given shift state
    pub fn uses_shift_source(&self, shift: bool) -> bool {
        shift && self.shift_source.is_some()
    }

    /// Source selected by this key, falling back to `source` when no shift source exists
    pub fn effective_source(&self, shift: bool) -> Option<u16> {
        if self.uses_shift_source(shift) {
            self.shift_source
        } else {
            self.source
        }
    }

    /// Whether a press arms the program bus rather than preview
    pub fn arms_program(&self, program_mode: bool) -> bool {
        match self.function {
            KeyFunction::SourcePgm => true,
            _ if self.always_program => true,
            _ if self.always_preview => false,
            _ => program_mode,
        }
    }

    /// Whether this key's indicator may show the preview color
    pub fn shows_preview(&self) -> bool {
        self.function == KeyFunction::Source && !self.always_program
    }

    /// Whether this key's indicator may show the program color
    pub fn shows_program(&self) -> bool {
        self.function == KeyFunction::SourcePgm || !self.always_preview
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_initial_brightness() -> u8 {
    255
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to load config: {}", path))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.switcher_ip.trim().is_empty() {
            anyhow::bail!("switcher_ip cannot be empty");
        }

        let mut seen = HashSet::new();
        for (idx, mapping) in self.keys.iter().enumerate() {
            Self::validate_key_mapping(mapping)
                .with_context(|| format!("Invalid mapping #{} (key {})", idx, mapping.key))?;

            if !seen.insert(mapping.key) {
                warn!(
                    "Key {} is mapped more than once; mapping #{} overrides the earlier one",
                    mapping.key, idx
                );
            }
        }

        Ok(())
    }

    /// Validate a single key mapping
    fn validate_key_mapping(mapping: &KeyMapping) -> Result<()> {
        match mapping.function {
            KeyFunction::Transition => {
                if mapping.transition.is_none() {
                    anyhow::bail!("transition function requires 'transition' field");
                }
            }
            KeyFunction::Source | KeyFunction::SourcePgm => {
                if mapping.source.is_none() && mapping.shift_source.is_none() {
                    anyhow::bail!("source functions require 'source' or 'shift_source'");
                }
                if mapping.function == KeyFunction::SourcePgm && mapping.always_preview {
                    anyhow::bail!("source_pgm always arms program; 'always_preview' is not allowed");
                }
            }
            _ => {}
        }

        if mapping.always_program && mapping.always_preview {
            anyhow::bail!("'always_program' and 'always_preview' are mutually exclusive");
        }

        Ok(())
    }
}
