//! Local panel modes: program arming, shift layer and backlight brightness
//!
//! These flags only affect what the panel shows and arms. They never feed back
//! into the switcher state.

/// Brightness change per backlight key press
pub const BRIGHTNESS_STEP: u8 = 10;

/// Mode flags owned by the panel input dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    program_mode: bool,
    shift_mode: bool,
    brightness: u8,
}

impl ModeState {
    pub fn new(brightness: u8) -> Self {
        Self {
            program_mode: false,
            shift_mode: false,
            brightness,
        }
    }

    pub fn program_mode(&self) -> bool {
        self.program_mode
    }

    pub fn shift_mode(&self) -> bool {
        self.shift_mode
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Flip program arming, returning the new value
    pub fn toggle_program_mode(&mut self) -> bool {
        self.program_mode = !self.program_mode;
        self.program_mode
    }

    /// Set the momentary shift level
    pub fn set_shift(&mut self, active: bool) {
        self.shift_mode = active;
    }

    /// Flip the latched shift, returning the new value
    pub fn toggle_shift(&mut self) -> bool {
        self.shift_mode = !self.shift_mode;
        self.shift_mode
    }

    pub fn brightness_up(&mut self) -> u8 {
        self.brightness = self.brightness.saturating_add(BRIGHTNESS_STEP);
        self.brightness
    }

    pub fn brightness_down(&mut self) -> u8 {
        self.brightness = self.brightness.saturating_sub(BRIGHTNESS_STEP);
        self.brightness
    }
}
