//! Tests for Gateway module

use super::*;
use crate::config::{KeyFunction, KeyMapping};
use crate::led::{LedColor, LedModel};
use crate::panel::RecordingPanel;
use crate::switcher::{ConnectionState, RecordingSwitcher};
use bytes::Bytes;

type TestGateway = Gateway<RecordingPanel, RecordingSwitcher>;

fn source(key: u16, source: u16) -> KeyMapping {
    KeyMapping {
        source: Some(source),
        ..KeyMapping::new(key, KeyFunction::Source)
    }
}

fn transition(key: u16, style: u8) -> KeyMapping {
    KeyMapping {
        transition: Some(style),
        ..KeyMapping::new(key, KeyFunction::Transition)
    }
}

fn make_test_keys() -> Vec<KeyMapping> {
    vec![
        KeyMapping::new(0, KeyFunction::Cut),
        KeyMapping::new(1, KeyFunction::Auto),
        KeyMapping::new(2, KeyFunction::Ftb),
        transition(3, 0),
        transition(4, 1),
        KeyMapping::new(5, KeyFunction::WipePrev),
        KeyMapping::new(6, KeyFunction::WipeNext),
        KeyMapping::new(7, KeyFunction::ProgramMode),
        KeyMapping::new(8, KeyFunction::Shift),
        KeyMapping::new(9, KeyFunction::ShiftToggle),
        KeyMapping {
            shift_source: Some(5),
            additional_leds: vec![40],
            ..source(10, 1)
        },
        source(11, 2),
        source(12, 3),
        KeyMapping {
            source: Some(1),
            ..KeyMapping::new(13, KeyFunction::SourcePgm)
        },
        KeyMapping::new(14, KeyFunction::BacklightUp),
        KeyMapping::new(15, KeyFunction::BacklightDown),
        KeyMapping {
            shift_source: Some(6),
            ..KeyMapping::new(16, KeyFunction::Source)
        },
    ]
}

fn make_test_config(keys: Vec<KeyMapping>) -> AppConfig {
    AppConfig {
        switcher_ip: "127.0.0.1".to_string(),
        initial_brightness: 100,
        clear_backlight_on_startup: false,
        disable_tbar: false,
        flash_shifted_sources: false,
        show_key_presses: false,
        led_model: LedModel::Dual,
        keys,
    }
}

fn make_gateway(config: AppConfig) -> TestGateway {
    Gateway::new(config, RecordingPanel::default(), RecordingSwitcher::default())
}

/// Gateway with the default test keys, initialized and with recordings cleared
fn make_ready_gateway() -> TestGateway {
    let mut gw = make_gateway(make_test_config(make_test_keys()));
    gw.initialize();
    gw.panel.commands.clear();
    gw
}

fn press(gw: &mut TestGateway, key: u16) {
    gw.on_panel_event(PanelEvent::KeyDown(key));
}

fn release(gw: &mut TestGateway, key: u16) {
    gw.on_panel_event(PanelEvent::KeyUp(key));
}

fn led_color(gw: &TestGateway, key: u16) -> Option<LedColor> {
    gw.panel.last_backlight(key).map(|p| p.color())
}

fn packet(bytes: &[u8]) -> Bytes {
    Bytes::copy_from_slice(bytes)
}

// ===== Startup =====

#[test]
fn test_initialize_turns_mapped_keys_off_and_flashes_sources() {
    let mut gw = make_gateway(make_test_config(make_test_keys()));
    gw.initialize();

    let commands = &gw.panel.commands;
    assert_eq!(commands[0], PanelCommand::SetIntensity(100));
    assert_eq!(commands[1], PanelCommand::SetFrequency(8));

    assert_eq!(gw.panel.backlight_writes(0), vec![LedParams::OFF]);
    assert_eq!(
        gw.panel.backlight_writes(40),
        vec![LedParams::OFF, LedParams::new(LedColor::Red, true)]
    );

    for key in [10, 11, 12, 16] {
        assert_eq!(gw.panel.last_backlight(key), Some(LedParams::new(LedColor::Red, true)));
    }
    // Program-only keys are not part of the attention flash
    assert_eq!(gw.panel.last_backlight(13), Some(LedParams::OFF));
}

#[test]
fn test_initialize_with_bulk_clear() {
    let mut config = make_test_config(make_test_keys());
    config.clear_backlight_on_startup = true;
    let mut gw = make_gateway(config);
    gw.initialize();

    assert_eq!(gw.panel.commands[2], PanelCommand::SetAllBacklights(LedParams::OFF));
    assert!(gw.panel.backlight_writes(0).is_empty());
    assert_eq!(gw.panel.backlight_writes(11), vec![LedParams::new(LedColor::Red, true)]);
}

// ===== Panel input =====

#[test]
fn test_unmapped_keys_are_inert() {
    let mut gw = make_ready_gateway();

    press(&mut gw, 99);
    release(&mut gw, 99);

    assert!(gw.switcher.commands.is_empty());
    assert!(gw.panel.commands.is_empty());
}

#[test]
fn test_transport_keys() {
    let mut gw = make_ready_gateway();

    press(&mut gw, 0);
    press(&mut gw, 1);
    press(&mut gw, 2);
    press(&mut gw, 4);

    assert_eq!(
        gw.switcher.commands,
        vec![
            SwitcherCommand::Cut,
            SwitcherCommand::Auto,
            SwitcherCommand::FadeToBlack,
            SwitcherCommand::SetTransitionStyle(1),
        ]
    );
}

#[test]
fn test_releases_other_than_shift_do_nothing() {
    let mut gw = make_ready_gateway();

    for key in [0, 1, 7, 9, 10, 14] {
        release(&mut gw, key);
    }

    assert!(gw.switcher.commands.is_empty());
    assert!(gw.panel.commands.is_empty());
}

#[test]
fn test_wipe_keys_clamp_to_pattern_range() {
    let mut gw = make_ready_gateway();

    // Unknown pattern counts as 0
    press(&mut gw, 5);
    press(&mut gw, 6);

    gw.on_switcher_event(SwitcherEvent::WipePattern(packet(&[0, 0, 17, 0])));
    press(&mut gw, 6);
    press(&mut gw, 5);

    assert_eq!(
        gw.switcher.commands,
        vec![
            SwitcherCommand::SetWipePattern(0),
            SwitcherCommand::SetWipePattern(1),
            SwitcherCommand::SetWipePattern(17),
            SwitcherCommand::SetWipePattern(16),
        ]
    );
}

#[test]
fn test_source_arms_preview_then_program() {
    let mut gw = make_ready_gateway();

    press(&mut gw, 11);
    press(&mut gw, 7);
    assert_eq!(led_color(&gw, 7), Some(LedColor::Red));
    press(&mut gw, 11);
    press(&mut gw, 7);
    assert_eq!(led_color(&gw, 7), Some(LedColor::Off));
    press(&mut gw, 11);

    assert_eq!(
        gw.switcher.commands,
        vec![
            SwitcherCommand::SetPreview(2),
            SwitcherCommand::SetProgram(2),
            SwitcherCommand::SetPreview(2),
        ]
    );
}

#[test]
fn test_program_source_key_always_arms_program() {
    let mut gw = make_ready_gateway();

    press(&mut gw, 13);
    assert_eq!(gw.switcher.commands, vec![SwitcherCommand::SetProgram(1)]);
}

#[test]
fn test_program_source_key_lights_program_despite_preview_override() {
    // Built directly, so config validation does not reject the flag
    let mut keys = make_test_keys();
    keys.push(KeyMapping {
        source: Some(4),
        always_preview: true,
        ..KeyMapping::new(30, KeyFunction::SourcePgm)
    });
    let mut gw = make_gateway(make_test_config(keys));
    gw.initialize();

    press(&mut gw, 30);
    gw.on_switcher_event(SwitcherEvent::ProgramBus(4));

    assert_eq!(gw.switcher.commands, vec![SwitcherCommand::SetProgram(4)]);
    assert_eq!(led_color(&gw, 30), Some(LedColor::Red));
}

#[test]
fn test_override_flags_force_arming() {
    let mut keys = make_test_keys();
    keys.push(KeyMapping {
        always_preview: true,
        ..source(20, 8)
    });
    keys.push(KeyMapping {
        always_program: true,
        ..source(21, 9)
    });
    let mut gw = make_gateway(make_test_config(keys));
    gw.initialize();

    press(&mut gw, 21);
    press(&mut gw, 7);
    press(&mut gw, 20);

    assert_eq!(
        gw.switcher.commands,
        vec![SwitcherCommand::SetProgram(9), SwitcherCommand::SetPreview(8)]
    );
}

#[test]
fn test_momentary_shift_selects_shift_source() {
    let mut gw = make_ready_gateway();

    press(&mut gw, 8);
    assert!(gw.snapshot().mode.shift_mode());
    assert_eq!(led_color(&gw, 8), Some(LedColor::Red));
    // Latching shift keys show the same flag
    assert_eq!(led_color(&gw, 9), Some(LedColor::Red));
    press(&mut gw, 10);
    // No shift source, falls back to the main source
    press(&mut gw, 11);
    release(&mut gw, 8);
    assert!(!gw.snapshot().mode.shift_mode());
    assert_eq!(led_color(&gw, 8), Some(LedColor::Off));
    press(&mut gw, 10);

    assert_eq!(
        gw.switcher.commands,
        vec![
            SwitcherCommand::SetPreview(5),
            SwitcherCommand::SetPreview(2),
            SwitcherCommand::SetPreview(1),
        ]
    );
}

#[test]
fn test_shift_toggle_latches() {
    let mut gw = make_ready_gateway();

    press(&mut gw, 9);
    release(&mut gw, 9);
    assert!(gw.snapshot().mode.shift_mode());
    assert_eq!(led_color(&gw, 9), Some(LedColor::Red));
    press(&mut gw, 16);

    press(&mut gw, 9);
    assert!(!gw.snapshot().mode.shift_mode());
    assert_eq!(led_color(&gw, 9), Some(LedColor::Off));

    assert_eq!(gw.switcher.commands, vec![SwitcherCommand::SetPreview(6)]);
}

#[test]
fn test_undefined_source_is_a_no_op() {
    let mut gw = make_ready_gateway();

    // Key 16 only has a shift source
    press(&mut gw, 16);

    assert!(gw.switcher.commands.is_empty());
    assert!(gw.panel.commands.is_empty());
}

#[test]
fn test_brightness_keys_clamp() {
    let mut config = make_test_config(make_test_keys());
    config.initial_brightness = 250;
    let mut gw = make_gateway(config);

    press(&mut gw, 14);
    press(&mut gw, 14);
    assert_eq!(gw.snapshot().mode.brightness(), 255);
    assert_eq!(gw.panel.commands.last(), Some(&PanelCommand::SetIntensity(255)));

    for _ in 0..30 {
        press(&mut gw, 15);
    }
    assert_eq!(gw.snapshot().mode.brightness(), 0);
    assert_eq!(gw.panel.commands.last(), Some(&PanelCommand::SetIntensity(0)));
}

// ===== T-bar =====

#[test]
fn test_tbar_sequence() {
    let mut gw = make_ready_gateway();

    for raw in [200, 200, 50] {
        gw.on_panel_event(PanelEvent::Tbar(raw));
    }

    assert_eq!(
        gw.switcher.commands,
        vec![SwitcherCommand::SetTransitionPosition(8039)]
    );
    assert!(gw.snapshot().tbar.is_reversed());
}

#[test]
fn test_tbar_disabled() {
    let mut config = make_test_config(make_test_keys());
    config.disable_tbar = true;
    let mut gw = make_gateway(config);

    for raw in [0, 100, 255] {
        gw.on_panel_event(PanelEvent::Tbar(raw));
    }

    assert!(gw.switcher.commands.is_empty());
    assert_eq!(gw.snapshot().tbar.last_raw(), None);
}

// ===== Switcher sync =====

#[test]
fn test_bus_events_color_sources() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));
    gw.on_switcher_event(SwitcherEvent::PreviewBus(2));

    assert_eq!(led_color(&gw, 10), Some(LedColor::Red));
    assert_eq!(led_color(&gw, 40), Some(LedColor::Red));
    assert_eq!(led_color(&gw, 11), Some(LedColor::Blue));
    assert_eq!(led_color(&gw, 12), Some(LedColor::Off));
    assert_eq!(led_color(&gw, 13), Some(LedColor::Red));

    gw.on_switcher_event(SwitcherEvent::PreviewBus(1));
    assert_eq!(led_color(&gw, 10), Some(LedColor::RedBlue));
    assert_eq!(led_color(&gw, 11), Some(LedColor::Off));
}

#[test]
fn test_additional_leds_written_with_primary() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));

    let key_pos = gw
        .panel
        .commands
        .iter()
        .position(|c| matches!(c, PanelCommand::SetBacklight { key: 10, .. }))
        .unwrap();
    assert_eq!(
        gw.panel.commands[key_pos + 1],
        PanelCommand::SetBacklight {
            key: 40,
            params: LedParams::new(LedColor::Red, false)
        }
    );
}

#[test]
fn test_repeated_bus_event_writes_nothing() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));
    let writes = gw.panel.commands.len();
    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));

    assert_eq!(gw.panel.commands.len(), writes);
}

#[test]
fn test_connection_loss_flashes_sources() {
    let mut gw = make_ready_gateway();
    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));
    gw.on_switcher_event(SwitcherEvent::PreviewBus(2));

    gw.on_switcher_event(SwitcherEvent::Connection(ConnectionState::Closed));
    for key in [10, 11, 12] {
        assert_eq!(gw.panel.last_backlight(key), Some(LedParams::new(LedColor::Red, true)));
    }

    gw.on_switcher_event(SwitcherEvent::Connection(ConnectionState::Open));
    assert_eq!(gw.panel.last_backlight(11), Some(LedParams::new(LedColor::Red, true)));

    gw.on_switcher_event(SwitcherEvent::PreviewBus(2));
    assert_eq!(led_color(&gw, 11), Some(LedColor::Blue));
    assert_eq!(led_color(&gw, 12), Some(LedColor::Off));
    assert_eq!(gw.snapshot().switcher.connection, Some(ConnectionState::Open));
}

#[test]
fn test_shift_recomputes_source_lights() {
    let mut config = make_test_config(make_test_keys());
    config.flash_shifted_sources = true;
    let mut gw = make_gateway(config);
    gw.initialize();
    gw.on_switcher_event(SwitcherEvent::ProgramBus(5));

    assert_eq!(led_color(&gw, 10), Some(LedColor::Off));

    press(&mut gw, 8);
    assert_eq!(gw.panel.last_backlight(10), Some(LedParams::new(LedColor::Red, true)));

    release(&mut gw, 8);
    assert_eq!(led_color(&gw, 10), Some(LedColor::Off));
}

#[test]
fn test_transition_packets_drive_auto_keys() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::TransitionPosition(packet(&[0, 1, 0, 0])));
    assert_eq!(gw.panel.last_backlight(1), Some(LedParams::new(LedColor::Red, true)));
    assert!(gw.snapshot().switcher.transitioning);

    gw.on_switcher_event(SwitcherEvent::TransitionPosition(packet(&[0, 1, 0x10, 0])));
    assert_eq!(gw.panel.backlight_writes(1).len(), 1);

    gw.on_switcher_event(SwitcherEvent::TransitionPosition(packet(&[0, 0, 0, 0])));
    assert_eq!(gw.panel.last_backlight(1), Some(LedParams::OFF));
    assert!(!gw.snapshot().switcher.transitioning);
}

#[test]
fn test_fade_to_black_packets_drive_ftb_keys() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::FadeToBlack(packet(&[0, 0, 1, 0])));
    assert_eq!(gw.panel.last_backlight(2), Some(LedParams::new(LedColor::Red, true)));

    gw.on_switcher_event(SwitcherEvent::FadeToBlack(packet(&[0, 1, 0, 0])));
    assert_eq!(gw.panel.backlight_writes(2).len(), 1);

    gw.on_switcher_event(SwitcherEvent::FadeToBlack(packet(&[0, 0, 0, 0])));
    assert_eq!(gw.panel.last_backlight(2), Some(LedParams::OFF));
}

#[test]
fn test_transition_style_selects_one_key() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::TransitionStyle(packet(&[0, 1, 0, 0])));
    assert_eq!(led_color(&gw, 3), None);
    assert_eq!(led_color(&gw, 4), Some(LedColor::Blue));

    gw.on_switcher_event(SwitcherEvent::TransitionStyle(packet(&[0, 0, 0, 0])));
    assert_eq!(led_color(&gw, 3), Some(LedColor::Blue));
    assert_eq!(led_color(&gw, 4), Some(LedColor::Off));
}

#[test]
fn test_wipe_pattern_has_no_led_effect() {
    let mut gw = make_ready_gateway();

    gw.on_switcher_event(SwitcherEvent::WipePattern(packet(&[0, 0, 7, 0])));

    assert_eq!(gw.snapshot().switcher.wipe, Some(7));
    assert!(gw.panel.commands.is_empty());
}

#[test]
fn test_invalidate_rewrites_on_next_recompute() {
    let mut gw = make_ready_gateway();
    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));
    let writes = gw.panel.backlight_writes(10).len();

    gw.invalidate_leds();
    gw.on_switcher_event(SwitcherEvent::ProgramBus(1));

    assert_eq!(gw.panel.backlight_writes(10).len(), writes + 1);
}
