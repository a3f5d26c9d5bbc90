//! Command-line console
//!
//! Feeds panel and switcher events into the gateway from a terminal and prints
//! every outgoing command. Used when no transport is attached, and for
//! rehearsing a mapping file.

use anyhow::{Context, Result};
use bytes::Bytes;
use colored::*;
use rustyline::DefaultEditor;
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::gateway::GatewaySnapshot;
use crate::led::{LedColor, LedParams};
use crate::mapping::MappingTable;
use crate::panel::{PanelCommand, PanelEvent};
use crate::switcher::{ConnectionState, SwitcherCommand, SwitcherEvent};

/// Input read from the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Panel(PanelEvent),
    Switcher(SwitcherEvent),
    ShowState,
}

const HELP: &[(&str, &str)] = &[
    ("down <key>", "press a key"),
    ("up <key>", "release a key"),
    ("tbar <0-255>", "move the T-bar"),
    ("pvw <source>", "switcher reports preview bus"),
    ("pgm <source>", "switcher reports program bus"),
    ("conn <connecting|open|closed>", "switcher connection state"),
    ("trps <0|1>", "transition in progress flag"),
    ("ftbs <b1> <b2>", "fade-to-black status bytes"),
    ("trss <style>", "selected transition style"),
    ("twpp <pattern>", "selected wipe pattern"),
    ("state", "show gateway state"),
    ("quit", "exit"),
];

/// Parse one console line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(command) = parts.first() else {
        return Ok(None);
    };

    let input = match command.to_lowercase().as_str() {
        "down" => ConsoleInput::Panel(PanelEvent::KeyDown(arg(&parts, 1, "key")?)),
        "up" => ConsoleInput::Panel(PanelEvent::KeyUp(arg(&parts, 1, "key")?)),
        "tbar" => ConsoleInput::Panel(PanelEvent::Tbar(arg(&parts, 1, "position")?)),
        "pvw" => ConsoleInput::Switcher(SwitcherEvent::PreviewBus(arg(&parts, 1, "source")?)),
        "pgm" => ConsoleInput::Switcher(SwitcherEvent::ProgramBus(arg(&parts, 1, "source")?)),
        "conn" => {
            let state = match parts.get(1).map(|s| s.to_lowercase()).as_deref() {
                Some("connecting") => ConnectionState::Connecting,
                Some("open") => ConnectionState::Open,
                Some("closed") => ConnectionState::Closed,
                other => anyhow::bail!("Unknown connection state: {:?}", other),
            };
            ConsoleInput::Switcher(SwitcherEvent::Connection(state))
        }
        "trps" => {
            let flag: u8 = arg(&parts, 1, "flag")?;
            ConsoleInput::Switcher(SwitcherEvent::TransitionPosition(packet(&[0, flag, 0, 0])))
        }
        "ftbs" => {
            let first: u8 = arg(&parts, 1, "byte 1")?;
            let second: u8 = arg(&parts, 2, "byte 2")?;
            ConsoleInput::Switcher(SwitcherEvent::FadeToBlack(packet(&[0, first, second, 0])))
        }
        "trss" => {
            let style: u8 = arg(&parts, 1, "style")?;
            ConsoleInput::Switcher(SwitcherEvent::TransitionStyle(packet(&[0, style, 0, 0])))
        }
        "twpp" => {
            let pattern: u8 = arg(&parts, 1, "pattern")?;
            ConsoleInput::Switcher(SwitcherEvent::WipePattern(packet(&[0, 0, pattern, 0])))
        }
        "state" => ConsoleInput::ShowState,
        other => anyhow::bail!("Unknown command: {}", other),
    };

    Ok(Some(input))
}

fn arg<T>(parts: &[&str], index: usize, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = parts
        .get(index)
        .with_context(|| format!("Missing {}", what))?;
    raw.parse::<T>()
        .with_context(|| format!("Invalid {}: {}", what, raw))
}

fn packet(bytes: &[u8]) -> Bytes {
    Bytes::copy_from_slice(bytes)
}

/// Run the blocking read loop until `quit`, EOF or interrupt
pub fn run_console(tx: mpsc::UnboundedSender<ConsoleInput>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "=== XKeys GW console ===".bold().cyan());
    println!("Type {} for commands\n", "help".yellow());

    loop {
        let readline = rl.readline("xkeys> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                if trimmed == "help" {
                    print_help();
                    continue;
                }
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                }

                match parse_line(trimmed) {
                    Ok(Some(input)) => {
                        if tx.send(input).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{} {:#}", "error:".red(), e),
                }
            }
            Err(_) => break,
        }
    }

    Ok(())
}

pub fn print_help() {
    println!("\n{}", "Commands:".bold());
    for (usage, description) in HELP {
        println!("  {:<34} {}", usage.yellow(), description.dimmed());
    }
    println!();
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

fn describe_params(params: &LedParams) -> ColoredString {
    let name = match params.color() {
        LedColor::Off => "off".dimmed(),
        LedColor::Red => "red".red(),
        LedColor::Blue => "blue".blue(),
        LedColor::RedBlue => "red+blue".magenta(),
    };
    if params.is_flashing() {
        format!("{} (flash)", name).bold()
    } else {
        name
    }
}

pub fn print_panel_command(command: &PanelCommand) {
    let detail = match command {
        PanelCommand::SetBacklight { key, params } => {
            format!("backlight key {} → {}", key, describe_params(params))
        }
        PanelCommand::SetAllBacklights(params) => {
            format!("all backlights → {}", describe_params(params))
        }
        PanelCommand::SetIntensity(level) => format!("intensity {}", level),
        PanelCommand::SetFrequency(frequency) => format!("scan frequency {}", frequency),
    };
    println!("{} {} {}", timestamp().dimmed(), "PANEL".green(), detail);
}

pub fn print_switcher_command(command: &SwitcherCommand) {
    let detail = match command.raw() {
        Some(raw) => format!("{:?} [{} {}]", command, raw.name, hex::encode(&raw.payload)),
        None => format!("{:?}", command),
    };
    println!("{} {} {}", timestamp().dimmed(), "ATEM ".yellow(), detail);
}

pub fn print_snapshot(snapshot: &GatewaySnapshot) {
    let opt = |value: Option<u16>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
    let sw = &snapshot.switcher;

    println!("\n{}", "Gateway state:".bold());
    println!(
        "  Connection:   {}",
        sw.connection
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".into())
    );
    println!("  Program:      {}", opt(sw.program).red());
    println!("  Preview:      {}", opt(sw.preview).blue());
    println!("  Wipe:         {}", opt(sw.wipe.map(u16::from)));
    println!("  Transition:   {}", sw.transitioning);
    println!("  FTB:          {}", sw.fade_to_black);
    println!("  Program mode: {}", snapshot.mode.program_mode());
    println!("  Shift:        {}", snapshot.mode.shift_mode());
    println!("  Brightness:   {}", snapshot.mode.brightness());
    println!(
        "  T-bar:        last={} reversed={}",
        opt(snapshot.tbar.last_raw().map(u16::from)),
        snapshot.tbar.is_reversed()
    );
    println!();
}

/// Print the effective mappings of a configuration
pub fn print_mapping_summary(config: &AppConfig, table: &MappingTable) {
    println!("\n{}", "=== Mapping Summary ===".bold().cyan());
    println!("  Switcher:  {}", config.switcher_ip.bright_white());
    println!("  Keys:      {}", table.len().to_string().green());
    println!("  LED model: {:?}", config.led_model);
    if config.disable_tbar {
        println!("  T-bar:     {}", "disabled".yellow());
    }

    println!("\n{}", "Keys:".bold());
    if table.is_empty() {
        println!("  {}", "no keys mapped; the panel will be inert".yellow());
        return;
    }
    let mut mappings: Vec<_> = table.iter().collect();
    mappings.sort_by_key(|m| m.key);
    for mapping in mappings {
        let mut detail = Vec::new();
        if let Some(source) = mapping.source {
            detail.push(format!("source={}", source));
        }
        if let Some(source) = mapping.shift_source {
            detail.push(format!("shift={}", source));
        }
        if let Some(style) = mapping.transition {
            detail.push(format!("style={}", style));
        }
        if !mapping.additional_leds.is_empty() {
            detail.push(format!("leds={:?}", mapping.additional_leds));
        }
        if mapping.always_program {
            detail.push("always_program".to_string());
        }
        if mapping.always_preview {
            detail.push("always_preview".to_string());
        }

        println!(
            "  {:>4}  {:<16} {}",
            mapping.key.to_string().yellow(),
            format!("{:?}", mapping.function),
            detail.join(" ").dimmed()
        );
    }

    println!("\n{}", "✅ Configuration is valid".green().bold());
}
