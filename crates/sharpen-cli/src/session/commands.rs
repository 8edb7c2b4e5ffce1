//! Session command parsing
//!
//! Every session command is a dot-command (`.help`, `.target 11`, ...).

use anyhow::{anyhow, Result};

/// Available session commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Show help information
    Help,
    /// Exit the session
    Quit,
    /// Show or change the working directory
    Path(Option<String>),
    /// Count the C# files under the working directory
    Scan,
    /// List rules and whether the current settings run them
    Rules,
    /// Show or change the target C# version
    Target(Option<String>),
    /// Show or change the safe-only policy
    Safe(Option<bool>),
    /// Re-enable a disabled rule
    Enable(String),
    /// Exclude a rule from runs
    Disable(String),
    /// Show or change whether originals are backed up
    Backup(Option<bool>),
    /// Show what a run would change
    Preview,
    /// Run and write the changes
    Apply,
    /// Per-rule counters from the last preview or apply
    Stats,
    /// List the originals backed up by the last apply
    Backups,
    /// Remove backup snapshots older than the given number of days
    Cleanup(u32),
    /// Show the current settings
    Settings,
    /// Persist the current settings
    Save,
}

/// Parse a command string into a SessionCommand
pub fn parse_command(input: &str) -> Result<SessionCommand> {
    let trimmed = input.trim();

    let Some(body) = trimmed.strip_prefix('.') else {
        return Err(anyhow!("Commands must start with '.'"));
    };

    let parts: Vec<&str> = body.split_whitespace().collect();

    if parts.is_empty() {
        return Err(anyhow!("Empty command"));
    }

    match parts[0] {
        "help" | "h" | "?" => Ok(SessionCommand::Help),
        "quit" | "q" | "exit" => Ok(SessionCommand::Quit),
        "path" | "cd" => {
            // Paths may contain spaces
            let rest = body.trim_start()[parts[0].len()..].trim();
            Ok(SessionCommand::Path((!rest.is_empty()).then(|| rest.to_string())))
        }
        "scan" => Ok(SessionCommand::Scan),
        "rules" | "list" => Ok(SessionCommand::Rules),
        "target" | "version" => match parts.len() {
            1 => Ok(SessionCommand::Target(None)),
            2 => Ok(SessionCommand::Target(Some(parts[1].to_string()))),
            _ => Err(anyhow!("Usage: .target [version]")),
        },
        "safe" => Ok(SessionCommand::Safe(parse_toggle(&parts, ".safe")?)),
        "backup" => Ok(SessionCommand::Backup(parse_toggle(&parts, ".backup")?)),
        "enable" => {
            if parts.len() != 2 {
                return Err(anyhow!("Usage: .enable <rule>"));
            }
            Ok(SessionCommand::Enable(parts[1].to_string()))
        }
        "disable" => {
            if parts.len() != 2 {
                return Err(anyhow!("Usage: .disable <rule>"));
            }
            Ok(SessionCommand::Disable(parts[1].to_string()))
        }
        "preview" | "dry-run" => Ok(SessionCommand::Preview),
        "apply" | "run" => Ok(SessionCommand::Apply),
        "stats" => Ok(SessionCommand::Stats),
        "backups" => Ok(SessionCommand::Backups),
        "cleanup" => match parts.get(1..) {
            Some([days]) => days
                .parse()
                .map(SessionCommand::Cleanup)
                .map_err(|_| anyhow!("Usage: .cleanup <days>")),
            _ => Err(anyhow!("Usage: .cleanup <days>")),
        },
        "settings" | "config" => Ok(SessionCommand::Settings),
        "save" => Ok(SessionCommand::Save),
        _ => Err(anyhow!("Unknown command: .{}", parts[0])),
    }
}

fn parse_toggle(parts: &[&str], usage: &str) -> Result<Option<bool>> {
    match parts {
        [_] => Ok(None),
        [_, value] => match value.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(Some(true)),
            "off" | "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(anyhow!("Usage: {usage} [on|off]")),
        },
        _ => Err(anyhow!("Usage: {usage} [on|off]")),
    }
}
