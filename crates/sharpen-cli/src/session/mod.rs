//! Interactive session for sharpen
//!
//! Wraps the registry, persisted settings and batch steps behind a small set
//! of dot-commands:
//! - Working directory and scan (`.path`, `.scan`)
//! - Rule policy (`.target`, `.safe`, `.enable`, `.disable`, `.rules`)
//! - Runs (`.preview`, `.apply`, `.stats`)
//! - Backups (`.backup`, `.backups`, `.cleanup`)
//! - Settings persistence (`.settings`, `.save`)

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use sharpen_core::{LanguageLevel, Registry, RuleStats};
use tracing::debug;

use crate::backup::BackupManager;
use crate::batch;
use crate::config::Settings;
use crate::scanner;

pub mod commands;
pub mod notifier;

pub use commands::SessionCommand;
pub use notifier::{DefaultNotifier, SessionNotifier};

/// Interactive modernization session
pub struct Session {
    registry: Registry,
    settings: Settings,
    /// Where `.save` writes; `None` means `~/.sharpen.json`
    settings_path: Option<PathBuf>,
    notifier: Box<dyn SessionNotifier>,
    running: bool,
    jobs: usize,
    /// Rule counters from the last `.preview` or `.apply`
    last_stats: Vec<RuleStats>,
    /// Snapshot written by the last `.apply`, if it backed anything up
    last_backup: Option<BackupManager>,
}

impl Session {
    pub fn new(registry: Registry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            settings_path: None,
            notifier: Box::new(DefaultNotifier::new()),
            running: true,
            jobs: batch::default_jobs(),
            last_stats: Vec::new(),
            last_backup: None,
        }
    }

    /// Persist settings to `path` instead of the home directory
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn SessionNotifier>) {
        self.notifier = notifier;
    }

    pub fn notifier(&self) -> &dyn SessionNotifier {
        self.notifier.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Parse session input into a command
    pub fn parse_input(&self, input: &str) -> Result<SessionCommand> {
        commands::parse_command(input)
    }

    /// Handle a session command
    pub fn handle_command(&mut self, command: SessionCommand) -> Result<String> {
        debug!(?command, "Handling session command");
        match command {
            SessionCommand::Help => Ok(self.get_help_text()),
            SessionCommand::Quit => {
                self.running = false;
                Ok("Goodbye!".to_string())
            }
            SessionCommand::Path(None) => Ok(format!("Working path: {}", self.working_path().display())),
            SessionCommand::Path(Some(path)) => self.change_path(&path),
            SessionCommand::Scan => self.scan(),
            SessionCommand::Rules => Ok(self.list_rules()),
            SessionCommand::Target(None) => {
                let level = self.settings.target_level();
                Ok(format!("Target: {level} ({})", level.dotnet_version()))
            }
            SessionCommand::Target(Some(version)) => {
                let level: LanguageLevel = version.parse()?;
                self.settings.set_target_level(level);
                Ok(format!("Target set to {level}"))
            }
            SessionCommand::Safe(value) => {
                if let Some(safe_only) = value {
                    self.settings.safe_only = safe_only;
                }
                Ok(format!("Safe rules only: {}", on_off(self.settings.safe_only)))
            }
            SessionCommand::Backup(value) => {
                if let Some(enabled) = value {
                    self.settings.backup_enabled = enabled;
                }
                Ok(format!("Backups: {}", on_off(self.settings.backup_enabled)))
            }
            SessionCommand::Enable(name) => self.toggle_rule(&name, false),
            SessionCommand::Disable(name) => self.toggle_rule(&name, true),
            SessionCommand::Preview => self.preview(),
            SessionCommand::Apply => self.apply(),
            SessionCommand::Stats => self.stats(),
            SessionCommand::Backups => self.list_backups(),
            SessionCommand::Cleanup(days) => self.cleanup_backups(days),
            SessionCommand::Settings => Ok(self.describe_settings()),
            SessionCommand::Save => self.save(),
        }
    }

    fn working_path(&self) -> PathBuf {
        self.settings
            .working_path()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn change_path(&mut self, path: &str) -> Result<String> {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(anyhow!("Path does not exist: {}", path.display()));
        }
        self.settings.working_path = path.to_string_lossy().into_owned();
        Ok(format!("Working path: {}", path.display()))
    }

    fn scan(&self) -> Result<String> {
        let root = self.working_path();
        let files = scanner::scan(&root)?;
        let mut output = format!("Found {} C# files in {}", files.len(), root.display());
        for file in files.iter().take(20) {
            let _ = write!(output, "\n  {}", file.path.display());
        }
        if files.len() > 20 {
            let _ = write!(output, "\n  ... and {} more", files.len() - 20);
        }
        Ok(output)
    }

    fn list_rules(&self) -> String {
        let active: Vec<&'static str> = self
            .settings
            .selection()
            .resolve(&self.registry)
            .iter()
            .map(|rule| rule.name())
            .collect();

        let mut output = format!(
            "Rules for {} ({} active):",
            self.settings.target_level(),
            active.len()
        );
        for (level, rules) in self.registry.group_by_level() {
            let _ = write!(output, "\n{level}");
            for rule in rules {
                let mark = if active.contains(&rule.name()) {
                    "x"
                } else if self.settings.is_rule_disabled(rule.name()) {
                    "-"
                } else {
                    " "
                };
                let kind = if rule.is_advisory() {
                    " (advisory)"
                } else if !rule.is_safe() {
                    " (opt-in)"
                } else {
                    ""
                };
                let _ = write!(output, "\n  [{mark}] {}{kind}: {}", rule.name(), rule.description());
            }
        }
        output
    }

    fn toggle_rule(&mut self, name: &str, disabled: bool) -> Result<String> {
        if self.registry.get(name).is_none() {
            return Err(anyhow!("Unknown rule: {name}"));
        }
        self.settings.set_rule_disabled(name, disabled);
        Ok(format!(
            "Rule {name} {}",
            if disabled { "disabled" } else { "enabled" }
        ))
    }

    fn plan(&self) -> Result<batch::Plan> {
        let rules = self.settings.selection().resolve(&self.registry);
        if rules.is_empty() {
            return Err(anyhow!(
                "No rules selected for {}",
                self.settings.target_level()
            ));
        }
        batch::prepare(&self.working_path(), rules, self.jobs)
    }

    fn preview(&mut self) -> Result<String> {
        let plan = self.plan()?;
        let mut buffer = Vec::new();
        batch::report(&plan, &mut buffer)?;
        self.last_stats = plan.stats;
        Ok(String::from_utf8_lossy(&buffer).trim_end().to_string())
    }

    fn apply(&mut self) -> Result<String> {
        let plan = self.plan()?;
        let manager = self
            .settings
            .backup_enabled
            .then(|| BackupManager::new(&plan.root));
        let summary = batch::apply(&plan, manager.as_ref());
        self.last_stats = plan.stats;
        if summary.backup_dir.is_some() {
            self.last_backup = manager;
        }

        let mut output = format!(
            "Wrote {} of {} changed files ({} transformations)",
            summary.files_written, summary.files_changed, summary.transformations
        );
        if let Some(dir) = &summary.backup_dir {
            let _ = write!(output, "\nBackups stored in {}", dir.display());
        }
        for error in &summary.errors {
            let _ = write!(output, "\nerror: {error}");
        }
        Ok(output)
    }

    fn stats(&self) -> Result<String> {
        if self.last_stats.is_empty() {
            return Ok("No statistics yet; run .preview or .apply first".to_string());
        }
        let mut buffer = Vec::new();
        batch::report_stats(&self.last_stats, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).trim_end().to_string())
    }

    fn list_backups(&self) -> Result<String> {
        let Some(manager) = &self.last_backup else {
            return Ok("No backups made in this session".to_string());
        };
        let files = manager.available()?;
        let mut output = format!(
            "{} files backed up in {}",
            files.len(),
            manager.snapshot_dir().display()
        );
        for file in &files {
            if let Some(name) = file.file_name() {
                let _ = write!(output, "\n  {}", name.to_string_lossy());
            }
        }
        Ok(output)
    }

    fn cleanup_backups(&self, keep_days: u32) -> Result<String> {
        let manager = BackupManager::new(batch::project_root(&self.working_path()));
        let removed = manager.cleanup(keep_days)?;
        Ok(format!(
            "Removed {removed} backup snapshots older than {keep_days} days from {}",
            manager.base_dir().display()
        ))
    }

    fn describe_settings(&self) -> String {
        let level = self.settings.target_level();
        let disabled = if self.settings.disabled_rules.is_empty() {
            "none".to_string()
        } else {
            self.settings.disabled_rules.join(", ")
        };
        format!(
            "Target: {level} ({})\nSafe rules only: {}\nBackups: {}\nDisabled rules: {disabled}\nWorking path: {}",
            level.dotnet_version(),
            on_off(self.settings.safe_only),
            on_off(self.settings.backup_enabled),
            self.working_path().display()
        )
    }

    fn save(&self) -> Result<String> {
        let path = match &self.settings_path {
            Some(path) => {
                self.settings.save_to(path)?;
                path.clone()
            }
            None => self.settings.save().context("Could not save settings")?,
        };
        Ok(format!("Settings saved to {}", path.display()))
    }

    /// Get help text
    fn get_help_text(&self) -> String {
        r#"Sharpen Commands:
  .help              - Show this help message
  .quit              - Exit sharpen
  .path [dir]        - Show or change the working directory
  .scan              - List the C# files that would be processed

Rules:
  .rules             - List rules ([x] active, [-] disabled)
  .target [version]  - Show or set the target C# version (6-13)
  .safe [on|off]     - Restrict runs to safe rules
  .enable <rule>     - Re-enable a disabled rule
  .disable <rule>    - Exclude a rule from runs

Runs:
  .preview           - Show what would change without writing
  .apply             - Rewrite files in the working directory
  .stats             - Per-rule counters from the last preview or apply

Backups:
  .backup [on|off]   - Back up originals before writing
  .backups           - List the files backed up by the last apply
  .cleanup <days>    - Remove backup snapshots older than <days> days

Settings:
  .settings          - Show the current settings
  .save              - Save settings to ~/.sharpen.json"#
            .to_string()
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
