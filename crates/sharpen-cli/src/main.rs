use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use sharpen_cli::batch::{self, RunOptions};
use sharpen_cli::{Session, Settings};
use sharpen_core::{init_tracing, quiet_rule_panics, LanguageLevel, Registry};
use tracing::debug;

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("sharpen")
        .version(sharpen_core::VERSION)
        .about("Modernize legacy C# sources with version-aware rewrite rules")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .help("Project directory or single .cs file")
                .index(1),
        )
        .arg(
            Arg::new("batch")
                .short('b')
                .long("batch")
                .help("Run once without the interactive session")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Report changes without writing files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rules")
                .long("rules")
                .value_name("NAMES")
                .help("Comma-separated rule names to run, in order")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("VERSION")
                .help("Target C# version (6-13)"),
        )
        .arg(
            Arg::new("all-rules")
                .long("all-rules")
                .help("Include opt-in rules, not just safe ones")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Worker threads for transforming files")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging and print per-rule statistics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-rules")
                .long("list-rules")
                .help("List the available rules and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("backup")
                .long("backup")
                .help("Back up files before rewriting them")
                .action(ArgAction::SetTrue)
                .overrides_with("no-backup"),
        )
        .arg(
            Arg::new("no-backup")
                .long("no-backup")
                .help("Do not back up files before rewriting them")
                .action(ArgAction::SetTrue)
                .overrides_with("backup"),
        )
        .get_matches();

    init_tracing(matches.get_flag("verbose"));
    quiet_rule_panics();

    let registry = Registry::builtin();

    if matches.get_flag("list-rules") {
        batch::list_rules(&registry, &mut io::stdout().lock())?;
        return Ok(());
    }

    // Command line flags override the persisted settings
    let mut settings = Settings::load();
    if let Some(version) = matches.get_one::<String>("target") {
        let level: LanguageLevel = version.parse()?;
        settings.set_target_level(level);
    }
    if matches.get_flag("all-rules") {
        settings.safe_only = false;
    }
    if matches.get_flag("backup") {
        settings.backup_enabled = true;
    }
    if matches.get_flag("no-backup") {
        settings.backup_enabled = false;
    }
    if let Some(path) = matches.get_one::<String>("path") {
        settings.working_path = path.clone();
    }
    let jobs = matches
        .get_one::<usize>("jobs")
        .copied()
        .unwrap_or_else(batch::default_jobs)
        .max(1);
    debug!(?settings, jobs, "Resolved settings");

    if matches.get_flag("batch") {
        let mut selection = settings.selection();
        if let Some(names) = matches.get_many::<String>("rules") {
            selection = selection.with_allow_list(names.cloned());
        }
        let options = RunOptions {
            path: settings
                .working_path()
                .unwrap_or_else(|| PathBuf::from(".")),
            dry_run: matches.get_flag("dry-run"),
            selection,
            backup: settings.backup_enabled,
            jobs,
            show_stats: matches.get_flag("verbose"),
        };

        let summary = batch::run(&options, &registry, &mut io::stdout().lock())?;
        if !summary.success() {
            return Err(anyhow!("{} files could not be written", summary.errors.len()));
        }
        return Ok(());
    }

    println!("Sharpen v{}", sharpen_core::VERSION);
    println!("Type .help for help, .quit to exit");
    println!();

    let mut session = Session::new(registry, settings).with_jobs(jobs);
    run_session(&mut session)
}

fn run_session(session: &mut Session) -> Result<()> {
    use rustyline::{error::ReadlineError, DefaultEditor};

    let mut rl = DefaultEditor::new()?;
    let is_interactive = io::stdin().is_terminal();

    while session.is_running() {
        match rl.readline("sharpen> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                // Echo input in non-interactive mode
                if !is_interactive {
                    println!("sharpen> {trimmed}");
                }

                match session.parse_input(trimmed) {
                    Ok(command) => match session.handle_command(command) {
                        Ok(output) => session.notifier().on_output(&output),
                        Err(e) => session.notifier().on_error(&format!("Error: {e:#}")),
                    },
                    Err(e) => session.notifier().on_error(&format!("Error: {e}")),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use .quit to exit");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    Ok(())
}
