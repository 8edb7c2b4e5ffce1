//! Integration tests for sharpen-cli
//!
//! Every test works inside its own temporary project directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sharpen_cli::batch::{self, RunOptions};
use sharpen_cli::{
    scan, BackupManager, RuleSelection, Session, SessionCommand, Settings, BACKUP_DIR_NAME,
};
use sharpen_core::{LanguageLevel, Registry};
use tempfile::TempDir;

const LEGACY_SERVICE: &str = include_str!("../../sharpen-core/tests/fixtures/legacy_service.cs");

fn write(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn relative_paths(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

fn stamp(year: i32, month: u32, day: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

#[test]
fn test_scan_collects_sources_and_skips_build_dirs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "a.cs", b"class A {}");
    write(root, "B.CS", b"class B {}");
    write(root, "sub/c.cs", b"class C {}");
    write(root, "notes.txt", b"not code");
    write(root, "bin/Debug/x.cs", b"class X {}");
    write(root, "obj/y.cs", b"class Y {}");
    write(root, ".git/z.cs", b"class Z {}");
    write(root, "node_modules/w.cs", b"class W {}");
    write(root, &format!("{BACKUP_DIR_NAME}/20240101-000000/a.cs"), b"class A {}");
    write(root, "latin1.cs", &[0x63, 0x6c, 0x61, 0x73, 0x73, 0x20, 0xe9]);

    let files = scan(root).unwrap();
    assert_eq!(
        relative_paths(root, files.iter().map(|f| f.path.clone())),
        vec!["B.CS", "a.cs", "sub/c.cs"]
    );
    assert_eq!(files[2].content, "class C {}");
}

#[test]
fn test_scan_single_file() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "Program.cs", b"class Program {}");

    let files = scan(&path).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, path);
}

#[test]
fn test_backup_suffixes_colliding_names() {
    let dir = TempDir::new().unwrap();
    let manager = BackupManager::with_timestamp(dir.path(), stamp(2024, 5, 1));

    let first = manager.backup(&dir.path().join("a/Program.cs"), "first").unwrap();
    let second = manager.backup(&dir.path().join("b/Program.cs"), "second").unwrap();
    let third = manager.backup(&dir.path().join("c/Program.cs"), "third").unwrap();

    let snapshot = manager.snapshot_dir();
    assert_eq!(first, snapshot.join("Program.cs"));
    assert_eq!(second, snapshot.join("Program_1.cs"));
    assert_eq!(third, snapshot.join("Program_2.cs"));
    assert_eq!(fs::read_to_string(&second).unwrap(), "second");
    assert_eq!(manager.available().unwrap(), vec![first, second, third]);
}

#[test]
fn test_backup_cleanup_removes_only_old_snapshots() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join(BACKUP_DIR_NAME);
    for name in ["20200101-120000", "20200615-080000", "20240420-090000", "keep-me"] {
        fs::create_dir_all(base.join(name)).unwrap();
    }

    let manager = BackupManager::with_timestamp(dir.path(), stamp(2024, 5, 1));
    manager.backup(Path::new("Program.cs"), "original").unwrap();

    let removed = manager.cleanup_before(stamp(2024, 1, 1)).unwrap();
    assert_eq!(removed, 2);

    let mut left: Vec<String> = fs::read_dir(&base)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["20240420-090000", "20240501-120000", "keep-me"]);

    // The current snapshot survives any cutoff
    assert_eq!(manager.cleanup_before(stamp(2100, 1, 1)).unwrap(), 1);
    assert_eq!(manager.available().unwrap().len(), 1);
}

#[test]
fn test_backup_cleanup_without_backups() {
    let dir = TempDir::new().unwrap();
    let manager = BackupManager::new(dir.path());
    assert_eq!(manager.cleanup(30).unwrap(), 0);
    assert!(manager.available().unwrap().is_empty());
}

#[test]
fn test_settings_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = Settings::default();
    settings.set_target_level(LanguageLevel::CSharp10);
    settings.safe_only = false;
    settings.backup_enabled = true;
    settings.set_rule_disabled("tuple-swap", true);
    settings.working_path = "/src/legacy".to_string();
    settings.save_to(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"targetVersion\": \"10\""));
    assert!(raw.contains("\"disabledRules\""));
    assert_eq!(Settings::load_from(&path), settings);
}

#[test]
fn test_settings_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    assert_eq!(Settings::load_from(&dir.path().join("missing.json")), Settings::default());

    let malformed = write(dir.path(), "bad.json", b"{ not json");
    assert_eq!(Settings::load_from(&malformed), Settings::default());
}

#[test]
fn test_selection_from_settings() {
    let registry = Registry::builtin();
    let mut settings = Settings::default();
    settings.set_target_level(LanguageLevel::CSharp8);
    settings.set_rule_disabled("null-propagation", true);

    let rules = settings.selection().resolve(&registry);
    assert!(rules
        .iter()
        .all(|r| r.is_safe() && r.min_level() <= Some(LanguageLevel::CSharp8)));
    assert!(rules.iter().all(|r| r.name() != "null-propagation"));
    assert_eq!(rules.len(), registry.by_level(LanguageLevel::CSharp8, true).len() - 1);
}

#[test]
fn test_batch_dry_run_leaves_files_alone() {
    let dir = TempDir::new().unwrap();
    let service = write(dir.path(), "src/LegacyService.cs", LEGACY_SERVICE.as_bytes());
    write(dir.path(), "src/Notes.cs", b"// nothing to modernize\n");

    let options = RunOptions {
        dry_run: true,
        jobs: 2,
        ..RunOptions::new(dir.path())
    };
    let mut out = Vec::new();
    let summary = batch::run(&options, &Registry::builtin(), &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.files_changed, 1);
    assert_eq!(summary.files_written, 0);
    assert!(summary.transformations > 0);
    assert!(summary.success());
    assert!(report.contains("LegacyService.cs\n  + "), "{report}");
    assert!(!report.contains("Notes.cs"));
    assert!(report.contains("Dry run"));
    assert_eq!(fs::read_to_string(&service).unwrap(), LEGACY_SERVICE);
    assert!(!dir.path().join(BACKUP_DIR_NAME).exists());
}

#[test]
fn test_batch_writes_and_backs_up() {
    let dir = TempDir::new().unwrap();
    let service = write(dir.path(), "LegacyService.cs", LEGACY_SERVICE.as_bytes());

    let options = RunOptions {
        backup: true,
        selection: RuleSelection::new(LanguageLevel::CSharp13, true),
        jobs: 1,
        ..RunOptions::new(dir.path())
    };
    let mut out = Vec::new();
    let summary = batch::run(&options, &Registry::builtin(), &mut out).unwrap();

    assert_eq!(summary.files_written, 1);
    assert!(summary.success());
    let rewritten = fs::read_to_string(&service).unwrap();
    assert!(rewritten.contains("namespace Legacy.Orders;"));

    let backup_dir = summary.backup_dir.unwrap();
    assert!(backup_dir.starts_with(dir.path().join(BACKUP_DIR_NAME)));
    assert_eq!(
        fs::read_to_string(backup_dir.join("LegacyService.cs")).unwrap(),
        LEGACY_SERVICE
    );

    // Running again finds nothing left to do
    let again = batch::run(&RunOptions { backup: false, ..options }, &Registry::builtin(), &mut Vec::new()).unwrap();
    assert_eq!(again.files_changed, 0);
    assert_eq!(again.files_written, 0);
}

#[test]
fn test_batch_prints_rule_statistics_on_request() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "LegacyService.cs", LEGACY_SERVICE.as_bytes());

    let quiet = RunOptions {
        dry_run: true,
        selection: RuleSelection::new(LanguageLevel::CSharp13, true),
        jobs: 1,
        ..RunOptions::new(dir.path())
    };
    let mut out = Vec::new();
    batch::run(&quiet, &Registry::builtin(), &mut out).unwrap();
    assert!(!String::from_utf8(out).unwrap().contains("Rule statistics:"));

    let verbose = RunOptions { show_stats: true, ..quiet };
    let mut out = Vec::new();
    batch::run(&verbose, &Registry::builtin(), &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("Rule statistics:"));
    let namespace_line = report
        .lines()
        .find(|line| line.trim_start().starts_with("file-scoped-namespace"))
        .unwrap();
    assert!(namespace_line.contains("1/1 applied (100%)"), "{namespace_line}");
}

#[test]
fn test_batch_reports_unknown_rule_names() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "A.cs", b"class A {}");

    let options = RunOptions {
        dry_run: true,
        selection: RuleSelection::default().with_allow_list(["no-such-rule"]),
        ..RunOptions::new(dir.path())
    };
    let mut out = Vec::new();
    let summary = batch::run(&options, &Registry::builtin(), &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("warning: unknown rule 'no-such-rule'"));
    assert_eq!(summary.files_changed, 0);
}

#[test]
fn test_batch_missing_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let options = RunOptions::new(dir.path().join("missing"));
    assert!(batch::run(&options, &Registry::builtin(), &mut Vec::new()).is_err());
}

fn session_in(dir: &TempDir) -> Session {
    let settings = Settings {
        working_path: dir.path().to_string_lossy().into_owned(),
        ..Settings::default()
    };
    Session::new(Registry::builtin(), settings)
        .with_settings_path(dir.path().join("settings.json"))
        .with_jobs(2)
}

#[test]
fn test_session_policy_commands() {
    let dir = TempDir::new().unwrap();
    let mut session = session_in(&dir);

    assert_eq!(
        session.handle_command(SessionCommand::Target(Some("9".to_string()))).unwrap(),
        "Target set to C# 9.0"
    );
    assert!(session.handle_command(SessionCommand::Target(Some("42".to_string()))).is_err());
    assert_eq!(
        session.handle_command(SessionCommand::Safe(Some(false))).unwrap(),
        "Safe rules only: off"
    );
    assert_eq!(
        session.handle_command(SessionCommand::Disable("tuple-swap".to_string())).unwrap(),
        "Rule tuple-swap disabled"
    );
    assert!(session.handle_command(SessionCommand::Disable("bogus".to_string())).is_err());

    let rules = session.handle_command(SessionCommand::Rules).unwrap();
    assert!(rules.contains("[-] tuple-swap"));
    assert!(rules.contains("[x] nameof-expression"));

    assert_eq!(session.settings().target_level(), LanguageLevel::CSharp9);
    assert!(!session.settings().safe_only);
    assert!(session.settings().is_rule_disabled("tuple-swap"));
}

#[test]
fn test_session_preview_then_apply() {
    let dir = TempDir::new().unwrap();
    let service = write(dir.path(), "LegacyService.cs", LEGACY_SERVICE.as_bytes());
    let mut session = session_in(&dir);

    let scan = session.handle_command(SessionCommand::Scan).unwrap();
    assert!(scan.starts_with("Found 1 C# files"));

    assert!(session
        .handle_command(SessionCommand::Stats)
        .unwrap()
        .starts_with("No statistics yet"));

    let preview = session.handle_command(SessionCommand::Preview).unwrap();
    assert!(preview.contains("LegacyService.cs"));
    assert_eq!(fs::read_to_string(&service).unwrap(), LEGACY_SERVICE);

    let stats = session.handle_command(SessionCommand::Stats).unwrap();
    assert!(stats.starts_with("Rule statistics:"));
    assert!(stats.contains("file-scoped-namespace"));

    assert_eq!(
        session.handle_command(SessionCommand::Backups).unwrap(),
        "No backups made in this session"
    );
    session.handle_command(SessionCommand::Backup(Some(true))).unwrap();
    let applied = session.handle_command(SessionCommand::Apply).unwrap();
    assert!(applied.starts_with("Wrote 1 of 1 changed files"), "{applied}");
    assert!(applied.contains("Backups stored in"));
    assert_ne!(fs::read_to_string(&service).unwrap(), LEGACY_SERVICE);

    let backups = session.handle_command(SessionCommand::Backups).unwrap();
    assert!(backups.starts_with("1 files backed up in"), "{backups}");
    assert!(backups.ends_with("\n  LegacyService.cs"));
}

#[test]
fn test_session_cleanup_removes_old_snapshots() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join(BACKUP_DIR_NAME);
    for name in ["20000101-120000", "not-a-snapshot"] {
        fs::create_dir_all(base.join(name)).unwrap();
    }
    let mut session = session_in(&dir);

    let cleaned = session.parse_input(".cleanup 30").unwrap();
    let output = session.handle_command(cleaned).unwrap();
    assert!(output.starts_with("Removed 1 backup snapshots older than 30 days"), "{output}");
    assert!(!base.join("20000101-120000").exists());
    assert!(base.join("not-a-snapshot").exists());
}

#[test]
fn test_session_path_and_save() {
    let dir = TempDir::new().unwrap();
    let mut session = session_in(&dir);

    assert!(session
        .handle_command(SessionCommand::Path(Some(dir.path().join("nope").to_string_lossy().into_owned())))
        .is_err());

    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    session
        .handle_command(SessionCommand::Path(Some(sub.to_string_lossy().into_owned())))
        .unwrap();

    let saved = session.handle_command(SessionCommand::Save).unwrap();
    assert!(saved.starts_with("Settings saved to"));
    let loaded = Settings::load_from(&dir.path().join("settings.json"));
    assert_eq!(&loaded, session.settings());
    assert_eq!(loaded.working_path(), Some(sub));
}

#[test]
fn test_session_quit() {
    let dir = TempDir::new().unwrap();
    let mut session = session_in(&dir);
    let command = session.parse_input(".quit").unwrap();
    assert_eq!(session.handle_command(command).unwrap(), "Goodbye!");
    assert!(!session.is_running());
}
