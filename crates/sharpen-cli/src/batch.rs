//! Batch runs: scan, transform, report, back up and write
//!
//! The flow is split so the interactive session can preview a [`Plan`]
//! before deciding to [`apply`] it. [`run`] strings the steps together for
//! `--batch` mode.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use sharpen_core::{Registry, Rule, RuleStats, SourceFile, TransformResult, Transformer};
use tracing::{debug, info, warn};

use crate::backup::BackupManager;
use crate::scanner;
use crate::selection::RuleSelection;

/// Options for a single batch run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub path: PathBuf,
    pub dry_run: bool,
    pub selection: RuleSelection,
    pub backup: bool,
    /// Worker threads for the transform step
    pub jobs: usize,
    /// Print per-rule statistics after the report
    pub show_stats: bool,
}

impl RunOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dry_run: false,
            selection: RuleSelection::default(),
            backup: false,
            jobs: default_jobs(),
            show_stats: false,
        }
    }
}

/// Available parallelism, or 1 when it cannot be queried
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub files_written: usize,
    /// Applied rule results across every file
    pub transformations: usize,
    pub errors: Vec<String>,
    pub backup_dir: Option<PathBuf>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Transform results for a scanned tree, not yet written
#[derive(Debug)]
pub struct Plan {
    pub root: PathBuf,
    pub files: Vec<SourceFile>,
    pub results: Vec<TransformResult>,
    /// Per-rule counters from the transform step, in pipeline order
    pub stats: Vec<RuleStats>,
}

impl Plan {
    pub fn changed(&self) -> impl Iterator<Item = (&SourceFile, &TransformResult)> {
        self.files
            .iter()
            .zip(&self.results)
            .filter(|(_, result)| result.changed)
    }

    pub fn changed_count(&self) -> usize {
        self.changed().count()
    }

    pub fn transformation_count(&self) -> usize {
        self.results.iter().map(|r| r.applied_rules.len()).sum()
    }

    /// `path` relative to the scanned root, for display
    pub fn display_path<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .unwrap_or(path)
            .to_string_lossy()
    }
}

/// Directory a scan of `path` is reported against and backed up into
pub fn project_root(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}

/// Scan `path` and run `rules` over every file
pub fn prepare(path: &Path, rules: Vec<Arc<dyn Rule>>, jobs: usize) -> Result<Plan> {
    let files = scanner::scan(path)?;
    let transformer = Transformer::new(rules);

    let start = Instant::now();
    let results = if jobs > 1 {
        transformer.transform_all_parallel(&files, jobs)
    } else {
        transformer.transform_all(&files)
    };
    debug!(
        files = files.len(),
        jobs,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Transformed sources"
    );

    Ok(Plan {
        root: project_root(path),
        files,
        results,
        stats: transformer.stats(),
    })
}

/// Print each changed file with the rules applied to it, in path order
pub fn report(plan: &Plan, out: &mut impl Write) -> std::io::Result<()> {
    for (file, result) in plan.files.iter().zip(&plan.results) {
        for fault in &result.faults {
            writeln!(
                out,
                "! {}: rule {} failed: {}",
                plan.display_path(&file.path),
                fault.rule_name,
                fault.message
            )?;
        }
        if !result.changed {
            continue;
        }
        writeln!(out, "{}", plan.display_path(&file.path))?;
        for applied in &result.applied_rules {
            writeln!(out, "  + {}", applied.description)?;
        }
    }
    writeln!(
        out,
        "{} of {} files would change ({} transformations)",
        plan.changed_count(),
        plan.files.len(),
        plan.transformation_count()
    )
}

/// Print per-rule counters for the rules that ran at least once
pub fn report_stats(stats: &[RuleStats], out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Rule statistics:")?;
    for rule in stats.iter().filter(|s| s.invocations > 0) {
        write!(
            out,
            "  {:<32} {}/{} applied ({:.0}%), avg {:?}",
            rule.rule_name,
            rule.applications,
            rule.invocations,
            rule.hit_rate() * 100.0,
            rule.average_time()
        )?;
        if rule.faults > 0 {
            write!(out, ", {} faults", rule.faults)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write every changed file, backing up originals first when `backup` is set
///
/// Failures are collected per file; a file whose backup fails is left alone.
pub fn apply(plan: &Plan, backup: Option<&BackupManager>) -> RunSummary {
    let mut summary = RunSummary {
        files_scanned: plan.files.len(),
        files_changed: plan.changed_count(),
        transformations: plan.transformation_count(),
        ..RunSummary::default()
    };

    for (file, result) in plan.changed() {
        if let Some(manager) = backup {
            if let Err(e) = manager.backup(&file.path, &file.content) {
                warn!(path = %file.path.display(), error = %e, "Backup failed, file left unchanged");
                summary.errors.push(format!("{}: {e}", file.path.display()));
                continue;
            }
            summary.backup_dir = Some(manager.snapshot_dir());
        }

        match fs::write(&file.path, &result.new_content) {
            Ok(()) => summary.files_written += 1,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "Failed to write file");
                summary.errors.push(format!("{}: {e}", file.path.display()));
            }
        }
    }

    info!(
        written = summary.files_written,
        errors = summary.errors.len(),
        "Applied transformations"
    );
    summary
}

/// Full non-interactive run
pub fn run(options: &RunOptions, registry: &Registry, out: &mut impl Write) -> Result<RunSummary> {
    for unknown in options.selection.unknown_names(registry) {
        writeln!(out, "warning: unknown rule '{unknown}'")?;
    }

    let rules = options.selection.resolve(registry);
    if rules.is_empty() {
        writeln!(out, "No rules selected for {}", options.selection.target)?;
    }

    let plan = prepare(&options.path, rules, options.jobs)?;
    report(&plan, out)?;
    if options.show_stats {
        report_stats(&plan.stats, out)?;
    }

    if options.dry_run {
        writeln!(out, "Dry run: no files written")?;
        return Ok(RunSummary {
            files_scanned: plan.files.len(),
            files_changed: plan.changed_count(),
            transformations: plan.transformation_count(),
            ..RunSummary::default()
        });
    }

    let manager = options.backup.then(|| BackupManager::new(&plan.root));
    let summary = apply(&plan, manager.as_ref());

    writeln!(out, "Wrote {} files", summary.files_written)?;
    if let Some(dir) = &summary.backup_dir {
        writeln!(out, "Backups stored in {}", dir.display())?;
    }
    for error in &summary.errors {
        writeln!(out, "error: {error}")?;
    }
    Ok(summary)
}

/// Print the catalog grouped by language level
pub fn list_rules(registry: &Registry, out: &mut impl Write) -> std::io::Result<()> {
    for (level, rules) in registry.group_by_level() {
        writeln!(out, "{level} ({})", level.dotnet_version())?;
        for rule in rules {
            let marker = if rule.is_advisory() {
                "advisory"
            } else if rule.is_safe() {
                "safe"
            } else {
                "opt-in"
            };
            writeln!(out, "  {:<32} [{marker}] {}", rule.name(), rule.description())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpen_core::{LanguageLevel, Rewrite, TextRule, Versioning};

    #[test]
    fn test_list_rules_marks_every_rule() {
        let mut registry = Registry::new();
        registry.register(Arc::new(
            TextRule::new("a-rule", "Does a", |_: &str| Rewrite::Declined)
                .with_versioning(Versioning::safe(LanguageLevel::CSharp6)),
        ));
        registry.register(Arc::new(
            TextRule::new("b-rule", "Does b", |_: &str| Rewrite::Declined)
                .with_versioning(Versioning::opt_in(LanguageLevel::CSharp9)),
        ));

        let mut out = Vec::new();
        list_rules(&registry, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("C# 6.0"));
        assert!(text.contains("[safe] Does a"));
        assert!(text.contains("[opt-in] Does b"));
    }

    #[test]
    fn test_report_stats_skips_idle_rules() {
        let boom: Arc<dyn Rule> = Arc::new(TextRule::new("boom", "always panics", |_: &str| -> Rewrite {
            panic!("bad pattern")
        }));
        let upper: Arc<dyn Rule> = Arc::new(TextRule::new("upper", "uppercase", |s: &str| {
            Rewrite::compare(s, s.to_uppercase())
        }));
        let transformer = Transformer::new(vec![upper, boom]);
        transformer.transform(&SourceFile::new("a.cs", "abc"));
        transformer.transform(&SourceFile::new("b.cs", "XYZ"));

        let mut stats = transformer.stats();
        stats.push(RuleStats::new("idle"));
        let mut out = Vec::new();
        report_stats(&stats, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Rule statistics:\n"));
        assert!(text.contains("1/2 applied (50%)"));
        assert!(text.contains("0/2 applied (0%)"));
        assert!(text.contains(", 2 faults"));
        assert!(!text.contains("idle"));
    }

    #[test]
    fn test_summary_success() {
        let mut summary = RunSummary::default();
        assert!(summary.success());
        summary.errors.push("boom".to_string());
        assert!(!summary.success());
    }
}
