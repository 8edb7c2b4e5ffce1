/*!
# Transformer - Rule Pipeline

Folds an ordered rule list over the content of one source file.

Every rule in the list runs exactly once per file, in the given order, on the
text produced by the rules before it. A rule that panics is isolated: the
panic is caught, recorded as a [`RuleFault`], and the fold continues with the
text as it stood before that rule ran.

A rule counts as applied only when it returns text that differs from its
input; `changed` on the result follows the audit trail, so two rules that
cancel each other still mark the file as changed.

The process-wide panic hook still fires before `catch_unwind` regains
control. Binaries that want faults reported only through tracing call
[`quiet_rule_panics`] once at startup.

Files share no state, so batches can be spread over a bounded worker pool
with [`Transformer::transform_all_parallel`]. Results always come back in
input order.
*/

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded};
use dashmap::DashMap;
use tracing::{debug, info, trace, warn};

use crate::rules::{Rewrite, Rule, RuleResult};

thread_local! {
    static IN_RULE: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a rule's `apply`
pub(crate) fn applying_rule() -> bool {
    IN_RULE.with(Cell::get)
}

/// Route panics raised inside rules to `debug!` instead of stderr.
///
/// Panics anywhere else still reach the previously installed hook.
pub fn quiet_rule_panics() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if applying_rule() {
            debug!(panic = %info, "Rule panic caught by the pipeline");
        } else {
            previous(info);
        }
    }));
}

/// A file handed to the pipeline: its path and current content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A rule that panicked while rewriting a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFault {
    pub rule_name: &'static str,
    pub message: String,
}

/// Outcome of running the pipeline over one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub file: PathBuf,
    pub new_content: String,
    /// True when at least one rule applied, even if the text ended up unchanged
    pub changed: bool,
    /// Rules that rewrote the file, in application order
    pub applied_rules: Vec<RuleResult>,
    pub faults: Vec<RuleFault>,
}

impl TransformResult {
    pub fn applied_rule_names(&self) -> Vec<&'static str> {
        self.applied_rules.iter().map(|r| r.rule_name).collect()
    }

    pub fn has_faults(&self) -> bool {
        !self.faults.is_empty()
    }
}

/// Per-rule counters accumulated across every file a transformer processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStats {
    pub rule_name: &'static str,
    /// Number of `apply` calls
    pub invocations: u64,
    /// Calls that rewrote the text
    pub applications: u64,
    /// Calls that panicked
    pub faults: u64,
    pub total_time: Duration,
}

impl RuleStats {
    pub fn new(rule_name: &'static str) -> Self {
        Self {
            rule_name,
            invocations: 0,
            applications: 0,
            faults: 0,
            total_time: Duration::ZERO,
        }
    }

    /// Fraction of invocations that rewrote the text
    pub fn hit_rate(&self) -> f64 {
        if self.invocations == 0 {
            0.0
        } else {
            self.applications as f64 / self.invocations as f64
        }
    }

    pub fn average_time(&self) -> Duration {
        match u32::try_from(self.invocations) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_time / n,
            Err(_) => Duration::from_secs_f64(self.total_time.as_secs_f64() / self.invocations as f64),
        }
    }
}

/// Ordered rule pipeline
pub struct Transformer {
    rules: Vec<Arc<dyn Rule>>,
    stats: DashMap<&'static str, RuleStats>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Transformer {
    /// A pipeline applying `rules` in exactly the given order
    pub fn new(rules: Vec<Arc<dyn Rule>>) -> Self {
        let stats = DashMap::new();
        for rule in &rules {
            stats
                .entry(rule.name())
                .or_insert_with(|| RuleStats::new(rule.name()));
        }
        Self {
            rules,
            stats,
            cancel: None,
        }
    }

    /// Stop batch runs between files once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Fold every rule over `file.content`
    pub fn transform(&self, file: &SourceFile) -> TransformResult {
        let mut state = file.content.clone();
        let mut applied_rules = Vec::new();
        let mut faults = Vec::new();

        for rule in &self.rules {
            let start = Instant::now();
            IN_RULE.with(|flag| flag.set(true));
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.apply(&state)));
            IN_RULE.with(|flag| flag.set(false));
            let elapsed = start.elapsed();

            let mut stats = self
                .stats
                .entry(rule.name())
                .or_insert_with(|| RuleStats::new(rule.name()));
            stats.invocations += 1;
            stats.total_time += elapsed;

            match outcome {
                Ok(Rewrite::Applied(text)) if text != state => {
                    stats.applications += 1;
                    trace!(rule = rule.name(), file = %file.path.display(), "Rule applied");
                    state = text;
                    applied_rules.push(RuleResult::applied(rule.as_ref()));
                }
                Ok(Rewrite::Applied(_)) => {
                    trace!(rule = rule.name(), file = %file.path.display(), "Rule returned unchanged text");
                }
                Ok(Rewrite::Declined) => {}
                Err(payload) => {
                    stats.faults += 1;
                    let message = panic_message(payload.as_ref());
                    warn!(
                        rule = rule.name(),
                        file = %file.path.display(),
                        error = %message,
                        "Rule panicked; skipping it for this file"
                    );
                    faults.push(RuleFault {
                        rule_name: rule.name(),
                        message,
                    });
                }
            }
        }

        let changed = !applied_rules.is_empty();
        debug!(
            file = %file.path.display(),
            changed,
            applied = applied_rules.len(),
            faults = faults.len(),
            "Transformed file"
        );

        TransformResult {
            file: file.path.clone(),
            new_content: state,
            changed,
            applied_rules,
            faults,
        }
    }

    /// Transform files one after another, in input order
    pub fn transform_all(&self, files: &[SourceFile]) -> Vec<TransformResult> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if self.is_cancelled() {
                info!(completed = results.len(), total = files.len(), "Batch cancelled");
                break;
            }
            results.push(self.transform(file));
        }
        results
    }

    /// Transform files on up to `workers` threads
    ///
    /// Results are returned in input order regardless of completion order.
    /// On cancellation, files not yet started are skipped and the results
    /// for the files that did complete are returned.
    pub fn transform_all_parallel(&self, files: &[SourceFile], workers: usize) -> Vec<TransformResult> {
        let workers = workers.clamp(1, files.len().max(1));
        if workers == 1 {
            return self.transform_all(files);
        }

        let (job_tx, job_rx) = bounded::<(usize, &SourceFile)>(workers * 2);
        let (result_tx, result_rx) = unbounded::<(usize, TransformResult)>();

        thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, file) in job_rx {
                        if self.is_cancelled() {
                            break;
                        }
                        if result_tx.send((index, self.transform(file))).is_err() {
                            break;
                        }
                    }
                    trace!(worker, "Worker finished");
                });
            }
            drop(result_tx);
            drop(job_rx);

            for job in files.iter().enumerate() {
                if self.is_cancelled() || job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        let mut slots: Vec<Option<TransformResult>> = vec![None; files.len()];
        for (index, result) in result_rx {
            slots[index] = Some(result);
        }
        let results: Vec<TransformResult> = slots.into_iter().flatten().collect();

        if results.len() < files.len() {
            info!(completed = results.len(), total = files.len(), "Batch cancelled");
        }
        results
    }

    /// Per-rule statistics, sorted by rule name
    pub fn stats(&self) -> Vec<RuleStats> {
        let mut stats: Vec<RuleStats> = self.stats.iter().map(|entry| entry.value().clone()).collect();
        stats.sort_by_key(|s| s.rule_name);
        stats
    }

    pub fn clear_stats(&self) {
        for mut entry in self.stats.iter_mut() {
            let name = entry.rule_name;
            *entry = RuleStats::new(name);
        }
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}
