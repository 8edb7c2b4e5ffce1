/*!
# Engine Integration Tests

Registry selection and pipeline behavior against small hand-built catalogs.
*/

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sharpen_core::{
    LanguageLevel, Registry, Rewrite, Rule, RuleResult, SourceFile, TextRule, Transformer, Versioning,
};

fn trim_semicolons() -> Arc<dyn Rule> {
    Arc::new(
        TextRule::new("trim-semicolons", "Collapse doubled semicolons", |s: &str| {
            Rewrite::compare(s, s.replace(";;", ";"))
        })
        .with_versioning(Versioning::safe(LanguageLevel::CSharp6)),
    )
}

fn add_comment() -> Arc<dyn Rule> {
    Arc::new(
        TextRule::new("add-comment", "Documented only", |_: &str| Rewrite::Declined)
            .with_versioning(Versioning::opt_in(LanguageLevel::CSharp9)),
    )
}

fn versioned(name: &'static str, versioning: Versioning) -> Arc<dyn Rule> {
    Arc::new(TextRule::new(name, "test rule", |_: &str| Rewrite::Declined).with_versioning(versioning))
}

fn names(rules: &[Arc<dyn Rule>]) -> Vec<&'static str> {
    rules.iter().map(|r| r.name()).collect()
}

#[test]
fn test_scenario_safe_rule_fires_and_opt_in_is_filtered() -> anyhow::Result<()> {
    let mut registry = Registry::new();
    registry.try_register(trim_semicolons())?;
    registry.try_register(add_comment())?;

    let selected = registry.by_level(LanguageLevel::CSharp6, true);
    assert_eq!(names(&selected), vec!["trim-semicolons"]);

    let result = Transformer::new(selected).transform(&SourceFile::new("a.cs", "a;;"));
    assert_eq!(result.new_content, "a;");
    assert!(result.changed);
    assert_eq!(
        result.applied_rules,
        vec![RuleResult {
            rule_name: "trim-semicolons",
            applied: true,
            description: "Collapse doubled semicolons",
        }]
    );
    Ok(())
}

#[test]
fn test_scenario_no_qualifying_rules() {
    let mut registry = Registry::new();
    registry.register(add_comment());
    registry.register(versioned("later", Versioning::safe(LanguageLevel::CSharp10)));

    let selected = registry.by_level(LanguageLevel::CSharp6, true);
    assert!(selected.is_empty());

    let file = SourceFile::new("b.cs", "class B {}");
    let result = Transformer::new(selected).transform(&file);
    assert!(!result.changed);
    assert_eq!(result.new_content, file.content);
    assert!(result.applied_rules.is_empty());
}

#[test]
fn test_scenario_each_rule_runs_exactly_once() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&first_calls);
    let is_null: Arc<dyn Rule> = Arc::new(TextRule::new("is-null", "== null to is null", move |s: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        Rewrite::compare(s, s.replace("== null", "is null"))
    }));
    let counter = Arc::clone(&second_calls);
    let flag_null: Arc<dyn Rule> = Arc::new(TextRule::new("flag-null", "mark == null", move |s: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        Rewrite::compare(s, s.replace("== null", "== null /* check */"))
    }));

    let transformer = Transformer::new(vec![is_null, flag_null]);
    let result = transformer.transform(&SourceFile::new("c.cs", "if (x == null) { }"));

    assert_eq!(result.new_content, "if (x is null) { }");
    assert_eq!(result.applied_rule_names(), vec!["is-null"]);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_level_order_breaks_ties_by_name() {
    let mut registry = Registry::new();
    registry.register(versioned("zeta", Versioning::safe(LanguageLevel::CSharp7)));
    registry.register(versioned("beta", Versioning::opt_in(LanguageLevel::CSharp8)));
    registry.register(versioned("alpha", Versioning::safe(LanguageLevel::CSharp7)));
    registry.register(versioned("omega", Versioning::safe(LanguageLevel::CSharp6)));

    assert_eq!(
        names(&registry.by_level(LanguageLevel::CSharp13, false)),
        vec!["omega", "alpha", "zeta", "beta"]
    );
}

#[test]
fn test_version_gating_matches_min_level_and_safety() {
    let registry = Registry::builtin();
    for level in LanguageLevel::ALL {
        let every = registry.by_level(level, false);
        assert!(every.iter().all(|r| r.min_level().is_some_and(|min| min <= level)));

        let expected = registry
            .all()
            .into_iter()
            .filter(|r| r.min_level().is_some_and(|min| min <= level))
            .count();
        assert_eq!(every.len(), expected, "level {level}");

        let safe = registry.by_level(level, true);
        let safe_from_every: Vec<_> = every.iter().filter(|r| r.is_safe()).map(|r| r.name()).collect();
        assert_eq!(names(&safe), safe_from_every);
    }
}

#[test]
fn test_unknown_names_are_dropped() {
    let mut registry = Registry::new();
    registry.register(trim_semicolons());

    let picked = registry.by_names(&["trim-semicolons", "bogus"]);
    assert_eq!(names(&picked), vec!["trim-semicolons"]);
    assert_eq!(registry.unknown_names(&["trim-semicolons", "bogus"]), vec!["bogus"]);
}

#[test]
fn test_fold_equals_sequential_application() {
    let registry = Registry::builtin();
    let rules = registry.by_names(&["nameof-expression", "null-propagation"]);
    let source = "if (order != null) { order.Submit(); }\nthrow new ArgumentNullException(\"order\");";

    let mut expected = source.to_string();
    for rule in &rules {
        let (next, _) = rule.apply(&expected).into_parts(&expected);
        expected = next;
    }

    let result = Transformer::new(rules).transform(&SourceFile::new("d.cs", source));
    assert_eq!(result.new_content, expected);
    assert_eq!(result.changed, !result.applied_rules.is_empty());
    assert_eq!(result.applied_rule_names(), vec!["nameof-expression"]);
}

#[test]
fn test_transform_is_reproducible() {
    let registry = Registry::builtin();
    let transformer = Transformer::new(registry.by_level(LanguageLevel::CSharp13, true));
    let file = SourceFile::new(
        "e.cs",
        include_str!("fixtures/legacy_service.cs"),
    );

    let first = transformer.transform(&file);
    let second = transformer.transform(&file);
    assert_eq!(first, second);
    assert!(first.changed);
}

#[test]
fn test_fail_soft_across_a_batch() {
    let fragile: Arc<dyn Rule> = Arc::new(TextRule::new("fragile", "panics on marker", |s: &str| {
        if s.contains("PANIC") {
            panic!("unexpected input");
        }
        Rewrite::Declined
    }));
    let transformer = Transformer::new(vec![fragile, trim_semicolons()]);
    let files = vec![
        SourceFile::new("ok.cs", "a;;"),
        SourceFile::new("bad.cs", "PANIC;;"),
        SourceFile::new("also-ok.cs", "b;;"),
    ];

    let results = transformer.transform_all(&files);
    assert_eq!(
        results.iter().map(|r| r.new_content.as_str()).collect::<Vec<_>>(),
        vec!["a;", "PANIC;", "b;"]
    );
    assert!(!results[0].has_faults());
    assert_eq!(results[1].faults.len(), 1);
    assert_eq!(results[1].faults[0].rule_name, "fragile");
}

#[test]
fn test_parallel_matches_sequential() {
    let registry = Registry::builtin();
    let transformer = Transformer::new(registry.by_level(LanguageLevel::CSharp13, true));
    let files: Vec<SourceFile> = (0..12)
        .map(|i| {
            let body = if i % 3 == 0 {
                include_str!("fixtures/legacy_service.cs").to_string()
            } else {
                format!("class C{i} {{ int Get() {{ return {i}; }} }}\n")
            };
            SourceFile::new(format!("src/file{i}.cs"), body)
        })
        .collect();

    let sequential = transformer.transform_all(&files);
    let parallel = transformer.transform_all_parallel(&files, 4);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_cancellation_between_files() {
    let flag = Arc::new(AtomicBool::new(false));
    let trip = Arc::clone(&flag);
    let tripwire: Arc<dyn Rule> = Arc::new(TextRule::new("tripwire", "cancels the batch", move |s: &str| {
        if s.contains("stop") {
            trip.store(true, Ordering::SeqCst);
        }
        Rewrite::compare(s, s.replace("stop", "stopped"))
    }));
    let transformer = Transformer::new(vec![tripwire]).with_cancellation(flag);
    let files = vec![
        SourceFile::new("1.cs", "go"),
        SourceFile::new("2.cs", "stop"),
        SourceFile::new("3.cs", "go"),
    ];

    let results = transformer.transform_all(&files);
    assert_eq!(results.len(), 2);
    // The file that raised the signal still finishes its whole pipeline
    assert_eq!(results[1].new_content, "stopped");
}
