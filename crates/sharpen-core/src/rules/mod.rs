/*!
# Rewrite Rules

Core trait and building blocks for text rewrite rules.

A rule is a pure function from source text to either a rewritten text or a
decline. Rules never fail: input they do not understand is simply declined.
Version and safety metadata is an optional capability exposed through
[`Rule::versioning`].
*/

use std::fmt;

use crate::level::LanguageLevel;

pub mod csharp;
pub mod patterns;

/// Outcome of applying a rule to a piece of source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// The rule did not match; the input stands unchanged
    Declined,
    /// The rule produced new text, always different from the input
    Applied(String),
}

impl Rewrite {
    /// Build an outcome from the original text and a candidate rewrite.
    ///
    /// Declines when the candidate is identical to the original, so a rule
    /// can never report a change without a text delta.
    pub fn compare(original: &str, candidate: String) -> Self {
        if candidate == original {
            Rewrite::Declined
        } else {
            Rewrite::Applied(candidate)
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Rewrite::Applied(_))
    }

    /// The `(text, changed)` pair for this outcome
    pub fn into_parts(self, original: &str) -> (String, bool) {
        match self {
            Rewrite::Declined => (original.to_string(), false),
            Rewrite::Applied(text) => (text, true),
        }
    }
}

/// Minimum language level and safety classification of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Versioning {
    /// Oldest language level on which the rewritten code compiles
    pub min_level: LanguageLevel,
    /// Whether the rewrite can never change program behavior
    pub safe: bool,
}

impl Versioning {
    pub const fn safe(min_level: LanguageLevel) -> Self {
        Self { min_level, safe: true }
    }

    pub const fn opt_in(min_level: LanguageLevel) -> Self {
        Self { min_level, safe: false }
    }
}

/// Core trait for rewrite rules
///
/// Implementations must be deterministic: the same input always yields the
/// same [`Rewrite`], with no dependence on time, randomness or shared state.
/// Rules marked safe must also be idempotent: applying them to their own
/// output declines.
pub trait Rule: Send + Sync {
    /// Stable, unique, non-empty identifier (kebab-case)
    fn name(&self) -> &'static str;

    /// User-facing explanation of the rewrite
    fn description(&self) -> &'static str;

    /// Rewrite `source`, or decline
    fn apply(&self, source: &str) -> Rewrite;

    /// Version and safety metadata; `None` for unversioned rules
    fn versioning(&self) -> Option<Versioning> {
        None
    }

    /// Whether the rule only documents a transformation that must be done by hand
    fn is_advisory(&self) -> bool {
        false
    }

    /// Convenience accessor for the minimum level
    fn min_level(&self) -> Option<LanguageLevel> {
        self.versioning().map(|v| v.min_level)
    }

    /// Convenience accessor for the safety flag; unversioned rules are never safe
    fn is_safe(&self) -> bool {
        self.versioning().is_some_and(|v| v.safe)
    }
}

impl fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name())
            .field("versioning", &self.versioning())
            .finish()
    }
}

/// Audit entry recorded each time a rule rewrites a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub rule_name: &'static str,
    pub applied: bool,
    pub description: &'static str,
}

impl RuleResult {
    pub fn applied(rule: &dyn Rule) -> Self {
        Self {
            rule_name: rule.name(),
            applied: true,
            description: rule.description(),
        }
    }
}

/// A rule backed by a plain function
///
/// Useful for one-off rules and for assembling catalogs in tests.
pub struct TextRule<F>
where
    F: Fn(&str) -> Rewrite + Send + Sync,
{
    pub name: &'static str,
    pub description: &'static str,
    pub versioning: Option<Versioning>,
    pub rewrite: F,
}

impl<F> TextRule<F>
where
    F: Fn(&str) -> Rewrite + Send + Sync,
{
    pub fn new(name: &'static str, description: &'static str, rewrite: F) -> Self {
        Self {
            name,
            description,
            versioning: None,
            rewrite,
        }
    }

    pub fn with_versioning(mut self, versioning: Versioning) -> Self {
        self.versioning = Some(versioning);
        self
    }
}

impl<F> Rule for TextRule<F>
where
    F: Fn(&str) -> Rewrite + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn apply(&self, source: &str) -> Rewrite {
        (self.rewrite)(source)
    }

    fn versioning(&self) -> Option<Versioning> {
        self.versioning
    }
}

/// A cataloged transformation that is not automated
///
/// Advisory rules are always opt-in and always decline. They exist so the
/// catalog can list modernizations that need a human, such as converting
/// classes to records, without pretending to perform them.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryRule {
    name: &'static str,
    description: &'static str,
    min_level: LanguageLevel,
}

impl AdvisoryRule {
    pub const fn new(name: &'static str, description: &'static str, min_level: LanguageLevel) -> Self {
        Self {
            name,
            description,
            min_level,
        }
    }
}

impl Rule for AdvisoryRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn apply(&self, _source: &str) -> Rewrite {
        Rewrite::Declined
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::opt_in(self.min_level))
    }

    fn is_advisory(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_declines_identical_text() {
        assert_eq!(Rewrite::compare("a;", "a;".to_string()), Rewrite::Declined);
        assert_eq!(
            Rewrite::compare("a;;", "a;".to_string()),
            Rewrite::Applied("a;".to_string())
        );
    }

    #[test]
    fn test_into_parts() {
        assert_eq!(Rewrite::Declined.into_parts("x"), ("x".to_string(), false));
        assert_eq!(
            Rewrite::Applied("y".to_string()).into_parts("x"),
            ("y".to_string(), true)
        );
    }

    #[test]
    fn test_text_rule_metadata() {
        let rule = TextRule::new("upper", "Uppercase everything", |s: &str| {
            Rewrite::compare(s, s.to_uppercase())
        })
        .with_versioning(Versioning::safe(LanguageLevel::CSharp8));

        assert_eq!(rule.name(), "upper");
        assert_eq!(rule.min_level(), Some(LanguageLevel::CSharp8));
        assert!(rule.is_safe());
        assert!(rule.apply("abc").is_applied());
        assert!(!rule.apply("ABC").is_applied());
    }

    #[test]
    fn test_unversioned_rule_is_not_safe() {
        let rule = TextRule::new("noop", "Does nothing", |_: &str| Rewrite::Declined);
        assert_eq!(rule.versioning(), None);
        assert!(!rule.is_safe());
    }

    #[test]
    fn test_advisory_rule_always_declines() {
        let rule = AdvisoryRule::new("record-type", "Suggest records", LanguageLevel::CSharp9);
        assert!(rule.is_advisory());
        assert!(!rule.is_safe());
        assert_eq!(rule.apply("public class Foo {}"), Rewrite::Declined);
        assert_eq!(rule.min_level(), Some(LanguageLevel::CSharp9));
    }
}
