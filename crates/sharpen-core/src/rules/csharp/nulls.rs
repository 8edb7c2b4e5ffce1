//! Null checks, null-conditional operators and argument guards.

use regex::Regex;

use crate::level::LanguageLevel;
use crate::rules::csharp::followed_by_else;
use crate::rules::patterns::{dynamic, group, replace_all, replace_with, rule_pattern};
use crate::rules::{Rewrite, Rule, Versioning};

rule_pattern!(
    CONDITIONAL_MEMBER,
    r"(\w+)\s*!=\s*null\s*\?\s*(\w+)\.(\w+)\s*:\s*null\b"
);

/// `x != null ? x.Name : null` becomes `x?.Name`
pub struct NullPropagation;

impl Rule for NullPropagation {
    fn name(&self) -> &'static str {
        "null-propagation"
    }

    fn description(&self) -> &'static str {
        "Use the null-conditional operator ?. (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&CONDITIONAL_MEMBER, source, |caps| {
            (group(caps, 1) == group(caps, 2))
                .then(|| format!("{}?.{}", group(caps, 1), group(caps, 3)))
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    ASSIGN_WHEN_NULL,
    r"if\s*\(\s*(\w+)\s*==\s*null\s*\)\s*(?:\{\s*(\w+)\s*=\s*([^;{}]+);\s*\}|(\w+)\s*=\s*([^;{}]+);)"
);

/// `if (x == null) x = value;` becomes `x ??= value;`
pub struct NullCoalescingAssignment;

impl Rule for NullCoalescingAssignment {
    fn name(&self) -> &'static str {
        "null-coalescing-assignment"
    }

    fn description(&self) -> &'static str {
        "Use the null-coalescing assignment operator ??= (C# 8+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&ASSIGN_WHEN_NULL, source, |caps| {
            let whole = caps.get(0)?;
            let (target, value) = match caps.get(2) {
                Some(target) => (target.as_str(), group(caps, 3)),
                None => (group(caps, 4), group(caps, 5)),
            };
            if target != group(caps, 1) || followed_by_else(source, whole.end()) {
                return None;
            }
            Some(format!("{target} ??= {};", value.trim()))
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp8))
    }
}

rule_pattern!(AS_NOT_NULL, r"\(\s*(\w+)\s+as\s+(\w+)\s*\)\s*!=\s*null\b");

/// `(obj as Foo) != null` becomes `obj is Foo`
pub struct PatternMatching;

impl Rule for PatternMatching {
    fn name(&self) -> &'static str {
        "pattern-matching"
    }

    fn description(&self) -> &'static str {
        "Use 'is' type patterns instead of 'as' followed by a null check (C# 7+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        Rewrite::compare(source, replace_all(&AS_NOT_NULL, source, "${1} is ${2}"))
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp7))
    }
}

rule_pattern!(EQUALS_NULL, r"(\w+)\s*==\s*null\b");
rule_pattern!(NOT_EQUALS_NULL, r"(\w+)\s*!=\s*null\b");

/// `x == null` becomes `x is null`, `x != null` becomes `x is not null`
pub struct PatternMatchingNull;

impl Rule for PatternMatchingNull {
    fn name(&self) -> &'static str {
        "pattern-matching-null"
    }

    fn description(&self) -> &'static str {
        "Use 'is null' and 'is not null' patterns (C# 9+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_all(&EQUALS_NULL, source, "${1} is null");
        let text = replace_all(&NOT_EQUALS_NULL, &text, "${1} is not null");
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp9))
    }
}

const INVOCATION: &str = r"(\w+)(?:\.Invoke)?\s*\(([^)]*)\)\s*;";

rule_pattern!(
    GUARDED_INVOKE,
    &format!(r"if\s*\(\s*(\w+)\s*!=\s*null\s*\)\s*{INVOCATION}")
);
rule_pattern!(
    GUARDED_INVOKE_BLOCK,
    &format!(r"if\s*\(\s*(\w+)\s*!=\s*null\s*\)\s*\{{\s*{INVOCATION}\s*\}}")
);

/// `if (handler != null) handler(args);` becomes `handler?.Invoke(args);`
pub struct ConditionalAccessDelegate;

impl ConditionalAccessDelegate {
    fn rewrite(text: &str, pattern: &Option<Regex>) -> String {
        replace_with(pattern, text, |caps| {
            let whole = caps.get(0)?;
            let handler = group(caps, 1);
            if handler != group(caps, 2) || followed_by_else(text, whole.end()) {
                return None;
            }
            Some(format!("{handler}?.Invoke({});", group(caps, 3)))
        })
    }
}

impl Rule for ConditionalAccessDelegate {
    fn name(&self) -> &'static str {
        "conditional-access-delegate"
    }

    fn description(&self) -> &'static str {
        "Invoke delegates and events through ?.Invoke (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = Self::rewrite(source, &GUARDED_INVOKE_BLOCK);
        let text = Self::rewrite(&text, &GUARDED_INVOKE);
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    GUARD_THEN_ASSIGN,
    r#"if\s*\(\s*(\w+)\s*==\s*null\s*\)\s*(\{)?\s*throw\s+new\s+ArgumentNullException\s*\(\s*(nameof\s*\(\s*(\w+)\s*\)|"\w+")\s*\)\s*;\s*(\})?[ \t]*\r?\n\s*(this\.)?(\w+)\s*=\s*(\w+)\s*;"#
);

/// A null guard followed by an assignment collapses into `?? throw`
///
/// ```text
/// if (name == null) throw new ArgumentNullException(nameof(name));
/// _name = name;
/// ```
/// becomes `_name = name ?? throw new ArgumentNullException(nameof(name));`
pub struct ThrowExpression;

impl Rule for ThrowExpression {
    fn name(&self) -> &'static str {
        "throw-expression"
    }

    fn description(&self) -> &'static str {
        "Fold null guards into throw expressions (C# 7+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&GUARD_THEN_ASSIGN, source, |caps| {
            let checked = group(caps, 1);
            if caps.get(2).is_some() != caps.get(5).is_some() || group(caps, 8) != checked {
                return None;
            }
            let argument = match caps.get(4) {
                Some(named) if named.as_str() == checked => format!("nameof({checked})"),
                Some(_) => return None,
                None => group(caps, 3).to_string(),
            };
            Some(format!(
                "{}{} = {checked} ?? throw new ArgumentNullException({argument});",
                group(caps, 6),
                group(caps, 7)
            ))
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp7))
    }
}

const THROW_NULL: &str =
    r"throw\s+new\s+ArgumentNullException\s*\(\s*nameof\s*\(\s*(\w+)\s*\)\s*\)\s*;";
const THROW_EMPTY: &str =
    r"throw\s+new\s+Argument(?:Null)?Exception\s*\([^)]*nameof\s*\(\s*(\w+)\s*\)[^)]*\)\s*;";

rule_pattern!(
    NULL_GUARD,
    &format!(
        r"(?m)^([ \t]*)if\s*\(\s*(\w+)\s*(?:is\s+null|==\s*null)\s*\)\s*(?:\{{\s*{THROW_NULL}\s*\}}|{THROW_NULL})"
    )
);
rule_pattern!(
    EMPTY_GUARD,
    &format!(
        r"(?m)^([ \t]*)if\s*\(\s*[sS]tring\.IsNullOrEmpty\s*\(\s*(\w+)\s*\)\s*\)\s*(?:\{{\s*{THROW_EMPTY}\s*\}}|{THROW_EMPTY})"
    )
);

/// Argument guards become `ArgumentNullException.ThrowIfNull(x)` and
/// `ArgumentException.ThrowIfNullOrEmpty(x)`
///
/// Guards directly followed by an assignment from the same argument are left
/// for [`ThrowExpression`].
pub struct ThrowHelper;

impl ThrowHelper {
    fn rewrite(text: &str, pattern: &Option<Regex>, helper: &str) -> String {
        replace_with(pattern, text, |caps| {
            let whole = caps.get(0)?;
            let argument = group(caps, 2);
            let named = caps.get(3).or_else(|| caps.get(4))?.as_str();
            if named != argument || assigns_from(&text[whole.end()..], argument) {
                return None;
            }
            Some(format!("{}{helper}({argument});", group(caps, 1)))
        })
    }
}

/// Whether the next line assigns `argument` to something
fn assigns_from(rest: &str, argument: &str) -> bool {
    dynamic(&format!(r"^[ \t]*\r?\n\s*(?:this\.)?\w+\s*=\s*{}\s*;", regex::escape(argument)))
        .is_some_and(|re| re.is_match(rest))
}

impl Rule for ThrowHelper {
    fn name(&self) -> &'static str {
        "throw-helper"
    }

    fn description(&self) -> &'static str {
        "Use ArgumentNullException.ThrowIfNull and friends (C# 10+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = Self::rewrite(source, &NULL_GUARD, "ArgumentNullException.ThrowIfNull");
        let text = Self::rewrite(&text, &EMPTY_GUARD, "ArgumentException.ThrowIfNullOrEmpty");
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp10))
    }
}

rule_pattern!(
    NULL_ARG_LITERAL,
    r#"throw\s+new\s+ArgumentNullException\s*\(\s*"(\w+)"\s*\)"#
);
rule_pattern!(
    ARG_LITERAL,
    r#"throw\s+new\s+ArgumentException\s*\(\s*("[^"]*")\s*,\s*"(\w+)"\s*\)"#
);
rule_pattern!(
    RANGE_ARG_LITERAL,
    r#"throw\s+new\s+ArgumentOutOfRangeException\s*\(\s*"(\w+)"\s*\)"#
);

/// `throw new ArgumentNullException("x")` becomes
/// `throw new ArgumentNullException(nameof(x))`
pub struct NameofExpression;

impl Rule for NameofExpression {
    fn name(&self) -> &'static str {
        "nameof-expression"
    }

    fn description(&self) -> &'static str {
        "Use nameof() for ArgumentNullException and similar (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_all(
            &NULL_ARG_LITERAL,
            source,
            "throw new ArgumentNullException(nameof(${1}))",
        );
        let text = replace_all(
            &ARG_LITERAL,
            &text,
            "throw new ArgumentException(${1}, nameof(${2}))",
        );
        let text = replace_all(
            &RANGE_ARG_LITERAL,
            &text,
            "throw new ArgumentOutOfRangeException(nameof(${1}))",
        );
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn applied(rule: &dyn Rule, source: &str) -> String {
        match rule.apply(source) {
            Rewrite::Applied(text) => text,
            Rewrite::Declined => panic!("{} declined on {source:?}", rule.name()),
        }
    }

    #[test]
    fn test_null_propagation_requires_same_receiver() {
        assert_eq!(
            applied(&NullPropagation, "var n = user != null ? user.Name : null;"),
            "var n = user?.Name;"
        );
        assert_eq!(
            NullPropagation.apply("var n = a != null ? b.Name : null;"),
            Rewrite::Declined
        );
    }

    #[test]
    fn test_null_coalescing_assignment() {
        assert_eq!(
            applied(&NullCoalescingAssignment, "if (cache == null) cache = new Cache();"),
            "cache ??= new Cache();"
        );
        assert_eq!(
            applied(&NullCoalescingAssignment, "if (list == null)\n{\n    list = Load();\n}"),
            "list ??= Load();"
        );
    }

    #[test]
    fn test_null_coalescing_keeps_else_branches() {
        let source = "if (x == null) x = a; else Use(x);";
        assert_eq!(NullCoalescingAssignment.apply(source), Rewrite::Declined);
    }

    #[test]
    fn test_pattern_matching_as_cast() {
        assert_eq!(
            applied(&PatternMatching, "if ((shape as Circle) != null)"),
            "if (shape is Circle)"
        );
    }

    #[test]
    fn test_pattern_matching_null() {
        assert_eq!(
            applied(&PatternMatchingNull, "if (a == null || b != null)"),
            "if (a is null || b is not null)"
        );
        assert_eq!(PatternMatchingNull.apply("if (a == nullable)"), Rewrite::Declined);
        assert_eq!(PatternMatchingNull.apply("if (a is null)"), Rewrite::Declined);
    }

    #[test]
    fn test_conditional_access_delegate() {
        assert_eq!(
            applied(&ConditionalAccessDelegate, "if (Changed != null) Changed(this, args);"),
            "Changed?.Invoke(this, args);"
        );
        assert_eq!(
            applied(
                &ConditionalAccessDelegate,
                "if (callback != null)\n{\n    callback.Invoke(result);\n}"
            ),
            "callback?.Invoke(result);"
        );
        assert_eq!(
            ConditionalAccessDelegate.apply("if (a != null) b(a);"),
            Rewrite::Declined
        );
    }

    #[test]
    fn test_throw_expression() {
        let source = "        if (name == null) throw new ArgumentNullException(nameof(name));\n        _name = name;";
        assert_eq!(
            applied(&ThrowExpression, source),
            "        _name = name ?? throw new ArgumentNullException(nameof(name));"
        );
    }

    #[test]
    fn test_throw_expression_with_this_and_braces() {
        let source = "if (repo == null)\n{\n    throw new ArgumentNullException(\"repo\");\n}\nthis.repo = repo;";
        assert_eq!(
            applied(&ThrowExpression, source),
            "this.repo = repo ?? throw new ArgumentNullException(\"repo\");"
        );
    }

    #[test]
    fn test_throw_helper_keeps_indentation() {
        let source = "    void Run(Job job)\n    {\n        if (job is null)\n            throw new ArgumentNullException(nameof(job));\n        job.Start();\n    }";
        let expected = "    void Run(Job job)\n    {\n        ArgumentNullException.ThrowIfNull(job);\n        job.Start();\n    }";
        assert_eq!(applied(&ThrowHelper, source), expected);
    }

    #[test]
    fn test_throw_helper_does_not_swallow_enclosing_brace() {
        let source = "{\n    if (x == null) throw new ArgumentNullException(nameof(x));\n}\nNext();";
        assert_eq!(
            applied(&ThrowHelper, source),
            "{\n    ArgumentNullException.ThrowIfNull(x);\n}\nNext();"
        );
    }

    #[test]
    fn test_throw_helper_leaves_assignments_to_throw_expression() {
        let source = "    if (x == null) throw new ArgumentNullException(nameof(x));\n    _x = x;";
        assert_eq!(ThrowHelper.apply(source), Rewrite::Declined);
    }

    #[test]
    fn test_throw_helper_null_or_empty() {
        let source = "    if (string.IsNullOrEmpty(key)) throw new ArgumentException(\"Required\", nameof(key));";
        assert_eq!(
            applied(&ThrowHelper, source),
            "    ArgumentException.ThrowIfNullOrEmpty(key);"
        );
    }

    #[test]
    fn test_nameof_expression() {
        let source = "throw new ArgumentNullException(\"id\");\nthrow new ArgumentException(\"Bad\", \"name\");";
        assert_eq!(
            applied(&NameofExpression, source),
            "throw new ArgumentNullException(nameof(id));\nthrow new ArgumentException(\"Bad\", nameof(name));"
        );
    }
}
