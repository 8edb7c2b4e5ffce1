//! Declaration and expression shorthands: `=>` getters, `var`, target-typed
//! `new` and `default` literals.

use crate::level::LanguageLevel;
use crate::rules::csharp::line_prefix;
use crate::rules::patterns::{group, in_type_body, replace_all, replace_with, rule_pattern};
use crate::rules::{Rewrite, Rule, Versioning};

rule_pattern!(
    GETTER_PROPERTY,
    r"((?:public|private|protected|internal|static|\s)+\w+(?:<[^>]+>)?\s+\w+)\s*\{\s*get\s*\{\s*return\s+([^;]+);\s*\}\s*\}"
);

/// `public int X { get { return _x; } }` becomes `public int X => _x;`
pub struct ExpressionBody;

impl Rule for ExpressionBody {
    fn name(&self) -> &'static str {
        "expression-body"
    }

    fn description(&self) -> &'static str {
        "Convert simple getter properties to expression-bodied members (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        Rewrite::compare(source, replace_all(&GETTER_PROPERTY, source, "${1} => ${2};"))
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    EXPLICIT_LOCAL,
    r"\b([A-Z][a-zA-Z0-9_]*(?:<[^>]+>)?)\s+(\w+)\s*=\s*new\s+([A-Z][a-zA-Z0-9_]*(?:<[^>]+>)?)\s*([(\[{])"
);

const MEMBER_MODIFIERS: [&str; 8] = [
    "public", "private", "protected", "internal", "static", "readonly", "const", "volatile",
];

/// `List<int> xs = new List<int>();` becomes `var xs = new List<int>();`
///
/// Fields are left alone, with or without modifiers: `var` is only legal
/// for locals.
pub struct VarPattern;

impl Rule for VarPattern {
    fn name(&self) -> &'static str {
        "var-pattern"
    }

    fn description(&self) -> &'static str {
        "Use var for locals whose type is obvious from a new expression"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&EXPLICIT_LOCAL, source, |caps| {
            let declared = group(caps, 1);
            if declared != group(caps, 3) {
                return None;
            }
            let start = caps.get(0)?.start();
            let prefix = line_prefix(source, start);
            if prefix
                .split_whitespace()
                .any(|word| MEMBER_MODIFIERS.contains(&word))
                || in_type_body(source, start)
            {
                return None;
            }
            Some(format!(
                "var {} = new {}{}",
                group(caps, 2),
                declared,
                group(caps, 4)
            ))
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    REDUNDANT_NEW_TYPE,
    r"(\b(?:private|public|protected|internal|static|readonly|\s)+)([A-Z][a-zA-Z0-9_]*(?:<[^>]+>)?)\s+(\w+)\s*=\s*new\s+([A-Z][a-zA-Z0-9_]*(?:<[^>]+>)?)\s*\(([^)]*)\)\s*;"
);

/// `private Dictionary<K, V> _map = new Dictionary<K, V>();` becomes
/// `private Dictionary<K, V> _map = new();`
pub struct TargetTypedNew;

impl Rule for TargetTypedNew {
    fn name(&self) -> &'static str {
        "target-typed-new"
    }

    fn description(&self) -> &'static str {
        "Use target-typed new expressions (C# 9+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&REDUNDANT_NEW_TYPE, source, |caps| {
            let declared = group(caps, 2);
            (declared == group(caps, 4)).then(|| {
                format!(
                    "{}{} {} = new({});",
                    group(caps, 1),
                    declared,
                    group(caps, 3),
                    group(caps, 5)
                )
            })
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::opt_in(LanguageLevel::CSharp9))
    }
}

rule_pattern!(
    DEFAULT_OF_DECLARED,
    r"(\w+(?:<[^>]+>)?)\s+(\w+)\s*=\s*default\s*\(\s*(\w+(?:<[^>]+>)?)\s*\)\s*;"
);
rule_pattern!(
    RETURN_DEFAULT_OF,
    r"return\s+default\s*\(\s*\w+(?:<[^>]+>)?\s*\)\s*;"
);

/// `T value = default(T);` becomes `T value = default;`
pub struct DefaultLiteral;

impl Rule for DefaultLiteral {
    fn name(&self) -> &'static str {
        "default-literal"
    }

    fn description(&self) -> &'static str {
        "Use the default literal instead of default(T) (C# 7.1+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let declarations = replace_with(&DEFAULT_OF_DECLARED, source, |caps| {
            (group(caps, 1) == group(caps, 3))
                .then(|| format!("{} {} = default;", group(caps, 1), group(caps, 2)))
        });
        let rewritten = replace_all(&RETURN_DEFAULT_OF, &declarations, "return default;");
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp7))
    }
}
