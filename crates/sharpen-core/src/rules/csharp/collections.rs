//! Collection expressions, index/range operators and list patterns.

use crate::level::LanguageLevel;
use crate::rules::csharp::line_prefix;
use crate::rules::patterns::{find_matching_brace, group, replace_all, replace_with, rule_pattern};
use crate::rules::{Rewrite, Rule, Versioning};

const ELEMENT_TYPE: &str = "(?:string|int|long|double|float|bool|byte|char|decimal|short|uint|ulong|ushort|sbyte|object|[A-Z][a-zA-Z0-9_]*)";

rule_pattern!(
    EMPTY_LIST,
    r"(List<[^>]+>\s+\w+\s*=\s*)new\s+List<[^>]+>\(\)"
);
rule_pattern!(
    EMPTY_ARRAY,
    &format!(r"({ELEMENT_TYPE}\[\]\s+\w+\s*=\s*)new\s+{ELEMENT_TYPE}\[\]\s*\{{\s*\}}")
);
rule_pattern!(
    ARRAY_EMPTY_CALL,
    &format!(r"((?:{ELEMENT_TYPE}\[\]|List<[^>]+>)\s+\w+\s*=\s*)Array\.Empty<[^>]+>\(\)")
);
rule_pattern!(
    PRIMITIVE_ARRAY_INITIALIZER,
    r"new\s+(?:string|int|long|double|float|bool|byte|char|decimal|short|uint|ulong|ushort|sbyte)\[\]\s*\{"
);

/// Explicitly typed empty collections and array initializers become `[]`
/// and `[a, b, c]`
pub struct CollectionExpression;

impl CollectionExpression {
    fn inline_initializers(text: &str) -> String {
        let Some(pattern) = PRIMITIVE_ARRAY_INITIALIZER.as_ref() else {
            return text.to_string();
        };

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for found in pattern.find_iter(text) {
            if found.start() < last {
                continue;
            }
            let open = found.end() - 1;
            let Some(close) = find_matching_brace(text, open) else {
                continue;
            };
            let inner = text[open + 1..close].trim();
            if inner.is_empty() || inner.contains('{') {
                continue;
            }
            // No natural type for `var`, and `[..].Length` does not parse
            if line_prefix(text, found.start()).trim_start().starts_with("var ")
                || text[close + 1..].starts_with('.')
            {
                continue;
            }
            output.push_str(&text[last..found.start()]);
            output.push('[');
            output.push_str(inner);
            output.push(']');
            last = close + 1;
        }
        output.push_str(&text[last..]);
        output
    }
}

impl Rule for CollectionExpression {
    fn name(&self) -> &'static str {
        "collection-expression"
    }

    fn description(&self) -> &'static str {
        "Use collection expressions for arrays and lists (C# 12+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_all(&EMPTY_LIST, source, "${1}[]");
        let text = replace_all(&EMPTY_ARRAY, &text, "${1}[]");
        let text = replace_all(&ARRAY_EMPTY_CALL, &text, "${1}[]");
        let text = Self::inline_initializers(&text);
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp12))
    }
}

rule_pattern!(
    INDEX_FROM_LENGTH,
    r"(\w+)\s*\[\s*(\w+)\.Length\s*-\s*(\d+)\s*\]"
);
rule_pattern!(
    SUBSTRING_PREFIX,
    r"(\w+)\.Substring\s*\(\s*0\s*,\s*(\w+)\s*\)"
);
rule_pattern!(SUBSTRING_SUFFIX, r"(\w+)\.Substring\s*\(\s*(\w+)\s*\)");

/// `arr[arr.Length - 1]` becomes `arr[^1]`; `s.Substring(0, n)` becomes `s[..n]`
pub struct IndexRange;

impl Rule for IndexRange {
    fn name(&self) -> &'static str {
        "index-range"
    }

    fn description(&self) -> &'static str {
        "Use index-from-end and range operators (C# 8+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_with(&INDEX_FROM_LENGTH, source, |caps| {
            (group(caps, 1) == group(caps, 2))
                .then(|| format!("{}[^{}]", group(caps, 1), group(caps, 3)))
        });
        let text = replace_all(&SUBSTRING_PREFIX, &text, "${1}[..${2}]");
        let text = replace_all(&SUBSTRING_SUFFIX, &text, "${1}[${2}..]");
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp8))
    }
}

const COMPARAND: &str = r"([^&|);?:,]+)";

rule_pattern!(FIRST_ELEMENT, &format!(r"(\w+)\[0\]\s*==\s*{COMPARAND}"));
rule_pattern!(LAST_BY_HAT, &format!(r"(\w+)\[\s*\^1\s*\]\s*==\s*{COMPARAND}"));
rule_pattern!(
    LAST_BY_COUNT,
    &format!(r"(\w+)\[\s*(\w+)\.(?:Count|Length)\s*-\s*1\s*\]\s*==\s*{COMPARAND}")
);
rule_pattern!(IS_EMPTY, r"(\w+)\.(?:Count|Length)\s*==\s*0\b");
rule_pattern!(NOT_EMPTY, r"(\w+)\.(?:Count|Length)\s*>\s*0\b");
rule_pattern!(NOT_ANY, r"!(\w+)\.Any\(\)");
rule_pattern!(ANY, r"(\w+)\.Any\(\)");
rule_pattern!(SINGLE_ELEMENT, r"(\w+)\.(?:Count|Length)\s*==\s*1\b");

/// Element and length checks become list patterns (`xs is [_, ..]`)
///
/// Opt-in: list patterns need an indexable, countable type, which a text
/// rewrite cannot confirm.
pub struct ListPattern;

impl Rule for ListPattern {
    fn name(&self) -> &'static str {
        "list-pattern"
    }

    fn description(&self) -> &'static str {
        "Use list patterns for element and length checks (C# 11+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_with(&FIRST_ELEMENT, source, |caps| {
            Some(element_pattern(group(caps, 1), "{}, ..", group(caps, 2)))
        });
        let text = replace_with(&LAST_BY_HAT, &text, |caps| {
            Some(element_pattern(group(caps, 1), ".., {}", group(caps, 2)))
        });
        let text = replace_with(&LAST_BY_COUNT, &text, |caps| {
            (group(caps, 1) == group(caps, 2))
                .then(|| element_pattern(group(caps, 1), ".., {}", group(caps, 3)))
        });
        let text = replace_all(&IS_EMPTY, &text, "${1} is []");
        let text = replace_all(&NOT_EMPTY, &text, "${1} is [_, ..]");
        let text = replace_all(&NOT_ANY, &text, "${1} is []");
        let text = replace_all(&ANY, &text, "${1} is [_, ..]");
        let text = replace_all(&SINGLE_ELEMENT, &text, "${1} is [_]");
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::opt_in(LanguageLevel::CSharp11))
    }
}

/// `list is [<shape>]` with `{}` in `shape` standing for the comparand;
/// whitespace trailing the comparand is kept outside the brackets
fn element_pattern(list: &str, shape: &str, comparand: &str) -> String {
    let value = comparand.trim_end();
    let trailing = &comparand[value.len()..];
    let elements = shape.replace("{}", value.trim_start());
    format!("{list} is [{elements}]{trailing}")
}
