//! LINQ call-chain simplifications.

use crate::level::LanguageLevel;
use crate::rules::csharp::line_prefix;
use crate::rules::patterns::{find_matching_paren, group, replace_all, replace_with, rule_pattern};
use crate::rules::{Rewrite, Rule, Versioning};

rule_pattern!(COUNT_POSITIVE, r"\.Count\(\)\s*(?:>\s*0|>=\s*1|!=\s*0)\b");
rule_pattern!(
    COUNT_ZERO,
    r"((?:\w+\.)*\w+)\.Count\(\)\s*(?:==\s*0|<\s*1)\b"
);

/// `items.Count() > 0` becomes `items.Any()`
pub struct LinqCountAny;

impl Rule for LinqCountAny {
    fn name(&self) -> &'static str {
        "linq-count-any"
    }

    fn description(&self) -> &'static str {
        "Use Any() instead of Count() > 0 for performance"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_all(&COUNT_POSITIVE, source, ".Any()");
        let text = replace_with(&COUNT_ZERO, &text, |caps| {
            let start = caps.get(0)?.start();
            // Negating a receiver that continues an earlier expression would
            // split it (`a?.!b.Any()`)
            let before = text[..start].chars().next_back();
            if matches!(before, Some('.' | '?' | ')' | ']' | '!')) {
                return None;
            }
            Some(format!("!{}.Any()", group(caps, 1)))
        });
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(WHERE_CALL, r"\.Where\s*\(");
rule_pattern!(
    TERMINAL_CALL,
    r"^\.(First|FirstOrDefault|Single|SingleOrDefault|Last|LastOrDefault|Any|Count)\(\)"
);

/// `.Where(p).First()` becomes `.First(p)`
pub struct LinqWhereFirst;

impl LinqWhereFirst {
    fn fold(text: &str) -> String {
        let (Some(where_call), Some(terminal)) = (WHERE_CALL.as_ref(), TERMINAL_CALL.as_ref()) else {
            return text.to_string();
        };

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for found in where_call.find_iter(text) {
            if found.start() < last {
                continue;
            }
            let open = found.end() - 1;
            let Some(close) = find_matching_paren(text, open) else {
                continue;
            };
            let Some(caps) = terminal.captures(&text[close + 1..]) else {
                continue;
            };
            let call_len = caps.get(0).map_or(0, |m| m.len());
            // Predicates can hold their own Where chains
            let predicate = Self::fold(&text[open + 1..close]);

            output.push_str(&text[last..found.start()]);
            output.push_str(&format!(".{}({predicate})", group(&caps, 1)));
            last = close + 1 + call_len;
        }
        output.push_str(&text[last..]);
        output
    }
}

impl Rule for LinqWhereFirst {
    fn name(&self) -> &'static str {
        "linq-where-first"
    }

    fn description(&self) -> &'static str {
        "Pass Where() predicates directly to First(), Any(), Count() and friends"
    }

    fn apply(&self, source: &str) -> Rewrite {
        Rewrite::compare(source, Self::fold(source))
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    CONCAT_TO_COLLECTION,
    r"(\w+)\.Concat\s*\(\s*(\w+)\s*\)\.To(?:List|Array)\s*\(\s*\)"
);
rule_pattern!(
    STATIC_CONCAT_TO_LIST,
    r"Enumerable\.Concat\s*\(\s*(\w+)\s*,\s*(\w+)\s*\)\.ToList\s*\(\s*\)"
);
rule_pattern!(
    SINGLETON_CONCAT,
    r"new\s+List<\w+>\s*\{\s*(\w+)\s*\}\.Concat\s*\(\s*(\w+)\s*\)\.ToList\s*\(\s*\)"
);
rule_pattern!(APPEND_TO_ARRAY, r"(\w+)\.Append\s*\(\s*(\w+)\s*\)\.ToArray\s*\(\s*\)");
rule_pattern!(PREPEND_TO_ARRAY, r"(\w+)\.Prepend\s*\(\s*(\w+)\s*\)\.ToArray\s*\(\s*\)");

/// `a.Concat(b).ToList()` becomes `[..a, ..b]`
///
/// Collection expressions have no natural type, so `var` declarations are
/// left alone.
pub struct SpreadOperator;

impl SpreadOperator {
    fn spread(text: &str, pattern: &Option<regex::Regex>, shape: fn(&str, &str) -> String) -> String {
        replace_with(pattern, text, |caps| {
            let start = caps.get(0)?.start();
            if line_prefix(text, start).trim_start().starts_with("var ") {
                return None;
            }
            Some(shape(group(caps, 1), group(caps, 2)))
        })
    }
}

impl Rule for SpreadOperator {
    fn name(&self) -> &'static str {
        "spread-operator"
    }

    fn description(&self) -> &'static str {
        "Use the spread element in collection expressions (C# 12+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = Self::spread(source, &SINGLETON_CONCAT, |a, b| format!("[{a}, ..{b}]"));
        let text = Self::spread(&text, &CONCAT_TO_COLLECTION, |a, b| format!("[..{a}, ..{b}]"));
        let text = Self::spread(&text, &STATIC_CONCAT_TO_LIST, |a, b| format!("[..{a}, ..{b}]"));
        let text = Self::spread(&text, &APPEND_TO_ARRAY, |a, b| format!("[..{a}, {b}]"));
        let text = Self::spread(&text, &PREPEND_TO_ARRAY, |a, b| format!("[{b}, ..{a}]"));
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp12))
    }
}
