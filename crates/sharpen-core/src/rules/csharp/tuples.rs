//! Value tuples in place of `System.Tuple` and temporary-variable swaps.

use crate::level::LanguageLevel;
use crate::rules::patterns::{group, mentions, replace_with, rule_pattern};
use crate::rules::{Rewrite, Rule, Versioning};

rule_pattern!(NEW_PAIR, r"new\s+Tuple<\w+,\s*\w+>\s*\(([^()]+)\)");
rule_pattern!(PAIR_TYPE, r"Tuple<(\w+),\s*(\w+)>");

/// `Tuple<int, string>` becomes `(int, string)`
pub struct TupleDeconstruction;

impl Rule for TupleDeconstruction {
    fn name(&self) -> &'static str {
        "tuple-deconstruction"
    }

    fn description(&self) -> &'static str {
        "Use value tuples instead of Tuple<T1, T2> (C# 7+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_with(&NEW_PAIR, source, |caps| Some(format!("({})", group(caps, 1))));
        let text = replace_with(&PAIR_TYPE, &text, |caps| {
            let start = caps.get(0)?.start();
            // `System.Tuple<..>` or `MyTuple<..>` name other types
            let before = text[..start].chars().next_back();
            if before.is_some_and(|c| c == '.' || c.is_alphanumeric() || c == '_') {
                return None;
            }
            Some(format!("({}, {})", group(caps, 1), group(caps, 2)))
        });
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp7))
    }
}

rule_pattern!(SAVE_TO_TEMP, r"^(\s*)(?:\w+\s+)?(\w+)\s*=\s*(\w+)\s*;\s*$");
rule_pattern!(PLAIN_ASSIGN, r"^\s*(\w+)\s*=\s*(\w+)\s*;\s*$");

/// Three-line swaps through a temporary become `(a, b) = (b, a);`
///
/// ```text
/// var temp = a;
/// a = b;
/// b = temp;
/// ```
pub struct TupleSwap;

impl TupleSwap {
    fn is_temp_name(name: &str) -> bool {
        let lowered = name.to_ascii_lowercase();
        matches!(lowered.as_str(), "t" | "swap" | "aux")
            || lowered.starts_with("temp")
            || lowered.starts_with("tmp")
    }

    /// The swap starting at `lines[at]` as `(indent, a, b)`
    fn swap_at<'a>(lines: &[&'a str], at: usize) -> Option<(&'a str, &'a str, &'a str)> {
        let (save, plain) = (SAVE_TO_TEMP.as_ref()?, PLAIN_ASSIGN.as_ref()?);
        let first = save.captures(lines.get(at).copied()?)?;
        let second = plain.captures(lines.get(at + 1).copied()?)?;
        let third = plain.captures(lines.get(at + 2).copied()?)?;

        let (indent, temp, a) = (
            first.get(1)?.as_str(),
            first.get(2)?.as_str(),
            first.get(3)?.as_str(),
        );
        let b = second.get(2)?.as_str();
        let holds = second.get(1)?.as_str() == a
            && third.get(1)?.as_str() == b
            && third.get(2)?.as_str() == temp;
        if !holds || a == b || !Self::is_temp_name(temp) {
            return None;
        }
        // The temporary disappears, so it must not be read afterwards
        if lines[at + 3..].iter().any(|line| mentions(line, temp)) {
            return None;
        }
        Some((indent, a, b))
    }
}

impl Rule for TupleSwap {
    fn name(&self) -> &'static str {
        "tuple-swap"
    }

    fn description(&self) -> &'static str {
        "Swap variables with tuple deconstruction instead of a temporary (C# 7+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let lines: Vec<&str> = source.split('\n').collect();
        let mut output: Vec<String> = Vec::with_capacity(lines.len());
        let mut at = 0;

        while at < lines.len() {
            match Self::swap_at(&lines, at) {
                Some((indent, a, b)) => {
                    let line_end = if lines[at].ends_with('\r') { "\r" } else { "" };
                    output.push(format!("{indent}({a}, {b}) = ({b}, {a});{line_end}"));
                    at += 3;
                }
                None => {
                    output.push(lines[at].to_string());
                    at += 1;
                }
            }
        }

        Rewrite::compare(source, output.join("\n"))
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp7))
    }
}
