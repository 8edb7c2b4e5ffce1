//! String formatting and comparison rewrites.

use crate::level::LanguageLevel;
use crate::rules::patterns::{group, replace_all, replace_with, rule_pattern, split_top_level};
use crate::rules::{Rewrite, Rule, Versioning};

rule_pattern!(
    STRING_FORMAT,
    r#"[sS]tring\.Format\s*\(\s*"([^"]+)"\s*,\s*([^)]+)\)"#
);
rule_pattern!(UNRESOLVED_PLACEHOLDER, r"\{\d");

/// `string.Format("{0} items", count)` becomes `$"{count} items"`
pub struct StringInterpolation;

impl StringInterpolation {
    fn interpolate(format: &str, args: &str) -> Option<String> {
        // `[^)]+` stops at the first `)`, so an opening paren means the
        // argument list was cut short
        if args.contains('(') {
            return None;
        }

        let mut text = format.to_string();
        let mut substituted = false;
        for (index, arg) in split_top_level(args).into_iter().enumerate() {
            let placeholder = format!("{{{index}}}");
            if !text.contains(&placeholder) {
                continue;
            }
            let arg = arg.trim();
            // A bare `:` would be read as a format specifier inside the hole
            let hole = if arg.contains(':') || arg.contains('?') {
                format!("{{({arg})}}")
            } else {
                format!("{{{arg}}}")
            };
            text = text.replace(&placeholder, &hole);
            substituted = true;
        }

        if !substituted {
            return None;
        }
        // Alignment/format specifiers ({0,5}, {0:N2}) and out-of-range indices
        if let Some(re) = UNRESOLVED_PLACEHOLDER.as_ref() {
            if re.is_match(&text) {
                return None;
            }
        }
        Some(format!("$\"{text}\""))
    }
}

impl Rule for StringInterpolation {
    fn name(&self) -> &'static str {
        "string-interpolation"
    }

    fn description(&self) -> &'static str {
        "Convert string.Format to interpolated strings (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&STRING_FORMAT, source, |caps| {
            Self::interpolate(group(caps, 1), group(caps, 2))
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

const LITERAL: &str = r#""(?:[^"\\\n]|\\.)*""#;
const MEMBER_PATH: &str = r"[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*";

rule_pattern!(
    CONCAT_CHAIN,
    &format!(r"(?:{LITERAL}|{MEMBER_PATH})(?:\s*\+\s*(?:{LITERAL}|{MEMBER_PATH}))+")
);
rule_pattern!(CONCAT_OPERAND, &format!("{LITERAL}|{MEMBER_PATH}"));

/// `"Hello " + name + "!"` becomes `$"Hello {name}!"`
///
/// Opt-in: `+` on non-string operands (numbers, custom operators) would
/// change meaning.
pub struct StringConcatInterpolation;

impl StringConcatInterpolation {
    fn interpolate(chain: &str) -> Option<String> {
        let operand = CONCAT_OPERAND.as_ref()?;
        let mut text = String::new();
        let mut literals = 0;
        let mut members = 0;

        for piece in operand.find_iter(chain).map(|m| m.as_str()) {
            if let Some(inner) = piece.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
                text.push_str(&inner.replace('{', "{{").replace('}', "}}"));
                literals += 1;
            } else {
                if piece == "string" || piece == "String" {
                    return None;
                }
                text.push('{');
                text.push_str(piece);
                text.push('}');
                members += 1;
            }
        }

        (literals > 0 && members > 0).then(|| format!("$\"{text}\""))
    }
}

impl Rule for StringConcatInterpolation {
    fn name(&self) -> &'static str {
        "string-concat-interpolation"
    }

    fn description(&self) -> &'static str {
        "Convert string concatenation to interpolation (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let rewritten = replace_with(&CONCAT_CHAIN, source, |caps| {
            let whole = caps.get(0)?;
            let before = source[..whole.start()].chars().next_back();
            if matches!(before, Some('$' | '@' | '.' | '"'))
                || before.is_some_and(|c| c.is_alphanumeric() || c == '_')
            {
                return None;
            }
            // A trailing call, index or member access belongs to the last operand
            let after = source[whole.end()..].chars().next();
            if matches!(after, Some('(' | '[' | '.' | '<' | '"')) {
                return None;
            }
            Self::interpolate(whole.as_str())
        });
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::opt_in(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    NOT_NULL_OR_EMPTY,
    r"!\s*[sS]tring\.IsNullOrEmpty\s*\(\s*(\w+)\s*\)"
);
rule_pattern!(NULL_OR_EMPTY, r"[sS]tring\.IsNullOrEmpty\s*\(\s*(\w+)\s*\)");

/// `string.IsNullOrEmpty(s)` becomes `s is null or ""`
pub struct StringIsNullOrEmpty;

impl Rule for StringIsNullOrEmpty {
    fn name(&self) -> &'static str {
        "string-isnullorempty"
    }

    fn description(&self) -> &'static str {
        "Replace string.IsNullOrEmpty with null-or-empty patterns"
    }

    fn apply(&self, source: &str) -> Rewrite {
        // Negated form first so `!` is folded into the pattern
        let negated = replace_all(&NOT_NULL_OR_EMPTY, source, r#"${1} is not (null or "")"#);
        let rewritten = replace_all(&NULL_OR_EMPTY, &negated, r#"${1} is null or """#);
        Rewrite::compare(source, rewritten)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp11))
    }
}

rule_pattern!(
    PREFIX_BY_SUBSTRING,
    r"(\w+)\.Substring\s*\(\s*0\s*,\s*(\w+)\.Length\s*\)\s*==\s*(\w+)"
);
rule_pattern!(
    SUFFIX_BY_SUBSTRING,
    r"(\w+)\.Substring\s*\(\s*(\w+)\.Length\s*-\s*(\w+)\.Length\s*\)\s*==\s*(\w+)"
);
rule_pattern!(
    FOREACH_TO_CHAR_ARRAY,
    r"foreach\s*\(\s*char\s+(\w+)\s+in\s+(\w+)\.ToCharArray\(\)\s*\)"
);
rule_pattern!(
    STRING_FROM_OWN_CHARS,
    r"new\s+string\s*\(\s*(\w+)\.ToCharArray\(\)\s*\)"
);
rule_pattern!(
    CASE_FOLDED_EQUALITY,
    r"(\w+)\.(ToLower|ToUpper)\(\)\s*==\s*(\w+)\.(ToLower|ToUpper)\(\)"
);

/// Allocation-free replacements for common substring and casing idioms
///
/// Opt-in: `StartsWith`/`EndsWith` and ordinal comparison are culture
/// sensitive in ways the originals were not.
pub struct SpanSuggestion;

impl Rule for SpanSuggestion {
    fn name(&self) -> &'static str {
        "span-suggestion"
    }

    fn description(&self) -> &'static str {
        "Replace allocating Substring and ToCharArray idioms with span-friendly calls (C# 7.2+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_with(&PREFIX_BY_SUBSTRING, source, |caps| {
            (group(caps, 2) == group(caps, 3))
                .then(|| format!("{}.StartsWith({})", group(caps, 1), group(caps, 2)))
        });
        let text = replace_with(&SUFFIX_BY_SUBSTRING, &text, |caps| {
            (group(caps, 1) == group(caps, 2) && group(caps, 3) == group(caps, 4))
                .then(|| format!("{}.EndsWith({})", group(caps, 1), group(caps, 3)))
        });
        let text = replace_all(&FOREACH_TO_CHAR_ARRAY, &text, "foreach (char ${1} in ${2})");
        let text = replace_all(&STRING_FROM_OWN_CHARS, &text, "${1}");
        let text = replace_with(&CASE_FOLDED_EQUALITY, &text, |caps| {
            (group(caps, 2) == group(caps, 4)).then(|| {
                format!(
                    "string.Equals({}, {}, StringComparison.OrdinalIgnoreCase)",
                    group(caps, 1),
                    group(caps, 3)
                )
            })
        });
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::opt_in(LanguageLevel::CSharp7))
    }
}
