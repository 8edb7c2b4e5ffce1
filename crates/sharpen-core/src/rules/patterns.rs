//! Text matching helpers shared by the built-in rules.

use regex::{Captures, Regex};

/// Declare a lazily compiled pattern.
///
/// A pattern that fails to compile becomes `None` and every rule using it
/// declines, so a bad pattern can never take the pipeline down.
macro_rules! rule_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: std::sync::LazyLock<Option<regex::Regex>> =
            std::sync::LazyLock::new(|| regex::Regex::new($regex_str).ok());
    };
}

pub(crate) use rule_pattern;

/// Replace every match of `pattern` using a `$1`-style template.
pub fn replace_all(pattern: &Option<Regex>, text: &str, template: &str) -> String {
    match pattern {
        Some(re) => re.replace_all(text, template).into_owned(),
        None => text.to_string(),
    }
}

/// Replace every match of `pattern` with the result of `rewrite`.
///
/// Returning `None` from `rewrite` keeps the matched text as-is, which lets a
/// rule verify captures (for example, that two identifiers are the same)
/// before committing to a replacement.
pub fn replace_with<F>(pattern: &Option<Regex>, text: &str, mut rewrite: F) -> String
where
    F: FnMut(&Captures<'_>) -> Option<String>,
{
    let Some(re) = pattern else {
        return text.to_string();
    };

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        output.push_str(&text[last..whole.start()]);
        match rewrite(&caps) {
            Some(replacement) => output.push_str(&replacement),
            None => output.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    output.push_str(&text[last..]);
    output
}

/// Whether `pattern` compiled and matches `text`
pub fn is_match(pattern: &Option<Regex>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Compile a pattern built at runtime (e.g. around an escaped identifier)
pub fn dynamic(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

/// Whether `text` mentions `identifier` as a whole word
pub fn mentions(text: &str, identifier: &str) -> bool {
    dynamic(&format!(r"\b{}\b", regex::escape(identifier))).is_some_and(|re| re.is_match(text))
}

/// Capture group `index` as a string slice, empty when absent
pub fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

/// Byte offset of the `}` closing the `{` at `open`
pub fn find_matching_brace(text: &str, open: usize) -> Option<usize> {
    find_closing(text, open, b'{', b'}')
}

/// Byte offset of the `)` closing the `(` at `open`
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    find_closing(text, open, b'(', b')')
}

fn find_closing(text: &str, open: usize, opener: u8, closer: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&opener) {
        return None;
    }

    let mut depth = 1usize;
    for (offset, &byte) in bytes[open + 1..].iter().enumerate() {
        if byte == opener {
            depth += 1;
        } else if byte == closer {
            depth -= 1;
            if depth == 0 {
                return Some(open + 1 + offset);
            }
        }
    }
    None
}

/// Header text of the innermost `{` block that encloses `at`
///
/// The header runs back from that brace to the previous `;`, `{` or `}`.
/// Returns `None` at the top level of the file.
pub fn enclosing_block_header(text: &str, at: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut open = None;
    for idx in (0..at.min(bytes.len())).rev() {
        match bytes[idx] {
            b'}' => depth += 1,
            b'{' if depth == 0 => {
                open = Some(idx);
                break;
            }
            b'{' => depth -= 1,
            _ => {}
        }
    }

    let open = open?;
    let start = text[..open]
        .rfind(|c: char| matches!(c, ';' | '{' | '}'))
        .map_or(0, |idx| idx + 1);
    Some(text[start..open].trim())
}

/// Whether `at` sits directly inside a class, struct, record or interface body
pub fn in_type_body(text: &str, at: usize) -> bool {
    enclosing_block_header(text, at).is_some_and(|header| {
        header
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| matches!(word, "class" | "struct" | "record" | "interface"))
    })
}

/// Split an argument list on commas that are not nested in brackets
pub fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (idx, ch) in args.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&args[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < args.len() {
        parts.push(&args[start..]);
    }
    parts
}
