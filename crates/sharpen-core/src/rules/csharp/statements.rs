//! File layout and statement-level rewrites: namespaces, usings, exception
//! filters, stopwatches and primary constructors.

use crate::level::LanguageLevel;
use crate::rules::csharp::line_indent;
use crate::rules::patterns::{
    dynamic, find_matching_brace, group, is_match, replace_all, replace_with, rule_pattern,
};
use crate::rules::{Rewrite, Rule, Versioning};

const CATCH_HEAD: &str = r"catch\s*\(\s*(\w+)\s+(\w+)\s*\)\s*\{\s*";

rule_pattern!(
    RETHROW_UNLESS,
    &format!(r"{CATCH_HEAD}if\s*\(\s*!\s*([^)]+\([^)]*\)|[^)]+)\s*\)\s*throw\s*;\s*")
);
rule_pattern!(
    RETHROW_IF_DIFFERENT,
    &format!(r"{CATCH_HEAD}if\s*\(\s*(\w+\.\w+)\s*!=\s*(\w+(?:\.\w+)*)\s*\)\s*throw\s*;\s*")
);
rule_pattern!(
    RETHROW_IF_FALSE,
    &format!(r"{CATCH_HEAD}if\s*\(\s*(\w+(?:\.\w+)?)\s*==\s*false\s*\)\s*throw\s*;\s*")
);
rule_pattern!(SIMPLE_CONDITION, r"^[\w.]+(?:\([^()]*\))?$");

/// A catch block that starts by rethrowing unless a condition holds becomes
/// a `when` filter
///
/// Only single-term conditions are lifted; `!a && b` would need De Morgan.
pub struct ExceptionFilter;

impl ExceptionFilter {
    fn filter(text: &str, start: usize, exception: (&str, &str), condition: &str) -> String {
        let indent = line_indent(text, start);
        format!(
            "catch ({} {}) when ({condition})\n{indent}{{\n{indent}    ",
            exception.0, exception.1
        )
    }
}

impl Rule for ExceptionFilter {
    fn name(&self) -> &'static str {
        "exception-filter"
    }

    fn description(&self) -> &'static str {
        "Use exception filters instead of catch-and-rethrow (C# 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let text = replace_with(&RETHROW_UNLESS, source, |caps| {
            let condition = group(caps, 3).trim();
            if !is_match(&SIMPLE_CONDITION, condition) {
                return None;
            }
            let start = caps.get(0)?.start();
            Some(Self::filter(source, start, (group(caps, 1), group(caps, 2)), condition))
        });
        let text = replace_with(&RETHROW_IF_DIFFERENT, &text, |caps| {
            let start = caps.get(0)?.start();
            let condition = format!("{} == {}", group(caps, 3), group(caps, 4));
            Some(Self::filter(&text, start, (group(caps, 1), group(caps, 2)), &condition))
        });
        let text = replace_with(&RETHROW_IF_FALSE, &text, |caps| {
            let start = caps.get(0)?.start();
            Some(Self::filter(&text, start, (group(caps, 1), group(caps, 2)), group(caps, 3)))
        });
        Rewrite::compare(source, text)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(
    NEW_STOPWATCH,
    r"(var|Stopwatch)\s+(\w+)\s*=\s*new\s+Stopwatch\s*\(\s*\)\s*;"
);

/// `var sw = new Stopwatch(); sw.Start();` becomes `var sw = Stopwatch.StartNew();`
pub struct StopwatchStartNew;

impl Rule for StopwatchStartNew {
    fn name(&self) -> &'static str {
        "stopwatch-start-new"
    }

    fn description(&self) -> &'static str {
        "Use Stopwatch.StartNew() instead of new Stopwatch() followed by Start()"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let Some(declaration) = NEW_STOPWATCH.as_ref() else {
            return Rewrite::Declined;
        };

        let mut output = String::with_capacity(source.len());
        let mut last = 0;
        for caps in declaration.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() < last {
                continue;
            }
            let name = group(&caps, 2);
            let start_call = dynamic(&format!(r"^\s*{}\.Start\s*\(\s*\)\s*;", regex::escape(name)));
            let Some(call) = start_call.and_then(|re| re.find(&source[whole.end()..])) else {
                continue;
            };

            output.push_str(&source[last..whole.start()]);
            output.push_str(&format!("{} {name} = Stopwatch.StartNew();", group(&caps, 1)));
            last = whole.end() + call.end();
        }
        output.push_str(&source[last..]);
        Rewrite::compare(source, output)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp6))
    }
}

rule_pattern!(FILE_SCOPED_NAMESPACE, r"(?m)^\s*namespace\s+[\w.]+\s*;");
rule_pattern!(ANY_NAMESPACE, r"(?m)^\s*namespace\s+[\w.]+");
rule_pattern!(NAMESPACE_LINE, r"^(\s*)namespace\s+([\w.]+)\s*(\{)?\s*$");

/// Lines allowed ahead of a file-scoped namespace declaration
const PREAMBLE_PREFIXES: [&str; 8] = [
    "using ", "global using ", "extern alias ", "//", "/*", "*", "#", "[assembly",
];

/// A file's single block-scoped namespace becomes `namespace X;`
///
/// Braces are counted textually, so a namespace whose braces never balance
/// (for example, because of braces in string literals) is declined.
pub struct FileScopedNamespace;

impl FileScopedNamespace {
    fn dedent(line: &str) -> &str {
        if line.trim().is_empty() {
            ""
        } else if let Some(rest) = line.strip_prefix('\t') {
            rest
        } else {
            line.strip_prefix("    ").unwrap_or(line)
        }
    }

    fn convert(source: &str) -> Option<String> {
        let header = NAMESPACE_LINE.as_ref()?;
        let lines: Vec<&str> = source.split('\n').collect();

        let (at, caps) = lines
            .iter()
            .enumerate()
            .find_map(|(idx, line)| header.captures(line).map(|caps| (idx, caps)))?;
        let preamble_ok = lines[..at].iter().all(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || PREAMBLE_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        });
        if !preamble_ok {
            return None;
        }

        let line_end = if lines[at].ends_with('\r') { "\r" } else { "" };
        let body_start = if caps.get(3).is_some() {
            at + 1
        } else if lines.get(at + 1).is_some_and(|next| next.trim() == "{") {
            at + 2
        } else {
            return None;
        };

        let mut output: Vec<String> = lines[..at].iter().map(|l| l.to_string()).collect();
        output.push(format!("namespace {};{line_end}", group(&caps, 2)));
        output.push(line_end.to_string());

        let mut depth = 1i32;
        let mut closed_at = None;
        for (idx, line) in lines.iter().enumerate().skip(body_start) {
            for ch in line.chars() {
                match ch {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            if depth == 0 {
                closed_at = Some(idx);
                break;
            }
            let dedented = Self::dedent(line);
            // Avoid a second blank line right after the declaration
            if dedented.is_empty() && output.last().is_some_and(|l| l.trim().is_empty()) {
                continue;
            }
            output.push(dedented.to_string());
        }

        let closed_at = closed_at?;
        let trailing = &lines[closed_at + 1..];
        // Code after the namespace would be pulled into it
        if trailing.iter().any(|line| !line.trim().is_empty()) {
            return None;
        }
        output.extend(trailing.iter().map(|l| l.to_string()));
        Some(output.join("\n"))
    }
}

impl Rule for FileScopedNamespace {
    fn name(&self) -> &'static str {
        "file-scoped-namespace"
    }

    fn description(&self) -> &'static str {
        "Convert block-scoped namespaces to file-scoped namespaces (C# 10+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        if is_match(&FILE_SCOPED_NAMESPACE, source) {
            return Rewrite::Declined;
        }
        let namespaces = ANY_NAMESPACE
            .as_ref()
            .map_or(0, |re| re.find_iter(source).count());
        if namespaces != 1 {
            return Rewrite::Declined;
        }
        match Self::convert(source) {
            Some(converted) => Rewrite::compare(source, converted),
            None => Rewrite::Declined,
        }
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp10))
    }
}

rule_pattern!(
    IMPLICIT_USING,
    r"(?m)^using[ \t]+(?:System|System\.Collections\.Generic|System\.IO|System\.Linq|System\.Net\.Http|System\.Threading|System\.Threading\.Tasks)[ \t]*;[ \t]*(?:\r?\n)?"
);

/// Removes `using` directives that SDK-style projects import implicitly
pub struct ImplicitUsing;

impl Rule for ImplicitUsing {
    fn name(&self) -> &'static str {
        "implicit-using"
    }

    fn description(&self) -> &'static str {
        "Remove usings covered by implicit global usings (C# 10+ / .NET 6+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        Rewrite::compare(source, replace_all(&IMPLICIT_USING, source, ""))
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::safe(LanguageLevel::CSharp10))
    }
}

rule_pattern!(
    TYPE_HEADER,
    r"((?:public|internal|private|protected)\s+(?:(?:sealed|abstract|partial)\s+)*(?:class|struct)\s+(\w+)(?:<[^>]+>)?)(\s*:\s*[^{;]+)?\s*\{"
);
rule_pattern!(CTOR_ASSIGNMENT, r"^(?:this\.)?(\w+)\s*=\s*(\w+)$");

/// A field initialized from a constructor parameter
struct CapturedField<'a> {
    field: &'a str,
    param: &'a str,
    ty: String,
    readonly: bool,
}

/// A constructor that only copies its parameters into private fields
/// becomes a primary constructor
///
/// Opt-in: primary constructor parameters are captured rather than copied,
/// and other constructors must chain to the primary one.
pub struct PrimaryConstructor;

impl PrimaryConstructor {
    fn captured_fields<'a>(body: &'a str, class_body: &str) -> Option<Vec<CapturedField<'a>>> {
        let assignment = CTOR_ASSIGNMENT.as_ref()?;
        body.split(';')
            .map(str::trim)
            .filter(|stmt| !stmt.is_empty())
            .map(|stmt| {
                let caps = assignment.captures(stmt)?;
                let field = caps.get(1)?.as_str();
                let declaration = dynamic(&format!(
                    r"private\s+(readonly\s+)?(\w+(?:<[^>]+>)?)\s+{}\s*;",
                    regex::escape(field)
                ))?;
                let decl = declaration.captures(class_body)?;
                Some(CapturedField {
                    field,
                    param: caps.get(2)?.as_str(),
                    ty: group(&decl, 2).to_string(),
                    readonly: decl.get(1).is_some(),
                })
            })
            .collect()
    }

    /// Rewrite the type whose header starts at `header` and whose body opens
    /// at `open`
    fn convert(content: &str, header: &regex::Captures<'_>) -> Option<String> {
        let whole = header.get(0)?;
        let declaration = header.get(1)?;
        let type_name = group(header, 2);
        let open = whole.end() - 1;
        let close = find_matching_brace(content, open)?;
        let class_body = &content[open + 1..close];

        let ctor = dynamic(&format!(
            r"(?m)^[ \t]*public\s+{}\s*\(([^)]*)\)\s*\{{([^}}]*)\}}[ \t]*(?:\r?\n)?",
            regex::escape(type_name)
        ))?;
        let ctor_caps = ctor.captures(class_body)?;
        let params = group(&ctor_caps, 1).trim();
        if params.is_empty() {
            return None;
        }

        let fields = Self::captured_fields(group(&ctor_caps, 2), class_body)?;
        if fields.is_empty() {
            return None;
        }
        let param_names: Vec<&str> = params
            .split(',')
            .filter_map(|part| part.split_whitespace().last())
            .collect();
        if !param_names
            .iter()
            .all(|name| fields.iter().any(|f| f.param == *name))
        {
            return None;
        }

        let ctor_range = ctor_caps.get(0)?.range();
        let mut body = format!("{}{}", &class_body[..ctor_range.start], &class_body[ctor_range.end..]);
        // Remaining constructors would have to chain to the primary one
        if dynamic(&format!(r"\b{}\s*\(", regex::escape(type_name)))?.is_match(&body) {
            return None;
        }
        for field in &fields {
            let old_decl = dynamic(&format!(
                r"(?m)^[ \t]*private\s+(?:readonly\s+)?{}\s+{}\s*;[ \t]*(?:\r?\n)?",
                regex::escape(&field.ty),
                regex::escape(field.field)
            ))?;
            body = old_decl.replace(&body, "").into_owned();
        }

        let indent = line_indent(content, declaration.start());
        let member_indent = format!("{indent}    ");
        let initializers: Vec<String> = fields
            .iter()
            .map(|f| {
                let readonly = if f.readonly { "readonly " } else { "" };
                format!("{member_indent}private {readonly}{} {} = {};", f.ty, f.field, f.param)
            })
            .collect();
        let rest = body.trim_start_matches(['\n', '\r', '\t', ' ']);
        let new_body = format!("\n{}\n\n{member_indent}{rest}", initializers.join("\n"));
        let new_body = dynamic(r"\n{3,}")?.replace_all(&new_body, "\n\n").into_owned();

        let base_list = header
            .get(3)
            .map(|m| format!(" {}", m.as_str().trim()))
            .unwrap_or_default();

        Some(format!(
            "{}{}({params}){base_list}\n{indent}{{{new_body}{}",
            &content[..declaration.start()],
            declaration.as_str(),
            &content[close..]
        ))
    }
}

impl Rule for PrimaryConstructor {
    fn name(&self) -> &'static str {
        "primary-constructor"
    }

    fn description(&self) -> &'static str {
        "Use primary constructors for classes that only store constructor parameters (C# 12+)"
    }

    fn apply(&self, source: &str) -> Rewrite {
        let Some(header) = TYPE_HEADER.as_ref() else {
            return Rewrite::Declined;
        };

        let mut content = source.to_string();
        let starts: Vec<usize> = header.find_iter(source).map(|m| m.start()).collect();
        // Last type first, so earlier offsets stay valid
        for start in starts.into_iter().rev() {
            let Some(caps) = header.captures_at(&content, start) else {
                continue;
            };
            if caps.get(0).map(|m| m.start()) != Some(start) {
                continue;
            }
            if let Some(converted) = Self::convert(&content, &caps) {
                content = converted;
            }
        }
        Rewrite::compare(source, content)
    }

    fn versioning(&self) -> Option<Versioning> {
        Some(Versioning::opt_in(LanguageLevel::CSharp12))
    }
}
