/*!
# Built-in C# Rules

The catalog of modernizations shipped with sharpen, grouped by theme.
Every rule is a black box satisfying the [`Rule`](crate::rules::Rule)
contract; most are backed by regular expressions plus light scanning.
*/

use std::sync::Arc;

use crate::rules::Rule;

pub mod advisory;
pub mod collections;
pub mod expressions;
pub mod linq;
pub mod nulls;
pub mod statements;
pub mod strings;
pub mod tuples;

pub use collections::{CollectionExpression, IndexRange, ListPattern};
pub use expressions::{DefaultLiteral, ExpressionBody, TargetTypedNew, VarPattern};
pub use linq::{LinqCountAny, LinqWhereFirst, SpreadOperator};
pub use nulls::{
    ConditionalAccessDelegate, NameofExpression, NullCoalescingAssignment, NullPropagation,
    PatternMatching, PatternMatchingNull, ThrowExpression, ThrowHelper,
};
pub use statements::{
    ExceptionFilter, FileScopedNamespace, ImplicitUsing, PrimaryConstructor, StopwatchStartNew,
};
pub use strings::{SpanSuggestion, StringConcatInterpolation, StringInterpolation, StringIsNullOrEmpty};
pub use tuples::{TupleDeconstruction, TupleSwap};

/// Every built-in rule, oldest language level first
pub fn builtin() -> Vec<Arc<dyn Rule>> {
    vec![
        // C# 6
        Arc::new(ExpressionBody),
        Arc::new(StringInterpolation),
        Arc::new(StringConcatInterpolation),
        Arc::new(NameofExpression),
        Arc::new(NullPropagation),
        Arc::new(VarPattern),
        Arc::new(StopwatchStartNew),
        Arc::new(ConditionalAccessDelegate),
        Arc::new(ExceptionFilter),
        Arc::new(LinqCountAny),
        Arc::new(LinqWhereFirst),
        // C# 7
        Arc::new(PatternMatching),
        Arc::new(DefaultLiteral),
        Arc::new(TupleDeconstruction),
        Arc::new(advisory::DISCARD_VARIABLE),
        Arc::new(SpanSuggestion),
        Arc::new(ThrowExpression),
        Arc::new(TupleSwap),
        // C# 8
        Arc::new(NullCoalescingAssignment),
        Arc::new(IndexRange),
        Arc::new(advisory::SWITCH_EXPRESSION),
        // C# 9
        Arc::new(TargetTypedNew),
        Arc::new(PatternMatchingNull),
        Arc::new(advisory::RECORD_TYPE),
        Arc::new(advisory::INIT_PROPERTY),
        // C# 10
        Arc::new(FileScopedNamespace),
        Arc::new(advisory::GLOBAL_USING),
        Arc::new(ImplicitUsing),
        Arc::new(ThrowHelper),
        // C# 11
        Arc::new(advisory::RAW_STRING_LITERAL),
        Arc::new(advisory::REQUIRED_PROPERTY),
        Arc::new(ListPattern),
        Arc::new(StringIsNullOrEmpty),
        // C# 12
        Arc::new(CollectionExpression),
        Arc::new(PrimaryConstructor),
        Arc::new(SpreadOperator),
    ]
}

/// Leading whitespace of the line containing byte offset `at`
pub(crate) fn line_indent(text: &str, at: usize) -> &str {
    let line_start = text[..at].rfind('\n').map_or(0, |idx| idx + 1);
    let line = &text[line_start..];
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..indent_len]
}

/// Text between the start of the line containing `at` and `at`
pub(crate) fn line_prefix(text: &str, at: usize) -> &str {
    let line_start = text[..at].rfind('\n').map_or(0, |idx| idx + 1);
    &text[line_start..at]
}

/// Whether the statement ending at `end` is followed by an `else` branch
pub(crate) fn followed_by_else(text: &str, end: usize) -> bool {
    text[end..]
        .trim_start()
        .strip_prefix("else")
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}
