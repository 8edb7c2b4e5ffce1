//! Modernizations that are cataloged but left to a human.
//!
//! Each of these changes semantics in ways a text rewrite cannot verify
//! (equality, mutability, project-wide imports), so they always decline.

use crate::level::LanguageLevel;
use crate::rules::AdvisoryRule;

pub const DISCARD_VARIABLE: AdvisoryRule = AdvisoryRule::new(
    "discard-variable",
    "Use discard (_) for unused out parameters (C# 7+) [manual review]",
    LanguageLevel::CSharp7,
);

pub const SWITCH_EXPRESSION: AdvisoryRule = AdvisoryRule::new(
    "switch-expression",
    "Convert switch statements to switch expressions (C# 8+) [manual review]",
    LanguageLevel::CSharp8,
);

pub const RECORD_TYPE: AdvisoryRule = AdvisoryRule::new(
    "record-type",
    "Suggest converting simple classes to records (C# 9+) [manual review]",
    LanguageLevel::CSharp9,
);

pub const INIT_PROPERTY: AdvisoryRule = AdvisoryRule::new(
    "init-property",
    "Suggest init-only properties for immutable types (C# 9+) [manual review]",
    LanguageLevel::CSharp9,
);

pub const GLOBAL_USING: AdvisoryRule = AdvisoryRule::new(
    "global-using",
    "Suggest global usings for common namespaces (C# 10+) [manual review]",
    LanguageLevel::CSharp10,
);

pub const RAW_STRING_LITERAL: AdvisoryRule = AdvisoryRule::new(
    "raw-string-literal",
    "Use raw string literals for complex strings (C# 11+) [manual review]",
    LanguageLevel::CSharp11,
);

pub const REQUIRED_PROPERTY: AdvisoryRule = AdvisoryRule::new(
    "required-property",
    "Suggest required modifier for properties (C# 11+) [manual review]",
    LanguageLevel::CSharp11,
);
