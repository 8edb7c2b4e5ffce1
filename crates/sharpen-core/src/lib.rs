//! # Sharpen Core
//!
//! Rule-based rewrite engine for modernizing legacy C# sources, including:
//! - Language level model (C# 6 through C# 13)
//! - The `Rule` contract and the built-in catalog of C# rewrites
//! - A queryable, build-once rule `Registry`
//! - The `Transformer` pipeline that folds an ordered rule list over a file
//!
//! File discovery, backups, persisted settings and presentation live in the
//! `sharpen-cli` crate; this crate never touches the filesystem.

#![warn(clippy::all)]

pub mod level;
pub mod registry;
pub mod rules;
pub mod transformer;

// Re-export commonly used types
pub use level::{LanguageLevel, LevelParseError};
pub use registry::{Registry, RegistryError};
pub use rules::{AdvisoryRule, Rewrite, Rule, RuleResult, TextRule, Versioning};
pub use transformer::{quiet_rule_panics, RuleFault, RuleStats, SourceFile, TransformResult, Transformer};

/// Sharpen version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for sharpen components
///
/// `RUST_LOG` overrides the default `sharpen_core=info` directive. Passing
/// `verbose` lowers the engine and CLI crates to `debug`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in [
        format!("sharpen_core={default_level}"),
        format!("sharpen_cli={default_level}"),
    ] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
