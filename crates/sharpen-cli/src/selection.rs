//! Which rules a run uses.

use std::collections::BTreeSet;
use std::sync::Arc;

use sharpen_core::{LanguageLevel, Registry, Rule};
use tracing::debug;

/// Target level, safety policy, explicit rule names and disabled rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSelection {
    pub target: LanguageLevel,
    pub safe_only: bool,
    /// Explicit rule names; when present, level and safety are ignored
    pub allow: Option<Vec<String>>,
    pub disabled: BTreeSet<String>,
}

impl Default for RuleSelection {
    fn default() -> Self {
        Self::new(LanguageLevel::default(), true)
    }
}

impl RuleSelection {
    pub fn new(target: LanguageLevel, safe_only: bool) -> Self {
        Self {
            target,
            safe_only,
            allow: None,
            disabled: BTreeSet::new(),
        }
    }

    pub fn with_allow_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    /// The ordered rule list for this selection
    pub fn resolve(&self, registry: &Registry) -> Vec<Arc<dyn Rule>> {
        let rules = match &self.allow {
            Some(names) => registry.by_names(names),
            None => registry.by_level(self.target, self.safe_only),
        };
        let rules: Vec<_> = rules
            .into_iter()
            .filter(|rule| !self.disabled.contains(rule.name()))
            .collect();
        debug!(
            target = %self.target,
            safe_only = self.safe_only,
            rules = rules.len(),
            "Resolved rule selection"
        );
        rules
    }

    /// Allow-listed names the registry does not know
    pub fn unknown_names(&self, registry: &Registry) -> Vec<String> {
        match &self.allow {
            Some(names) => registry
                .unknown_names(names)
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }
}
