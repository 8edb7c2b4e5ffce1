/*!
# Rule Registry

Name-keyed catalog of rules with version- and safety-aware selection.

Every selection that filters by level or safety only considers rules that
carry [`Versioning`](crate::rules::Versioning) metadata; unversioned rules
are reachable by name alone. Level-based selections come back sorted by
`(min_level, name)` so the resulting pipeline order is deterministic.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::level::LanguageLevel;
use crate::rules::{csharp, Rule};

/// Errors raised when building a registry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Rule already registered: {0}")]
    DuplicateRule(String),

    #[error("Rule name must not be empty")]
    EmptyName,
}

/// Catalog of rules keyed by name
#[derive(Default, Clone)]
pub struct Registry {
    rules: IndexMap<&'static str, Arc<dyn Rule>>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in C# rule
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for rule in csharp::builtin() {
            registry.register(rule);
        }
        debug!(rules = registry.len(), "Loaded built-in rules");
        registry
    }

    /// Add a rule, replacing any rule already registered under the same name
    ///
    /// Returns the replaced rule, if any.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Option<Arc<dyn Rule>> {
        let name = rule.name();
        let previous = self.rules.insert(name, rule);
        if previous.is_some() {
            warn!(rule = name, "Replacing previously registered rule");
        }
        previous
    }

    /// Add a rule, refusing duplicate or empty names
    pub fn try_register(&mut self, rule: Arc<dyn Rule>) -> Result<(), RegistryError> {
        let name = rule.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.rules.contains_key(name) {
            return Err(RegistryError::DuplicateRule(name.to_string()));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Look up a rule by exact name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(name).cloned()
    }

    /// Every registered rule, in registration order
    pub fn all(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.values().cloned().collect()
    }

    /// Rules for the given names, in the caller's order
    ///
    /// Unknown names are skipped; see [`Registry::unknown_names`] to report
    /// them.
    pub fn by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<dyn Rule>> {
        names
            .iter()
            .filter_map(|name| {
                let found = self.get(name.as_ref());
                if found.is_none() {
                    debug!(rule = name.as_ref(), "Skipping unknown rule name");
                }
                found
            })
            .collect()
    }

    /// The subset of `names` that no registered rule answers to
    pub fn unknown_names<'a, S: AsRef<str>>(&self, names: &'a [S]) -> Vec<&'a str> {
        names
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| !self.rules.contains_key(*name))
            .collect()
    }

    /// Versioned rules marked safe, sorted by `(min_level, name)`
    pub fn all_safe(&self) -> Vec<Arc<dyn Rule>> {
        self.sorted_versioned(|rule| rule.is_safe())
    }

    /// Versioned rules whose minimum level is at most `level`, restricted to
    /// safe rules when `safe_only` is set; sorted by `(min_level, name)`
    pub fn by_level(&self, level: LanguageLevel, safe_only: bool) -> Vec<Arc<dyn Rule>> {
        self.sorted_versioned(|rule| {
            rule.min_level().is_some_and(|min| min <= level) && (!safe_only || rule.is_safe())
        })
    }

    /// Versioned rules grouped by minimum level, each group sorted by name
    pub fn group_by_level(&self) -> BTreeMap<LanguageLevel, Vec<Arc<dyn Rule>>> {
        let mut groups: BTreeMap<LanguageLevel, Vec<Arc<dyn Rule>>> = BTreeMap::new();
        for rule in self.rules.values() {
            if let Some(level) = rule.min_level() {
                groups.entry(level).or_default().push(Arc::clone(rule));
            }
        }
        for group in groups.values_mut() {
            group.sort_by_key(|rule| rule.name());
        }
        groups
    }

    /// Every registered name, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.rules.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn sorted_versioned<P>(&self, keep: P) -> Vec<Arc<dyn Rule>>
    where
        P: Fn(&Arc<dyn Rule>) -> bool,
    {
        let mut selected: Vec<Arc<dyn Rule>> = self
            .rules
            .values()
            .filter(|rule| rule.versioning().is_some() && keep(rule))
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            a.min_level()
                .cmp(&b.min_level())
                .then_with(|| a.name().cmp(b.name()))
        });
        selected
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}
