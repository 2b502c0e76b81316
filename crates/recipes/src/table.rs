use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use action_locator::{CandidateList, LocateOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builtin;
use crate::errors::RecipeError;
use crate::intent::Intent;

/// Candidates and locate options for one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub candidates: CandidateList,
    #[serde(default)]
    pub options: LocateOptions,
}

impl Recipe {
    pub fn new(candidates: CandidateList) -> Self {
        Self {
            candidates,
            options: LocateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LocateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Every intent mapped to its recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IntentTable {
    recipes: BTreeMap<Intent, Recipe>,
}

impl Default for IntentTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl IntentTable {
    pub fn builtin() -> Self {
        Self {
            recipes: Intent::ALL
                .iter()
                .map(|intent| (*intent, builtin::recipe(*intent)))
                .collect(),
        }
    }

    pub fn get(&self, intent: Intent) -> Recipe {
        self.recipes
            .get(&intent)
            .cloned()
            .unwrap_or_else(|| builtin::recipe(intent))
    }

    pub fn candidates(&self, intent: Intent) -> CandidateList {
        self.get(intent).candidates
    }

    pub fn options(&self, intent: Intent) -> LocateOptions {
        self.get(intent).options
    }

    pub fn set(&mut self, intent: Intent, recipe: Recipe) -> Result<(), RecipeError> {
        if recipe.candidates.is_empty() {
            return Err(RecipeError::EmptyRecipe(intent.to_string()));
        }
        self.recipes.insert(intent, recipe);
        Ok(())
    }

    /// Moves recipes still on the built-in locate settings onto `baseline`.
    pub fn rebase(&mut self, baseline: &LocateOptions) {
        let builtin = LocateOptions::default();
        for recipe in self.recipes.values_mut() {
            let options = &mut recipe.options;
            if options.timeout_ms == builtin.timeout_ms {
                options.timeout_ms = baseline.timeout_ms;
            }
            if options.poll_interval_ms == builtin.poll_interval_ms {
                options.poll_interval_ms = baseline.poll_interval_ms;
            }
            if options.scan_limit == builtin.scan_limit {
                options.scan_limit = baseline.scan_limit;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intent, &Recipe)> {
        self.recipes.iter().map(|(intent, recipe)| (*intent, recipe))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Replaces the recipes named in `yaml`; other intents keep their defaults.
    pub fn apply_yaml(&mut self, yaml: &str) -> Result<usize, RecipeError> {
        let overrides: BTreeMap<Intent, Recipe> = serde_yaml::from_str(yaml)?;
        let count = overrides.len();
        for (intent, recipe) in overrides {
            debug!(%intent, candidates = recipe.candidates.len(), "overriding intent");
            self.set(intent, recipe)?;
        }
        Ok(count)
    }

    /// Built-in table with the overrides from `path` applied.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let yaml = fs::read_to_string(path).map_err(|e| RecipeError::io(path, e))?;
        let mut table = Self::builtin();
        let count = table.apply_yaml(&yaml)?;
        info!(path = %path.display(), overrides = count, "loaded intent overrides");
        Ok(table)
    }

    pub fn to_yaml(&self) -> Result<String, RecipeError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_intent() {
        let table = IntentTable::builtin();
        assert_eq!(table.len(), Intent::ALL.len());
        assert_eq!(table.options(Intent::SelectSeatButton).timeout_ms, 20_000);
        assert_eq!(table.options(Intent::ContinueButton).timeout_ms, 2000);
    }

    #[test]
    fn rebase_keeps_tuned_timeouts() {
        let mut table = IntentTable::builtin();
        table.rebase(&LocateOptions::default().with_timeout(std::time::Duration::from_millis(4000)));
        assert_eq!(table.options(Intent::Email).timeout_ms, 4000);
        assert_eq!(table.options(Intent::SelectSeatButton).timeout_ms, 20_000);
    }

    #[test]
    fn empty_override_is_rejected() {
        let mut table = IntentTable::builtin();
        let err = table
            .set(Intent::Email, Recipe::new(CandidateList::new()))
            .unwrap_err();
        assert!(matches!(err, RecipeError::EmptyRecipe(_)));
        assert!(!table.candidates(Intent::Email).is_empty());
    }

    #[test]
    fn yaml_dump_reloads_unchanged() {
        let table = IntentTable::builtin();
        let yaml = table.to_yaml().unwrap();
        let mut reloaded = IntentTable::builtin();
        assert_eq!(reloaded.apply_yaml(&yaml).unwrap(), Intent::ALL.len());
        assert_eq!(reloaded, table);
    }
}
