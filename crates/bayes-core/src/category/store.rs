//! Category Store
//!
//! Owns every trained category and the single dirty flag guarding the cached
//! priors. Priors are only ever written by [`CategoryStore::ensure_probabilities`],
//! and every path that can change counts marks them stale.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{BayesError, Result};
use crate::persist::{validate_categories, PersistedCategory};

use super::counts::{Category, MAX_TALLY};

/// Point-in-time view of one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Total tokens trained into the category
    pub token_tally: u64,
    /// P that any given token is in this category
    pub prob_in_cat: f64,
    /// P that any given token is not in this category
    pub prob_not_in_cat: f64,
}

/// Runtime store of trained categories
#[derive(Debug, Clone)]
pub struct CategoryStore {
    categories: HashMap<String, Category>,
    probabilities_dirty: bool,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self {
            categories: HashMap::new(),
            probabilities_dirty: true,
        }
    }

    /// Add an empty category, replacing any existing one of the same name
    pub fn add(&mut self, name: &str) -> &mut Category {
        self.probabilities_dirty = true;
        match self.categories.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(Category::new(name));
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(Category::new(name)),
        }
    }

    /// Get a category, creating it if missing
    ///
    /// The caller may change counts through the returned reference, so the
    /// priors are marked stale.
    pub fn get_or_create(&mut self, name: &str) -> &mut Category {
        self.probabilities_dirty = true;
        self.categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name))
    }

    /// Add per-token `occurrences` to `name`, creating it if needed
    ///
    /// Returns the new tally. Nothing changes if the tally would overflow.
    /// A category left without tokens is removed.
    pub fn train(&mut self, name: &str, occurrences: &BTreeMap<String, u64>) -> Result<u64> {
        let added = occurrences
            .values()
            .try_fold(0u64, |acc, &count| acc.checked_add(count))
            .ok_or_else(|| BayesError::CountOverflow {
                category: name.to_string(),
            })?;
        if let Some(cat) = self.lookup(name) {
            cat.tally_after(added)?;
        } else if added > MAX_TALLY {
            return Err(BayesError::CountOverflow {
                category: name.to_string(),
            });
        }

        let cat = self.get_or_create(name);
        for (token, &count) in occurrences {
            cat.train_token(token, count)?;
        }
        let tally = cat.tally();
        self.remove_if_empty(name);
        Ok(tally)
    }

    /// Remove per-token `occurrences` from `name`
    ///
    /// Returns the remaining tally. Unknown categories are left alone; one
    /// whose tally reaches zero is removed.
    pub fn untrain(&mut self, name: &str, occurrences: &BTreeMap<String, u64>) -> u64 {
        let Some(cat) = self.categories.get_mut(name) else {
            return 0;
        };
        for (token, &count) in occurrences {
            // Sample frequencies are always positive.
            let _ = cat.untrain_token(token, count);
        }
        let tally = cat.tally();
        self.probabilities_dirty = true;
        self.remove_if_empty(name);
        tally
    }

    fn remove_if_empty(&mut self, name: &str) {
        if self.lookup(name).is_some_and(|cat| cat.tally() == 0) {
            self.delete(name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Remove a category; absent names are ignored
    pub fn delete(&mut self, name: &str) {
        self.categories.remove(name);
        self.probabilities_dirty = true;
    }

    /// Category names in no particular order
    pub fn names(&self) -> Vec<&str> {
        self.categories.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn mark_dirty(&mut self) {
        self.probabilities_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.probabilities_dirty
    }

    /// Recompute every category's priors if any mutation happened since the
    /// last pass.
    pub fn ensure_probabilities(&mut self) {
        if !self.probabilities_dirty {
            return;
        }

        let total: u128 = self
            .categories
            .values()
            .map(|cat| u128::from(cat.tally()))
            .sum();
        for cat in self.categories.values_mut() {
            let prob_in_cat = if total == 0 {
                0.0
            } else {
                cat.tally() as f64 / total as f64
            };
            cat.set_probabilities(prob_in_cat);
        }

        self.probabilities_dirty = false;
    }

    /// Owned copy of tally and priors per category
    pub fn summaries(&self) -> BTreeMap<String, CategorySummary> {
        self.categories
            .iter()
            .map(|(name, cat)| {
                (
                    name.clone(),
                    CategorySummary {
                        token_tally: cat.tally(),
                        prob_in_cat: cat.prob_in_cat(),
                        prob_not_in_cat: cat.prob_not_in_cat(),
                    },
                )
            })
            .collect()
    }

    /// Deep copy of the token tables in persisted form
    pub fn export_state(&self) -> Result<BTreeMap<String, PersistedCategory>> {
        self.categories
            .iter()
            .map(|(name, cat)| PersistedCategory::try_from(cat).map(|p| (name.clone(), p)))
            .collect()
    }

    /// Validate `state` and swap it in wholesale
    ///
    /// On error the store is left exactly as it was.
    pub fn replace_state(&mut self, state: BTreeMap<String, PersistedCategory>) -> Result<()> {
        validate_categories(&state)?;
        *self = Self::from_validated(state);
        Ok(())
    }

    /// Build a store from categories that already passed validation
    pub(crate) fn from_validated(state: BTreeMap<String, PersistedCategory>) -> Self {
        let categories = state
            .into_iter()
            .map(|(name, persisted)| {
                let tokens = persisted
                    .tokens
                    .into_iter()
                    .map(|(token, count)| (token, count as u64))
                    .collect();
                let cat = Category::from_counts(name.clone(), tokens);
                (name, cat)
            })
            .collect();

        Self {
            categories,
            probabilities_dirty: true,
        }
    }
}

impl Default for CategoryStore {
    fn default() -> Self {
        Self::new()
    }
}
