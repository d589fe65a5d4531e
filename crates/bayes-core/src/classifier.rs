//! Naive Bayes Classifier
//!
//! Trains categories from text samples and scores new text against them.
//!
//! Scores are a relative ranking signal, not calibrated probabilities: each
//! distinct token seen in training contributes
//! `P(tok|cat)·P(cat) / (P(tok|cat)·P(cat) + P(tok|¬cat)·P(¬cat))`, weighted by
//! how often the token occurs in the sample, and contributions are summed.
//!
//! All state lives behind one reader-writer lock, so a single `Classifier`
//! can be shared across threads (e.g. in an `Arc`). Mutations take the write
//! lock; scoring and summaries take the read lock and only briefly upgrade to
//! recompute stale priors.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::{validate_category_name, Category, CategoryStore, CategorySummary};
use crate::error::Result;
use crate::tokenizer::{Tokenizer, WordTokenizer};

/// Best-matching category for a text sample
///
/// An empty result (`category == None`, `score == 0.0`) means no category
/// scored above zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Option<String>,
    pub score: f64,
}

pub struct Classifier {
    store: RwLock<CategoryStore>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Classifier {
    /// Empty classifier using [`WordTokenizer`]
    pub fn new() -> Self {
        Self::with_tokenizer(Arc::new(WordTokenizer))
    }

    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            store: RwLock::new(CategoryStore::new()),
            tokenizer,
        }
    }

    pub fn set_tokenizer(&mut self, tokenizer: Arc<dyn Tokenizer>) {
        self.tokenizer = tokenizer;
    }

    /// Add the tokens of `text` to `category`, creating it if needed
    ///
    /// Fails with `CountOverflow`, leaving the category untouched, if its
    /// tally would pass `i64::MAX`.
    pub fn train(&self, category: &str, text: &str) -> Result<()> {
        validate_category_name(category)?;
        let occurrences = self.count_tokens(text);

        let tally = self.store.write().train(category, &occurrences)?;

        debug!(category, tokens = occurrences.len(), tally, "trained category");
        Ok(())
    }

    /// Remove the tokens of `text` from `category`
    ///
    /// A category whose tally drops to zero is deleted.
    pub fn untrain(&self, category: &str, text: &str) -> Result<()> {
        validate_category_name(category)?;
        let occurrences = self.count_tokens(text);

        let tally = self.store.write().untrain(category, &occurrences);

        debug!(category, tokens = occurrences.len(), tally, "untrained category");
        Ok(())
    }

    /// Highest-scoring category; ties go to the lexicographically smallest name
    pub fn classify(&self, text: &str) -> Classification {
        let scores = self.score(text);

        let mut result = Classification::default();
        // BTreeMap iterates in name order, so only a strictly greater score
        // displaces an earlier name.
        for (name, score) in scores {
            if score > result.score {
                result.category = Some(name);
                result.score = score;
            }
        }
        result
    }

    /// Score of every category that rates `text` above zero
    pub fn score(&self, text: &str) -> BTreeMap<String, f64> {
        let occurrences = self.count_tokens(text);
        let store = self.read_current();
        score_tokens(&store, &occurrences)
    }

    /// Drop every category
    pub fn flush(&self) {
        let mut store = self.store.write();
        *store = CategoryStore::new();
        debug!("flushed all categories");
    }

    /// Per-category tally and priors, recomputed if stale
    pub fn summaries(&self) -> BTreeMap<String, CategorySummary> {
        self.read_current().summaries()
    }

    /// Trained category names, sorted
    pub fn category_names(&self) -> Vec<String> {
        let store = self.store.read();
        let mut names: Vec<String> = store.names().into_iter().map(str::to_string).collect();
        names.sort_unstable();
        names
    }

    /// Copy of a single category
    pub fn category(&self, name: &str) -> Option<Category> {
        self.store.read().lookup(name).cloned()
    }

    pub(crate) fn store(&self) -> &RwLock<CategoryStore> {
        &self.store
    }

    /// Read guard over a store whose priors are current
    fn read_current(&self) -> RwLockReadGuard<'_, CategoryStore> {
        let store = self.store.read();
        if !store.is_dirty() {
            return store;
        }
        drop(store);

        let mut store = self.store.write();
        store.ensure_probabilities();
        RwLockWriteGuard::downgrade(store)
    }

    /// Per-token frequencies within one sample, in token order
    fn count_tokens(&self, text: &str) -> BTreeMap<String, u64> {
        let mut occurrences = BTreeMap::new();
        for token in self.tokenizer.tokenize(text) {
            *occurrences.entry(token).or_insert(0) += 1;
        }
        occurrences
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

fn score_tokens(
    store: &CategoryStore,
    occurrences: &BTreeMap<String, u64>,
) -> BTreeMap<String, f64> {
    let categories: Vec<&Category> = store.iter().collect();
    let mut scores = vec![0.0f64; categories.len()];

    for (token, &count) in occurrences {
        let token_scores: Vec<f64> = categories
            .iter()
            .map(|cat| cat.token_count(token) as f64)
            .collect();
        let token_tally: f64 = token_scores.iter().sum();

        // Never seen in training
        if token_tally == 0.0 {
            continue;
        }

        let rows = categories.iter().zip(&token_scores).zip(&mut scores);
        for ((cat, &token_score), score) in rows {
            let probability = calculate_bayesian_probability(
                cat.prob_in_cat(),
                cat.prob_not_in_cat(),
                token_score,
                token_tally,
            );
            *score += count as f64 * probability;
        }
    }

    categories
        .into_iter()
        .zip(scores)
        .filter(|(_, score)| *score > 0.0)
        .map(|(cat, score)| (cat.name().to_string(), score))
        .collect()
}

fn calculate_bayesian_probability(
    prob_in_cat: f64,
    prob_not_in_cat: f64,
    token_score: f64,
    token_tally: f64,
) -> f64 {
    let prob_token_in_cat = token_score / token_tally;
    let prob_token_not_in_cat = (token_tally - token_score) / token_tally;

    let numerator = prob_token_in_cat * prob_in_cat;
    let denominator = numerator + prob_token_not_in_cat * prob_not_in_cat;

    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
