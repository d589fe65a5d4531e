//! Per-category token counts
//!
//! A `Category` owns one token-count table and the running tally over it.
//! Zero counts are never stored: a token that drops to zero is removed.

use std::collections::HashMap;

use crate::error::{BayesError, Result};

/// Largest tally a category may reach; counts stay representable on disk
pub(crate) const MAX_TALLY: u64 = i64::MAX as u64;

/// A single trainable category
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    name: String,
    tokens: HashMap<String, u64>,
    tally: u64,
    prob_in_cat: f64,
    prob_not_in_cat: f64,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tokens: HashMap::new(),
            tally: 0,
            prob_in_cat: 0.0,
            prob_not_in_cat: 0.0,
        }
    }

    /// Rebuild a category from already-validated counts.
    pub(crate) fn from_counts(name: impl Into<String>, tokens: HashMap<String, u64>) -> Self {
        let tally = tokens.values().sum();
        Self {
            name: name.into(),
            tokens,
            tally,
            prob_in_cat: 0.0,
            prob_not_in_cat: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add `count` occurrences of `token`
    ///
    /// Fails without mutation if the tally would pass `i64::MAX`.
    pub fn train_token(&mut self, token: &str, count: u64) -> Result<()> {
        if count == 0 {
            return Err(BayesError::InvalidCount { count });
        }
        let tally = self.tally_after(count)?;

        // A token count never exceeds the tally, so this cannot overflow.
        *self.tokens.entry(token.to_string()).or_insert(0) += count;
        self.tally = tally;
        Ok(())
    }

    /// Tally after adding `count` more tokens, if it stays within bounds
    pub(crate) fn tally_after(&self, count: u64) -> Result<u64> {
        self.tally
            .checked_add(count)
            .filter(|tally| *tally <= MAX_TALLY)
            .ok_or_else(|| BayesError::CountOverflow {
                category: self.name.clone(),
            })
    }

    /// Remove up to `count` occurrences of `token`
    ///
    /// Unknown tokens are ignored. Removing at least as many occurrences as
    /// are stored drops the token entirely.
    pub fn untrain_token(&mut self, token: &str, count: u64) -> Result<()> {
        if count == 0 {
            return Err(BayesError::InvalidCount { count });
        }

        let Some(current) = self.tokens.get_mut(token) else {
            return Ok(());
        };

        if count >= *current {
            self.tally -= *current;
            self.tokens.remove(token);
        } else {
            *current -= count;
            self.tally -= count;
        }
        Ok(())
    }

    pub fn token_count(&self, token: &str) -> u64 {
        self.tokens.get(token).copied().unwrap_or(0)
    }

    pub fn tally(&self) -> u64 {
        self.tally
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&str, u64)> {
        self.tokens.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// P that any given token is in this category
    pub fn prob_in_cat(&self) -> f64 {
        self.prob_in_cat
    }

    /// P that any given token is not in this category
    pub fn prob_not_in_cat(&self) -> f64 {
        self.prob_not_in_cat
    }

    pub(super) fn set_probabilities(&mut self, prob_in_cat: f64) {
        self.prob_in_cat = prob_in_cat;
        self.prob_not_in_cat = 1.0 - prob_in_cat;
    }
}
