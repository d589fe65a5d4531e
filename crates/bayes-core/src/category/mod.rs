//! # Category Module
//!
//! Token-count bookkeeping for trained categories.
//!
//! ## Module layout
//!
//! - `counts`: a single category's token table, tally and cached priors
//! - `store`: the set of categories plus the dirty flag for prior recomputation
//!
//! ## Example
//!
//! ```rust
//! use bayes_core::category::CategoryStore;
//!
//! let mut store = CategoryStore::new();
//! store.get_or_create("spam").train_token("buy", 2).unwrap();
//! store.get_or_create("ham").train_token("team", 2).unwrap();
//! store.ensure_probabilities();
//!
//! let summaries = store.summaries();
//! assert_eq!(summaries["spam"].token_tally, 2);
//! assert!((summaries["spam"].prob_in_cat - 0.5).abs() < 1e-12);
//! ```

mod counts;
mod store;

pub use counts::Category;
pub use store::{CategoryStore, CategorySummary};

use crate::error::{BayesError, Result};

/// Whether `name` matches `^[-_A-Za-z0-9]+$`
///
/// The same rule applies to training input and to names found in a
/// persisted model.
pub fn is_valid_category_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn validate_category_name(name: &str) -> Result<()> {
    if !is_valid_category_name(name) {
        return Err(BayesError::InvalidCategoryName {
            name: name.to_string(),
        });
    }
    Ok(())
}
