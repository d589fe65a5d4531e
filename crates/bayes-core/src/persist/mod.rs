//! # Model Persistence
//!
//! Snapshot and restore of a [`Classifier`]'s trained categories.
//!
//! - `snapshot`: the versioned [`ModelState`] and its binary encoding
//! - `file`: atomic temp-file-then-rename save and file-based load
//!
//! A snapshot is taken under the read lock as a deep copy; encoding and I/O
//! happen after the lock is released. A load is decoded and validated before
//! the write lock is taken, so a rejected snapshot never touches live state.
//!
//! ```rust
//! use bayes_core::Classifier;
//!
//! let classifier = Classifier::new();
//! classifier.train("spam", "free prize now").unwrap();
//!
//! let mut bytes = Vec::new();
//! classifier.save(&mut bytes).unwrap();
//!
//! let restored = Classifier::new();
//! restored.load(bytes.as_slice()).unwrap();
//! assert_eq!(restored.classify("prize"), classifier.classify("prize"));
//! ```

mod file;
mod snapshot;

pub use file::default_model_path;
pub use snapshot::{validate_categories, ModelState, PersistedCategory, MODEL_VERSION};

use std::io::{Read, Write};

use tracing::debug;

use crate::category::CategoryStore;
use crate::classifier::Classifier;
use crate::error::Result;

impl Classifier {
    /// Write the trained model to `writer`
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let state = ModelState::new(self.store().read().export_state()?);
        state.write_to(writer)?;

        debug!(categories = state.categories.len(), "saved model");
        Ok(())
    }

    /// Replace the trained model with one read from `reader`
    ///
    /// Nothing changes unless the snapshot decodes and validates.
    pub fn load<R: Read>(&self, reader: R) -> Result<()> {
        let state = ModelState::read_from(reader)?;
        state.validate()?;

        let categories = state.categories.len();
        let store = CategoryStore::from_validated(state.categories);
        *self.store().write() = store;

        debug!(categories, "loaded model");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io;

    use super::*;
    use crate::error::{BayesError, ValidationError};

    fn trained() -> Classifier {
        let classifier = Classifier::new();
        classifier.train("spam", "free prize click now now").unwrap();
        classifier
            .train("ham", "team meeting schedule project now")
            .unwrap();
        classifier.train("news", "election results schedule").unwrap();
        classifier
    }

    fn encode(state: &ModelState) -> Vec<u8> {
        let mut bytes = Vec::new();
        state.write_to(&mut bytes).unwrap();
        bytes
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn round_trip_preserves_scores_and_summaries() {
        let original = trained();
        let mut bytes = Vec::new();
        original.save(&mut bytes).unwrap();

        let restored = Classifier::new();
        restored.load(bytes.as_slice()).unwrap();

        for query in ["free prize now", "meeting schedule", "now", "nothing known", ""] {
            assert_eq!(restored.classify(query), original.classify(query));
            assert_eq!(restored.score(query), original.score(query));
        }
        assert_eq!(restored.summaries(), original.summaries());
    }

    #[test]
    fn empty_model_round_trip() {
        let mut bytes = Vec::new();
        Classifier::new().save(&mut bytes).unwrap();

        let restored = trained();
        restored.load(bytes.as_slice()).unwrap();
        assert!(restored.summaries().is_empty());
    }

    #[test]
    fn load_replaces_existing_state() {
        let source = Classifier::new();
        source.train("spam", "buy now").unwrap();
        let mut bytes = Vec::new();
        source.save(&mut bytes).unwrap();

        let target = trained();
        target.load(bytes.as_slice()).unwrap();

        assert_eq!(target.category_names(), vec!["spam"]);
        assert_eq!(target.category("spam").unwrap().tally(), 2);
    }

    #[test]
    fn saved_snapshot_is_independent_of_later_mutation() {
        let classifier = trained();
        let mut bytes = Vec::new();
        classifier.save(&mut bytes).unwrap();
        classifier.flush();

        let state = ModelState::read_from(bytes.as_slice()).unwrap();
        assert_eq!(state.categories.len(), 3);
        assert_eq!(state.categories["spam"].tokens["now"], 2);
    }

    #[test]
    fn load_rejects_tally_mismatch_and_keeps_state() {
        let target = trained();
        let before = target.summaries();

        let bad = ModelState::new(BTreeMap::from([(
            "spam".to_string(),
            PersistedCategory {
                tokens: BTreeMap::from([("buy".to_string(), 2)]),
                tally: 5,
            },
        )]));
        let err = target.load(encode(&bad).as_slice()).unwrap_err();

        assert!(matches!(
            err,
            BayesError::Validation(ValidationError::InvalidTally { .. })
        ));
        assert_eq!(target.summaries(), before);
        assert_eq!(target.category("spam").unwrap().token_count("prize"), 1);
    }

    #[test]
    fn load_rejects_version_mismatch() {
        let target = trained();
        let mut state = ModelState::new(BTreeMap::new());
        state.version = 2;

        let err = target.load(encode(&state).as_slice()).unwrap_err();
        assert!(matches!(
            err,
            BayesError::Validation(ValidationError::UnsupportedVersion { version: 2 })
        ));
        assert_eq!(target.category_names().len(), 3);
    }

    #[test]
    fn load_rejects_invalid_category_name() {
        let target = Classifier::new();
        let bad = ModelState::new(BTreeMap::from([(
            "no spaces allowed".to_string(),
            PersistedCategory {
                tokens: BTreeMap::from([("buy".to_string(), 1)]),
                tally: 1,
            },
        )]));

        assert!(matches!(
            target.load(encode(&bad).as_slice()),
            Err(BayesError::Validation(
                ValidationError::InvalidCategoryName { .. }
            ))
        ));
        assert!(target.category_names().is_empty());
    }

    #[test]
    fn load_reports_decode_errors() {
        let target = trained();
        assert!(matches!(
            target.load(&b"garbage"[..]),
            Err(BayesError::Decode(_))
        ));
        assert_eq!(target.category_names().len(), 3);
    }

    #[test]
    fn save_reports_writer_errors() {
        let err = trained().save(FailingWriter).unwrap_err();
        assert!(matches!(err, BayesError::Encode(_)));
    }

    fn saturated(names: &[&str]) -> Vec<u8> {
        let categories = names
            .iter()
            .map(|name| {
                let cat = PersistedCategory {
                    tokens: BTreeMap::from([("tok".to_string(), i64::MAX)]),
                    tally: i64::MAX,
                };
                (name.to_string(), cat)
            })
            .collect();
        encode(&ModelState::new(categories))
    }

    #[test]
    fn load_handles_category_totals_beyond_u64() {
        let target = Classifier::new();
        target.load(saturated(&["a", "b", "c"]).as_slice()).unwrap();

        let summaries = target.summaries();
        assert_eq!(summaries.len(), 3);
        for summary in summaries.values() {
            assert!((summary.prob_in_cat - 1.0 / 3.0).abs() < 1e-12);
        }
        assert_eq!(target.classify("tok").category.as_deref(), Some("a"));
    }

    #[test]
    fn training_a_saturated_category_fails_and_model_stays_loadable() {
        let target = Classifier::new();
        target.load(saturated(&["spam"]).as_slice()).unwrap();

        for _ in 0..3 {
            assert!(matches!(
                target.train("spam", "tok"),
                Err(BayesError::CountOverflow { .. })
            ));
        }

        let mut bytes = Vec::new();
        target.save(&mut bytes).unwrap();
        let restored = Classifier::new();
        restored.load(bytes.as_slice()).unwrap();
        assert_eq!(restored.category("spam").unwrap().tally(), i64::MAX as u64);
    }

    #[test]
    fn loaded_model_recomputes_priors() {
        let source = Classifier::new();
        source.train("spam", "buy buy buy").unwrap();
        source.train("ham", "team").unwrap();
        let mut bytes = Vec::new();
        source.save(&mut bytes).unwrap();

        let target = Classifier::new();
        target.load(bytes.as_slice()).unwrap();
        let summaries = target.summaries();
        assert!((summaries["spam"].prob_in_cat - 0.75).abs() < 1e-12);
        assert!((summaries["ham"].prob_in_cat - 0.25).abs() < 1e-12);
    }
}
