//! Versioned model snapshot and its binary codec
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Magic "BAYESMDL" (8 bytes)                   │
//! ├──────────────────────────────────────────────┤
//! │ ModelState (bincode, fixed-width LE ints)    │
//! │   ├─ version (u32)                           │
//! │   └─ categories: name -> { tokens, tally }   │
//! └──────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::category::{is_valid_category_name, Category};
use crate::error::{BayesError, Result, ValidationError};

/// Model file magic bytes
const MODEL_MAGIC: &[u8; 8] = b"BAYESMDL";

/// Current snapshot version; anything else is rejected on load
pub const MODEL_VERSION: u32 = 1;

/// Upper bound on the encoded snapshot size
const MAX_MODEL_BYTES: u64 = 1 << 30;

/// One category's counts as stored on disk
///
/// Counts are signed so that a corrupt snapshot still decodes and is then
/// rejected by [`validate_categories`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCategory {
    pub tokens: BTreeMap<String, i64>,
    pub tally: i64,
}

impl TryFrom<&Category> for PersistedCategory {
    type Error = BayesError;

    fn try_from(cat: &Category) -> Result<Self> {
        let to_signed = |count: u64| {
            i64::try_from(count).map_err(|_| {
                BayesError::Encode(format!("count {count} in {} exceeds i64", cat.name()))
            })
        };

        let tokens = cat
            .tokens()
            .map(|(token, count)| to_signed(count).map(|count| (token.to_string(), count)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self {
            tokens,
            tally: to_signed(cat.tally())?,
        })
    }
}

/// Complete persisted model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelState {
    pub version: u32,
    pub categories: BTreeMap<String, PersistedCategory>,
}

impl ModelState {
    pub fn new(categories: BTreeMap<String, PersistedCategory>) -> Self {
        Self {
            version: MODEL_VERSION,
            categories,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.version != MODEL_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                version: self.version,
            });
        }
        validate_categories(&self.categories)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer
            .write_all(MODEL_MAGIC)
            .map_err(|e| BayesError::Encode(e.to_string()))?;
        codec()
            .serialize_into(&mut writer, self)
            .map_err(|e| BayesError::Encode(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| BayesError::Encode(e.to_string()))?;
        Ok(())
    }

    /// Decode a snapshot; the result is not validated
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|e| BayesError::Decode(e.to_string()))?;
        if &magic != MODEL_MAGIC {
            return Err(BayesError::Decode("invalid model file magic".into()));
        }

        codec()
            .deserialize_from(reader)
            .map_err(|e| BayesError::Decode(e.to_string()))
    }
}

/// Check every category against the live-model invariants
pub fn validate_categories(
    categories: &BTreeMap<String, PersistedCategory>,
) -> std::result::Result<(), ValidationError> {
    for (name, cat) in categories {
        if !is_valid_category_name(name) {
            return Err(ValidationError::InvalidCategoryName { name: name.clone() });
        }

        let mut sum: i128 = 0;
        for (token, &count) in &cat.tokens {
            if token.is_empty() {
                return Err(ValidationError::EmptyToken {
                    category: name.clone(),
                });
            }
            if count <= 0 {
                return Err(ValidationError::InvalidTokenCount {
                    category: name.clone(),
                    token: token.clone(),
                    count,
                });
            }
            sum += i128::from(count);
        }

        if cat.tally < 0 || sum != i128::from(cat.tally) {
            return Err(ValidationError::InvalidTally {
                category: name.clone(),
                tally: cat.tally,
                sum,
            });
        }
    }

    Ok(())
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MODEL_BYTES)
}
