pub mod category;
pub mod classifier;
pub mod config;
pub mod error;
pub mod persist;
pub mod tokenizer;

pub use category::{
    is_valid_category_name, validate_category_name, Category, CategoryStore, CategorySummary,
};
pub use classifier::{Classification, Classifier};
pub use config::{Config, ModelConfig, TokenizerConfig};
pub use error::{BayesError, PersistStep, Result, ValidationError};
pub use persist::{default_model_path, ModelState, PersistedCategory, MODEL_VERSION};
pub use tokenizer::{
    StemmingTokenizer, Tokenizer, TokenizerKind, WhitespaceTokenizer, WordTokenizer,
};
