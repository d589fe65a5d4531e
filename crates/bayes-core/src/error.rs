use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BayesError {
    #[error("Invalid category name: '{name}' - must contain only alphanumeric, hyphen, underscore")]
    InvalidCategoryName { name: String },

    #[error("Invalid token count: {count} - must be greater than zero")]
    InvalidCount { count: u64 },

    #[error("Token count overflow in category '{category}'")]
    CountOverflow { category: String },

    #[error("encode model: {0}")]
    Encode(String),

    #[error("decode model: {0}")]
    Decode(String),

    #[error("invalid persisted model: {0}")]
    Validation(#[from] ValidationError),

    #[error("path must be absolute: {path}")]
    PathNotAbsolute { path: PathBuf },

    #[error("{step} temp file for {path}: {source}")]
    Persist {
        step: PersistStep,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("open model file {path}: {source}")]
    OpenModel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Config key not found: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidConfigValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a decoded snapshot is rejected before it touches live state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported model version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("invalid category name: {name:?}")]
    InvalidCategoryName { name: String },

    #[error("invalid category tally for {category:?}: tally={tally} sum={sum}")]
    InvalidTally {
        category: String,
        tally: i64,
        sum: i128,
    },

    #[error("invalid token count for {category:?} token {token:?}: {count}")]
    InvalidTokenCount {
        category: String,
        token: String,
        count: i64,
    },

    #[error("empty token in category {category:?}")]
    EmptyToken { category: String },
}

/// Stage of the temp-file-then-rename save sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStep {
    Create,
    Write,
    Sync,
    Rename,
}

impl PersistStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Sync => "sync",
            Self::Rename => "rename",
        }
    }
}

impl fmt::Display for PersistStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, BayesError>;

impl BayesError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidCategoryName { .. } => 2,
            Self::Validation(_) => 3,
            Self::Decode(_) => 4,
            Self::PathNotAbsolute { .. } => 5,
            _ => 1,
        }
    }
}
