use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::error::{BayesError, Result};
use crate::persist::default_model_path;
use crate::tokenizer::TokenizerKind;

const CONFIG_FILE: &str = "config.toml";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# bayes configuration file
# Location: ~/.bayes/config.toml

[model]
# Absolute path of the model file
# Default: <system temp dir>/bayes.model
# Example: path = "/var/lib/bayes/model.bin"

# Save the model after train/untrain/flush
# Default: true
autosave = true

[tokenizer]
# "word": lowercase, split on anything that is not a letter or digit
# "whitespace": lowercase, split on whitespace only
# "stemmed": NFKC-normalize, split like "word", English Snowball stemming
kind = "word"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

/// Model file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Model file path (absolute); unset means the default location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Save after mutating commands
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

fn default_autosave() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            autosave: default_autosave(),
        }
    }
}

/// Tokenizer selection
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub kind: TokenizerKind,
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| BayesError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| BayesError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Model file to use, falling back to the default location
    pub fn model_path(&self) -> PathBuf {
        self.model.path.clone().unwrap_or_else(default_model_path)
    }

    /// Empty classifier wired with the configured tokenizer
    pub fn build_classifier(&self) -> Classifier {
        Classifier::with_tokenizer(self.tokenizer.kind.build())
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "model.path" => Some(self.model_path().display().to_string()),
            "model.autosave" => Some(self.model.autosave.to_string()),
            "tokenizer.kind" => Some(self.tokenizer.kind.to_string()),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || BayesError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "model.path" => {
                let trimmed = value.trim().trim_matches('"');
                if trimmed.is_empty() {
                    self.model.path = None;
                    return Ok(());
                }
                let path = PathBuf::from(trimmed);
                if !path.is_absolute() {
                    return Err(BayesError::PathNotAbsolute { path });
                }
                self.model.path = Some(path);
                Ok(())
            }
            "model.autosave" => {
                self.model.autosave = value.trim().parse().map_err(|_| invalid())?;
                Ok(())
            }
            "tokenizer.kind" => {
                self.tokenizer.kind = value.parse()?;
                Ok(())
            }
            _ => Err(BayesError::ConfigKeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        ["model.path", "model.autosave", "tokenizer.kind"]
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }
}
