//! Text tokenization strategies
//!
//! The classifier only needs `text -> tokens`. Any `Fn(&str) -> Vec<String>`
//! closure works as a [`Tokenizer`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::BayesError;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Lowercases and splits on anything that is not a letter or digit (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        split_words(&text.to_lowercase())
            .map(str::to_string)
            .collect()
    }
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
}

/// NFKC-normalizes, lowercases, splits like [`WordTokenizer`], then applies
/// the Snowball English stemmer
pub struct StemmingTokenizer {
    stemmer: Stemmer,
}

impl StemmingTokenizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for StemmingTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for StemmingTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfkc().collect();
        split_words(&normalized.to_lowercase())
            .map(|word| self.stemmer.stem(word).into_owned())
            .filter(|token| !token.is_empty())
            .collect()
    }
}

/// Lowercases and splits on whitespace runs
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Built-in tokenizer selectable from config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerKind {
    #[default]
    Word,
    Whitespace,
    Stemmed,
}

impl TokenizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Whitespace => "whitespace",
            Self::Stemmed => "stemmed",
        }
    }

    pub fn build(&self) -> Arc<dyn Tokenizer> {
        match self {
            Self::Word => Arc::new(WordTokenizer),
            Self::Whitespace => Arc::new(WhitespaceTokenizer),
            Self::Stemmed => Arc::new(StemmingTokenizer::new()),
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TokenizerKind {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"') {
            "word" => Ok(Self::Word),
            "whitespace" => Ok(Self::Whitespace),
            "stemmed" => Ok(Self::Stemmed),
            other => Err(BayesError::InvalidConfigValue {
                key: "tokenizer.kind".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_tokenizer_lowercases_and_splits_on_punctuation() {
        let tokens = WordTokenizer.tokenize("Hello, World! FREE-prize\tnow");
        assert_eq!(tokens, vec!["hello", "world", "free", "prize", "now"]);
    }

    #[test]
    fn word_tokenizer_keeps_unicode_letters_and_digits() {
        let tokens = WordTokenizer.tokenize("Café 2024 naïve");
        assert_eq!(tokens, vec!["café", "2024", "naïve"]);
    }

    #[test]
    fn whitespace_tokenizer_keeps_punctuation() {
        let tokens = WhitespaceTokenizer.tokenize("  Buy NOW!  buy   now ");
        assert_eq!(tokens, vec!["buy", "now!", "buy", "now"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(WordTokenizer.tokenize("").is_empty());
        assert!(WordTokenizer.tokenize(" ... ").is_empty());
        assert!(WhitespaceTokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn stemming_tokenizer_reduces_inflections() {
        let tokens = StemmingTokenizer::new().tokenize("Running runs, RUN!");
        assert_eq!(tokens, vec!["run", "run", "run"]);
    }

    #[test]
    fn stemming_tokenizer_applies_nfkc() {
        let tokenizer = StemmingTokenizer::new();
        // U+FB01 LATIN SMALL LIGATURE FI and fullwidth digits fold to ASCII.
        assert_eq!(tokenizer.tokenize("\u{FB01}nding"), vec!["find"]);
        assert_eq!(tokenizer.tokenize("\u{FF12}\u{FF10}24"), vec!["2024"]);
        assert_eq!(
            tokenizer.tokenize("\u{FB01}nding"),
            tokenizer.tokenize("finding")
        );
    }

    #[test]
    fn stemming_tokenizer_handles_empty_input() {
        assert!(StemmingTokenizer::new().tokenize(" -- ").is_empty());
    }

    #[test]
    fn closures_are_tokenizers() {
        let upper = |text: &str| vec![text.to_uppercase()];
        assert_eq!(upper.tokenize("abc"), vec!["ABC"]);
    }

    #[test]
    fn kind_parses_and_builds() {
        assert_eq!("word".parse::<TokenizerKind>().unwrap(), TokenizerKind::Word);
        assert_eq!(
            "\"whitespace\"".parse::<TokenizerKind>().unwrap(),
            TokenizerKind::Whitespace
        );
        assert_eq!(
            "stemmed".parse::<TokenizerKind>().unwrap(),
            TokenizerKind::Stemmed
        );
        assert!("snowball".parse::<TokenizerKind>().is_err());

        let tokenizer = TokenizerKind::Whitespace.build();
        assert_eq!(tokenizer.tokenize("a,b c"), vec!["a,b", "c"]);
    }
}
