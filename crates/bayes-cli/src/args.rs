use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bayes")]
#[command(about = "Train and query a Naive Bayes text classifier")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.bayes)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Model file (overrides model.path from config)
    #[arg(short, long, global = true)]
    pub model: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Text given inline, from a file, or on stdin
#[derive(Args)]
pub struct TextInput {
    /// Sample text (default: read stdin)
    pub text: Option<String>,

    /// Read the sample from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Model(ModelCommand),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Commands that work on a trained model
#[derive(Subcommand)]
pub enum ModelCommand {
    /// Train a category with a text sample
    Train {
        /// Category name ([-_A-Za-z0-9]+)
        category: String,

        #[command(flatten)]
        input: TextInput,
    },

    /// Remove a text sample from a category
    Untrain {
        /// Category name ([-_A-Za-z0-9]+)
        category: String,

        #[command(flatten)]
        input: TextInput,
    },

    /// Show the best-matching category for a text sample
    Classify {
        #[command(flatten)]
        input: TextInput,
    },

    /// Show every category scoring above zero for a text sample
    Score {
        #[command(flatten)]
        input: TextInput,
    },

    /// Show token tallies and priors per category
    Info,

    /// Discard all trained categories
    Flush,

    /// Write the current model to another file
    Save {
        /// Destination path
        path: PathBuf,
    },

    /// Replace the current model with one read from a file
    Load {
        /// Source path
        path: PathBuf,
    },
}

impl ModelCommand {
    /// Whether the command starts from the saved model
    ///
    /// `flush` and `load` discard it, so they still work when it is corrupt.
    pub fn reads_saved_model(&self) -> bool {
        !matches!(self, Self::Flush | Self::Load { .. })
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., model.path)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., tokenizer.kind)
        key: String,

        /// Value to set (e.g., "whitespace")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
