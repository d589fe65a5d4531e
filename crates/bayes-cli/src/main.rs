use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bayes_core::config::Config;
use bayes_core::{BayesError, Classifier, Result};

mod args;
use args::{Cli, Commands, ConfigAction, ModelCommand, Shell, TextInput};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);
    let output = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        Some(Commands::Model(command)) => {
            Session::open(&base_dir, cli.model, command.reads_saved_model())
                .and_then(|session| handle_model_command(command, &session, output))
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        "bayes_core=debug,bayes_cli=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("BAYES_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".bayes"))
        .unwrap_or_else(|| PathBuf::from(".bayes"))
}

/// Make a user-supplied path absolute relative to the working directory
fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() || path.as_os_str().is_empty() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
    quiet: bool,
}

impl Output {
    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered =
            serde_json::to_string_pretty(value).map_err(|e| BayesError::Encode(e.to_string()))?;
        println!("{}", rendered);
        Ok(())
    }

    fn status(&self, label: &str, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{} {}", label.green(), message);
        }
    }
}

/// A classifier loaded from the configured model file
struct Session {
    classifier: Classifier,
    model_path: PathBuf,
    autosave: bool,
}

impl Session {
    /// Set up the classifier, loading the saved model only if `preload`
    fn open(base_dir: &Path, model_override: Option<PathBuf>, preload: bool) -> Result<Self> {
        let config = Config::load(base_dir)?;
        let model_path = match model_override {
            Some(path) => absolutize(path)?,
            None => config.model_path(),
        };

        let classifier = config.build_classifier();
        if !preload {
            debug!(path = %model_path.display(), "starting without the saved model");
        } else if model_path.exists() {
            classifier.load_from_file(&model_path)?;
        } else {
            debug!(path = %model_path.display(), "no model file yet, starting empty");
        }

        Ok(Self {
            classifier,
            model_path,
            autosave: config.model.autosave,
        })
    }

    /// Write the model back after a mutation, if autosave is on
    fn commit(&self) -> Result<()> {
        if !self.autosave {
            warn!("model.autosave is off; changes were not saved");
            return Ok(());
        }
        self.classifier.save_to_file(&self.model_path)
    }
}

fn read_text(input: TextInput) -> Result<String> {
    if let Some(text) = input.text {
        return Ok(text);
    }
    if let Some(path) = input.file {
        return Ok(fs::read_to_string(path)?);
    }

    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

fn handle_model_command(command: ModelCommand, session: &Session, output: Output) -> Result<()> {
    let classifier = &session.classifier;

    match command {
        ModelCommand::Train { category, input } => {
            classifier.train(&category, &read_text(input)?)?;
            session.commit()?;
            print_category_state(classifier, &category, output, "Trained:")?;
        }
        ModelCommand::Untrain { category, input } => {
            classifier.untrain(&category, &read_text(input)?)?;
            session.commit()?;
            print_category_state(classifier, &category, output, "Untrained:")?;
        }
        ModelCommand::Classify { input } => {
            let classification = classifier.classify(&read_text(input)?);
            if output.json {
                return output.print_json(&classification);
            }
            match classification.category {
                Some(category) => println!(
                    "{} {}",
                    category.cyan().bold(),
                    format!("(score {:.6})", classification.score).dimmed()
                ),
                None => println!("No matching category."),
            }
        }
        ModelCommand::Score { input } => {
            let scores = classifier.score(&read_text(input)?);
            if output.json {
                return output.print_json(&scores);
            }
            if scores.is_empty() {
                println!("No category scored above zero.");
                return Ok(());
            }

            let mut ranked: Vec<_> = scores.into_iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            for (name, score) in ranked {
                println!("  {:<24} {:.6}", name.cyan(), score);
            }
        }
        ModelCommand::Info => {
            let summaries = classifier.summaries();
            if output.json {
                return output.print_json(&summaries);
            }
            if summaries.is_empty() {
                println!("No categories trained.");
                println!();
                println!("Train one with: bayes train <category> <text>");
                return Ok(());
            }

            println!();
            println!(
                "  {:<24} {:>10} {:>12} {:>12}",
                "CATEGORY".bold(),
                "TOKENS".bold(),
                "P(IN)".bold(),
                "P(NOT IN)".bold()
            );
            for (name, summary) in &summaries {
                println!(
                    "  {:<24} {:>10} {:>12.6} {:>12.6}",
                    name.cyan(),
                    summary.token_tally,
                    summary.prob_in_cat,
                    summary.prob_not_in_cat
                );
            }
            println!();
            println!("Model: {}", session.model_path.display());
        }
        ModelCommand::Flush => {
            classifier.flush();
            session.commit()?;
            output.status("Flushed:", session.model_path.display());
        }
        ModelCommand::Save { path } => {
            let path = absolutize(path)?;
            classifier.save_to_file(&path)?;
            output.status("Saved:", path.display());
        }
        ModelCommand::Load { path } => {
            let path = absolutize(path)?;
            classifier.load_from_file(&path)?;
            session.commit()?;
            output.status("Loaded:", path.display());
        }
    }

    Ok(())
}

fn print_category_state(
    classifier: &Classifier,
    category: &str,
    output: Output,
    label: &str,
) -> Result<()> {
    if output.json {
        return output.print_json(&classifier.summaries());
    }

    match classifier.category(category) {
        Some(cat) => output.status(
            label,
            format!("{} ({} tokens, tally {})", category, cat.len(), cat.tally()),
        ),
        None => output.status(label, format!("{} (removed, no tokens left)", category)),
    }
    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(BayesError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "bayes", &mut io::stdout());
}
