//! File-based model persistence
//!
//! Saves go through a hidden temp file in the destination directory which is
//! synced, closed and then renamed over the target, so readers never observe a
//! partially written model. The temp file is removed on every failure path.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classifier::Classifier;
use crate::error::{BayesError, PersistStep, Result};

const DEFAULT_MODEL_FILE: &str = "bayes.model";
const TEMP_PREFIX: &str = ".bayes-";

/// Model location used when an empty path is given: `<temp dir>/bayes.model`
pub fn default_model_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_MODEL_FILE)
}

fn resolve_model_path(path: &Path) -> Result<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        default_model_path()
    } else {
        path.to_path_buf()
    };

    if !path.is_absolute() {
        return Err(BayesError::PathNotAbsolute { path });
    }
    Ok(path)
}

impl Classifier {
    /// Atomically write the model to an absolute `path`
    ///
    /// An empty path means [`default_model_path`].
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = resolve_model_path(path.as_ref())?;
        let dir = path.parent().unwrap_or_else(|| Path::new("/"));

        let mut encoded = Vec::new();
        self.save(&mut encoded)?;

        let persist_err = |step: PersistStep, source: std::io::Error| BayesError::Persist {
            step,
            path: path.clone(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| persist_err(PersistStep::Create, e))?;
        temp.write_all(&encoded)
            .map_err(|e| persist_err(PersistStep::Write, e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| persist_err(PersistStep::Sync, e))?;
        // Close the handle before the rename.
        temp.into_temp_path()
            .persist(&path)
            .map_err(|e| persist_err(PersistStep::Rename, e.error))?;

        debug!(path = %path.display(), bytes = encoded.len(), "saved model file");
        Ok(())
    }

    /// Replace the model with the one stored at an absolute `path`
    ///
    /// An empty path means [`default_model_path`].
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = resolve_model_path(path.as_ref())?;
        let file = File::open(&path).map_err(|source| BayesError::OpenModel {
            path: path.clone(),
            source,
        })?;

        self.load(BufReader::new(file))?;
        debug!(path = %path.display(), "loaded model file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    fn trained() -> Classifier {
        let classifier = Classifier::new();
        classifier.train("spam", "free prize click now").unwrap();
        classifier
            .train("ham", "team meeting schedule project")
            .unwrap();
        classifier
    }

    fn temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[test]
    fn save_to_file_and_load_from_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.bin");

        let original = trained();
        original.save_to_file(&path)?;

        let restored = Classifier::new();
        restored.load_from_file(&path)?;
        assert_eq!(restored.summaries(), original.summaries());
        assert_eq!(restored.classify("free prize"), original.classify("free prize"));
        assert!(temp_files(dir.path()).is_empty());
        Ok(())
    }

    #[test]
    fn save_overwrites_existing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.bin");

        trained().save_to_file(&path)?;
        let smaller = Classifier::new();
        smaller.train("only", "one").unwrap();
        smaller.save_to_file(&path)?;

        let restored = Classifier::new();
        restored.load_from_file(&path)?;
        assert_eq!(restored.category_names(), vec!["only"]);
        Ok(())
    }

    #[test]
    fn relative_paths_are_rejected() {
        let classifier = trained();
        assert!(matches!(
            classifier.save_to_file("relative/model.bin"),
            Err(BayesError::PathNotAbsolute { .. })
        ));
        assert!(matches!(
            classifier.load_from_file("model.bin"),
            Err(BayesError::PathNotAbsolute { .. })
        ));
    }

    #[test]
    fn empty_path_resolves_to_default_location() {
        assert_eq!(resolve_model_path(Path::new("")).unwrap(), default_model_path());
        assert!(default_model_path().is_absolute());
        assert!(default_model_path().ends_with(DEFAULT_MODEL_FILE));

        let explicit = std::env::temp_dir().join("elsewhere.bin");
        assert_eq!(resolve_model_path(&explicit).unwrap(), explicit);
    }

    #[test]
    fn saved_file_is_closed_and_complete() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.bin");

        let original = trained();
        original.save_to_file(&path)?;

        let mut expected = Vec::new();
        original.save(&mut expected)?;
        assert_eq!(fs::read(&path)?, expected);
        assert!(temp_files(dir.path()).is_empty());
        Ok(())
    }

    #[test]
    fn missing_directory_fails_at_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("model.bin");

        let err = trained().save_to_file(&path).unwrap_err();
        assert!(matches!(
            err,
            BayesError::Persist {
                step: PersistStep::Create,
                ..
            }
        ));
    }

    #[test]
    fn failed_rename_removes_temp_file_and_keeps_target() -> Result<()> {
        let dir = TempDir::new()?;
        // A non-empty directory cannot be replaced by a file.
        let target = dir.path().join("model.bin");
        fs::create_dir(&target)?;
        fs::write(target.join("keep"), b"original")?;

        let err = trained().save_to_file(&target).unwrap_err();
        assert!(matches!(
            err,
            BayesError::Persist {
                step: PersistStep::Rename,
                ..
            }
        ));
        assert!(temp_files(dir.path()).is_empty());
        assert_eq!(fs::read(target.join("keep"))?, b"original");
        Ok(())
    }

    #[test]
    fn load_from_missing_file_fails_without_mutation() {
        let dir = TempDir::new().unwrap();
        let classifier = trained();

        let err = classifier
            .load_from_file(dir.path().join("absent.bin"))
            .unwrap_err();
        assert!(matches!(err, BayesError::OpenModel { .. }));
        assert_eq!(classifier.category_names(), vec!["ham", "spam"]);
    }

    #[test]
    fn load_from_corrupt_file_fails_without_mutation() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("corrupt.bin");
        fs::write(&path, b"BAYESMDL\x01")?;

        let classifier = trained();
        assert!(matches!(
            classifier.load_from_file(&path),
            Err(BayesError::Decode(_))
        ));
        assert_eq!(classifier.category_names(), vec!["ham", "spam"]);
        Ok(())
    }
}
