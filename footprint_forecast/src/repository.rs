//! Storage for the trained model artifact

use crate::error::{ForecastError, Result};
use crate::models::TrainedModel;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Load and save a single trained model
pub trait ModelRepository: Send + Sync {
    /// The stored model, or `None` when nothing usable is stored
    fn load(&self) -> Option<TrainedModel>;

    /// Replace the stored model
    fn save(&self, model: &TrainedModel) -> Result<()>;
}

/// JSON artifact on the local filesystem
///
/// Each save writes and syncs its own uniquely named temporary file in the
/// artifact's directory and renames it over the artifact. Readers never observe
/// a partially written model and concurrent saves do not share a temp file.
#[derive(Debug, Clone)]
pub struct FileModelRepository {
    path: PathBuf,
}

impl FileModelRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl ModelRepository for FileModelRepository {
    fn load(&self) -> Option<TrainedModel> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no stored model");
                return None;
            }
        };

        match serde_json::from_str::<TrainedModel>(&text) {
            Ok(model) => {
                info!(
                    path = %self.path.display(),
                    version = model.version(),
                    "loaded stored model"
                );
                Some(model)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable model artifact"
                );
                None
            }
        }
    }

    fn save(&self, model: &TrainedModel) -> Result<()> {
        let directory = self.directory();
        fs::create_dir_all(directory)?;

        let mut temp = NamedTempFile::new_in(directory)?;
        temp.write_all(&serde_json::to_vec(model)?)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| ForecastError::Io(e.error))?;

        info!(path = %self.path.display(), version = model.version(), "saved model");
        Ok(())
    }
}

/// Process-local repository for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryModelRepository {
    model: Mutex<Option<TrainedModel>>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `model`
    pub fn with_model(model: TrainedModel) -> Self {
        Self {
            model: Mutex::new(Some(model)),
        }
    }
}

impl ModelRepository for InMemoryModelRepository {
    fn load(&self) -> Option<TrainedModel> {
        self.model.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, model: &TrainedModel) -> Result<()> {
        let mut guard = self.model.lock().map_err(|_| {
            ForecastError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "model store lock poisoned",
            ))
        })?;
        *guard = Some(model.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileModelRepository::new(dir.path().join("absent.json"));
        assert!(repo.load().is_none());
    }

    #[test]
    fn test_corrupt_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "{not json").unwrap();

        let repo = FileModelRepository::new(&path);
        assert!(repo.load().is_none());
    }

    #[test]
    fn test_bare_file_name_saves_beside_cwd() {
        let repo = FileModelRepository::new("footprint_model.json");
        assert_eq!(repo.directory(), Path::new("."));

        let nested = FileModelRepository::new("models/footprint_model.json");
        assert_eq!(nested.directory(), Path::new("models"));
    }

    #[test]
    fn test_empty_in_memory_repository() {
        assert!(InMemoryModelRepository::new().load().is_none());
    }
}
