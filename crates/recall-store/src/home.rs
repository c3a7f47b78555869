use std::path::{Path, PathBuf};
use std::{env, fs};

use recall_core::Vectorizer;

use crate::config::{CONFIG_FILE, RecallConfig};
use crate::error::{Result, StoreError};
use crate::store::{DEFAULT_SNAPSHOT, Store};

/// File name of the snapshot database inside the data directory.
pub const DATABASE_FILE: &str = "recall.db";

/// Default data directory: `~/.recall`.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".recall")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// A data directory: config plus snapshot store.
pub struct RecallHome {
    base: PathBuf,
    config: RecallConfig,
    store: Store,
}

impl RecallHome {
    /// Open the data directory, creating it as needed.
    /// `base_dir`: override the base directory (for testing).
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        fs::create_dir_all(&base).map_err(|e| StoreError::io(&base, e))?;

        let config = RecallConfig::load(&base.join(CONFIG_FILE))?;
        let store = Store::open(&base.join(DATABASE_FILE))?;

        Ok(Self {
            base,
            config,
            store,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The saved default vectorizer, or a fresh one at the configured dimension.
    pub fn load_vectorizer(&self) -> Result<Vectorizer> {
        match self.store.load_snapshot(DEFAULT_SNAPSHOT)? {
            Some(vectorizer) => Ok(vectorizer),
            None => Ok(Vectorizer::new(self.config.dimension)),
        }
    }

    pub fn save_vectorizer(&self, vectorizer: &Vectorizer) -> Result<()> {
        self.store.save_snapshot(DEFAULT_SNAPSHOT, vectorizer)
    }
}
