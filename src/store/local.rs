// src/store/local.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::loader::{load_from_path, render_document};
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::types::DocumentFormat;
use crate::watcher::Watcher;

use super::{WatcherStore, check_new_watcher, watchers_for_path};

/// Watchers backed by a config document on disk.
///
/// The document format follows the file extension and is kept when saving.
/// Entries that were rejected on load are written back unchanged, after the
/// valid watchers.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    format: DocumentFormat,
    config: ConfigFile,
}

impl LocalStore {
    /// Load and validate the document at `path`. The file must exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = DocumentFormat::from_path(&path)?;
        let config = ConfigFile::try_from(load_from_path(&path)?)?;

        info!(
            path = %path.display(),
            watchers = config.watchers.len(),
            rejected = config.rejected.len(),
            "loaded watcher store"
        );
        Ok(Self {
            path,
            format,
            config,
        })
    }

    /// A store with default settings and no watchers that will be written
    /// to `path` on [`save`](Self::save).
    pub fn empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = DocumentFormat::from_path(&path)?;
        Ok(Self {
            path,
            format,
            config: ConfigFile::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn watchers(&self) -> &[Watcher] {
        &self.config.watchers
    }

    /// Validate and register a watcher. Names must be unique.
    pub fn add_watcher(&mut self, watcher: Watcher) -> Result<()> {
        check_new_watcher(&self.config.watchers, &watcher)?;
        debug!(watcher = %watcher.name, file = %watcher.file_path, "adding watcher");
        self.config.watchers.push(watcher);
        Ok(())
    }

    /// Write the document back to its path in its original format.
    pub fn save(&self) -> Result<()> {
        let mut watchers = self
            .config
            .watchers
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        watchers.extend(self.config.rejected.iter().map(|r| r.raw.clone()));

        let doc = RawConfigFile {
            config: self.config.config.clone(),
            integrations: self.config.integrations.clone(),
            watchers,
        };
        let bytes = render_document(self.format, &doc)?;
        fs::write(&self.path, bytes)?;

        debug!(path = %self.path.display(), "saved watcher store");
        Ok(())
    }
}

impl WatcherStore for LocalStore {
    fn find_watchers_for_path(&self, path: &str) -> Result<Vec<Watcher>> {
        Ok(watchers_for_path(&self.config.watchers, path))
    }
}
