// src/store/mod.rs

//! Where watchers live.
//!
//! The engine only needs [`WatcherStore::find_watchers_for_path`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`]: a plain in-memory list, for embedding and tests.
//! - [`LocalStore`]: the config document on disk, which can also be
//!   modified and saved back.

pub mod local;

use crate::errors::{ChangelinkError, Result};
use crate::watcher::Watcher;

pub use local::LocalStore;

/// Lookup of watchers by repository-relative file path.
///
/// Implementations return only validated watchers, in a stable order.
pub trait WatcherStore {
    fn find_watchers_for_path(&self, path: &str) -> Result<Vec<Watcher>>;
}

impl<S: WatcherStore + ?Sized> WatcherStore for &S {
    fn find_watchers_for_path(&self, path: &str) -> Result<Vec<Watcher>> {
        (**self).find_watchers_for_path(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    watchers: Vec<Watcher>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-constructed watchers, validating each.
    /// Fails on the first invalid or duplicate-named watcher.
    pub fn from_watchers(watchers: impl IntoIterator<Item = Watcher>) -> Result<Self> {
        let mut store = Self::new();
        for watcher in watchers {
            store.add_watcher(watcher)?;
        }
        Ok(store)
    }

    /// Validate and register a watcher. Names must be unique.
    pub fn add_watcher(&mut self, watcher: Watcher) -> Result<()> {
        check_new_watcher(&self.watchers, &watcher)?;
        self.watchers.push(watcher);
        Ok(())
    }

    pub fn watchers(&self) -> &[Watcher] {
        &self.watchers
    }
}

impl WatcherStore for MemoryStore {
    fn find_watchers_for_path(&self, path: &str) -> Result<Vec<Watcher>> {
        Ok(watchers_for_path(&self.watchers, path))
    }
}

/// Rules every store applies before registering `watcher`.
pub(crate) fn check_new_watcher(existing: &[Watcher], watcher: &Watcher) -> Result<()> {
    watcher.validate()?;
    if existing.iter().any(|w| w.name == watcher.name) {
        return Err(ChangelinkError::MalformedWatcher {
            name: watcher.name.clone(),
            reason: "another watcher already uses this name".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn watchers_for_path(watchers: &[Watcher], path: &str) -> Vec<Watcher> {
    watchers
        .iter()
        .filter(|w| w.file_path == path)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_watchers_are_never_registered() {
        let mut store = MemoryStore::new();
        assert!(store.add_watcher(Watcher::new("", "a.go")).is_err());
        assert!(store.add_watcher(Watcher::new("w", " ")).is_err());
        assert!(store.watchers().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut store = MemoryStore::new();
        store.add_watcher(Watcher::new("w", "a.go")).unwrap();
        let err = store.add_watcher(Watcher::new("w", "b.go")).unwrap_err();
        assert!(matches!(err, ChangelinkError::MalformedWatcher { .. }));
        assert_eq!(store.watchers().len(), 1);

        assert!(
            MemoryStore::from_watchers([Watcher::new("x", "a.go"), Watcher::new("x", "a.go")])
                .is_err()
        );
    }

    #[test]
    fn lookup_is_exact_path_match() {
        let store = MemoryStore::from_watchers([
            Watcher::new("one", "svc/a.go"),
            Watcher::new("two", "svc/a.go.bak"),
            Watcher::new("three", "svc/a.go"),
        ])
        .unwrap();

        let names: Vec<_> = store
            .find_watchers_for_path("svc/a.go")
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["one", "three"]);
    }
}
