//! Read-through template cache validated by modification times

use crate::template::Template;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Modification times a cached template was loaded under.
///
/// The directory mtime changes when frames are added, removed or renamed.
/// The config and frame mtimes change when those files are rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Stamp {
    dir: Option<SystemTime>,
    config: Option<SystemTime>,
    frames: Vec<Option<SystemTime>>,
}

impl Stamp {
    pub(crate) fn capture(dir: &Path, config: &Path, frames: &[PathBuf]) -> Self {
        Self {
            dir: mtime(dir),
            config: mtime(config),
            frames: frames.iter().map(|p| mtime(p)).collect(),
        }
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

struct CacheEntry {
    stamp: Stamp,
    template: Arc<Template>,
}

/// Cache of loaded templates keyed by template name.
///
/// Entries are replaced, never accumulated, so the cache holds at most one
/// template per directory under the root.
#[derive(Default)]
pub(crate) struct TemplateCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TemplateCache {
    /// Return the cached template if it was loaded under `stamp`.
    pub(crate) fn get(&self, name: &str, stamp: &Stamp) -> Option<Arc<Template>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(name)
            .filter(|entry| entry.stamp == *stamp)
            .map(|entry| Arc::clone(&entry.template))
    }

    pub(crate) fn insert(&self, name: &str, stamp: Stamp, template: Arc<Template>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(name.to_string(), CacheEntry { stamp, template });
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
