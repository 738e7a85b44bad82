use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use persona_common::ActorEntry;
use tracing::debug;

/// Result of reading the persisted collection.
#[derive(Debug, Clone)]
pub enum Loaded {
    /// No collection file exists yet.
    Missing,
    /// The file exists but is not a JSON array of entries.
    Corrupt(String),
    Entries(Vec<ActorEntry>),
}

/// Whole-collection persistence. Every save rewrites the full collection.
pub trait CollectionStore: Send + Sync {
    fn load(&self) -> Result<Loaded>;

    fn save(&self, entries: &[ActorEntry]) -> Result<()>;

    /// Human-readable location for log messages.
    fn location(&self) -> String;
}

/// A pretty-printed UTF-8 JSON array on disk.
///
/// Saves go to a temporary sibling file that is then renamed over the target,
/// so a crash mid-write leaves the previous checkpoint intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
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

impl CollectionStore for JsonFileStore {
    fn load(&self) -> Result<Loaded> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Loaded::Missing),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        match serde_json::from_str::<Vec<ActorEntry>>(&raw) {
            Ok(entries) => Ok(Loaded::Entries(entries)),
            Err(e) => Ok(Loaded::Corrupt(e.to_string())),
        }
    }

    fn save(&self, entries: &[ActorEntry]) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries).context("Failed to serialize collection")?;

        let dir = self.directory();
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&json)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), entries = entries.len(), "Collection checkpointed");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
