//! Snapshot storage backends.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::GradebookConfig;
use crate::gradebook::Gradebook;
use crate::snapshot::GradebookSnapshot;

/// Bulk persistence of a gradebook's registered contents.
pub trait GradebookStore {
    fn load(&self) -> Result<GradebookSnapshot>;

    fn save(&mut self, snapshot: &GradebookSnapshot) -> Result<()>;
}

/// Stores a snapshot as a pretty-printed JSON file.
#[derive(Debug, Clone)]
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
}

impl GradebookStore for JsonFileStore {
    fn load(&self) -> Result<GradebookSnapshot> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read gradebook: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse gradebook: {}", self.path.display()))
    }

    fn save(&mut self, snapshot: &GradebookSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write gradebook: {}", self.path.display()))
    }
}

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<GradebookSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GradebookStore for MemoryStore {
    fn load(&self) -> Result<GradebookSnapshot> {
        self.snapshot
            .clone()
            .context("nothing has been saved to this store")
    }

    fn save(&mut self, snapshot: &GradebookSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

impl Gradebook {
    /// Load from a store and rebuild all links.
    pub fn load_from(store: &dyn GradebookStore, config: GradebookConfig) -> Result<Self> {
        let snapshot = store.load()?;
        Ok(Gradebook::load(snapshot, config)?)
    }

    pub fn save_to(&self, store: &mut dyn GradebookStore) -> Result<()> {
        let snapshot = self.snapshot();
        store.save(&snapshot)?;
        tracing::info!(
            evaluations = snapshot.evaluations.len(),
            "gradebook saved"
        );
        Ok(())
    }
}
