pub mod check;
pub mod evaluations;
pub mod init;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::Result;
use gradebook_core::config::load_config_from;
use gradebook_core::store::JsonFileStore;
use gradebook_core::Gradebook;

/// Load the gradebook at `data` with the resolved configuration.
pub fn open(data: &Path, config: Option<PathBuf>) -> Result<Gradebook> {
    let config = load_config_from(config.as_deref())?;
    tracing::debug!(path = %data.display(), "opening gradebook");
    Gradebook::load_from(&JsonFileStore::new(data), config)
}
