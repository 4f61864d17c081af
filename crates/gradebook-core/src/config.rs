//! Gradebook configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on nested re-entries of one guarded operation before a
/// cascade is considered non-terminating.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 4096;

/// How score edits that fall outside a category's bounds are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundPolicy {
    /// Log a warning and apply the change.
    #[default]
    Warn,
    /// Refuse the change.
    Reject,
}

impl std::str::FromStr for BoundPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(BoundPolicy::Warn),
            "reject" => Ok(BoundPolicy::Reject),
            other => anyhow::bail!("unknown bound policy '{other}' (expected 'warn' or 'reject')"),
        }
    }
}

/// What happens to a parent's evaluations when the parent leaves its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnRemove {
    /// Clear the back-reference; the evaluation survives if it is still
    /// linked elsewhere or was added directly.
    Detach,
    /// Drop the evaluation from the evaluations registry.
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalPolicy {
    #[serde(default = "default_student_removal")]
    pub students: OnRemove,
    #[serde(default = "default_category_removal")]
    pub categories: OnRemove,
}

fn default_student_removal() -> OnRemove {
    OnRemove::Delete
}

fn default_category_removal() -> OnRemove {
    OnRemove::Detach
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self {
            students: default_student_removal(),
            categories: default_category_removal(),
        }
    }
}

/// Top-level gradebook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradebookConfig {
    #[serde(default)]
    pub bound_policy: BoundPolicy,
    #[serde(default)]
    pub removal: RemovalPolicy,
    /// Nested re-entries of one operation before a cascade is treated as
    /// runaway.
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: usize,
    /// Keep a journal of change events.
    #[serde(default = "default_true")]
    pub record_events: bool,
}

fn default_max_cascade_depth() -> usize {
    DEFAULT_MAX_CASCADE_DEPTH
}

fn default_true() -> bool {
    true
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            bound_policy: BoundPolicy::default(),
            removal: RemovalPolicy::default(),
            max_cascade_depth: default_max_cascade_depth(),
            record_events: true,
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradebook.toml` in the current directory
/// 2. `~/.config/gradebook/config.toml`
///
/// Environment variable override: `GRADEBOOK_BOUND_POLICY` (`warn` or `reject`).
pub fn load_config() -> Result<GradebookConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradebookConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("gradebook.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradebookConfig::default(),
    };

    if let Ok(policy) = std::env::var("GRADEBOOK_BOUND_POLICY") {
        config.bound_policy = policy
            .parse()
            .context("invalid GRADEBOOK_BOUND_POLICY")?;
    }

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Parse a TOML configuration document.
pub fn parse_config(content: &str) -> Result<GradebookConfig> {
    let config: GradebookConfig = toml::from_str(content)?;
    if config.max_cascade_depth == 0 {
        anyhow::bail!("max_cascade_depth must be at least 1");
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradebook"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GradebookConfig::default();
        assert_eq!(config.bound_policy, BoundPolicy::Warn);
        assert_eq!(config.removal.students, OnRemove::Delete);
        assert_eq!(config.removal.categories, OnRemove::Detach);
        assert_eq!(config.max_cascade_depth, DEFAULT_MAX_CASCADE_DEPTH);
        assert!(config.record_events);
    }

    #[test]
    fn parse_partial_config() {
        let config = parse_config(
            r#"
bound_policy = "reject"

[removal]
students = "detach"
"#,
        )
        .unwrap();
        assert_eq!(config.bound_policy, BoundPolicy::Reject);
        assert_eq!(config.removal.students, OnRemove::Detach);
        assert_eq!(config.removal.categories, OnRemove::Detach);
        assert!(config.record_events);
    }

    #[test]
    fn zero_cascade_depth_is_rejected() {
        assert!(parse_config("max_cascade_depth = 0").is_err());
    }

    #[test]
    fn bound_policy_from_str() {
        assert_eq!("Reject".parse::<BoundPolicy>().unwrap(), BoundPolicy::Reject);
        assert_eq!(" warn ".parse::<BoundPolicy>().unwrap(), BoundPolicy::Warn);
        assert!("strict".parse::<BoundPolicy>().is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config_from(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gradebook.toml");
        std::fs::write(&path, "record_events = false\nmax_cascade_depth = 64\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert!(!config.record_events);
        assert_eq!(config.max_cascade_depth, 64);
    }
}
