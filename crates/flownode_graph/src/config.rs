// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bound on nested resolve calls
pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 256;

/// Default undo history depth
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Engine and history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting of auto-run producers evaluated by resolve
    pub max_resolve_depth: usize,
    /// Maximum number of undo entries kept by the command history
    pub history_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Parse from a RON string; missing fields take their defaults
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }
}

/// Error loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// RON could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON could not be produced
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_resolve_depth, DEFAULT_MAX_RESOLVE_DEPTH);
        assert_eq!(config.history_depth, DEFAULT_HISTORY_DEPTH);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron("(history_depth: 8)").unwrap();
        assert_eq!(config.history_depth, 8);
        assert_eq!(config.max_resolve_depth, DEFAULT_MAX_RESOLVE_DEPTH);
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig {
            max_resolve_depth: 12,
            history_depth: 3,
        };
        let ron_str = config.to_ron().unwrap();
        assert_eq!(EngineConfig::from_ron(&ron_str).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(max_resolve_depth: 4)").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_resolve_depth, 4);
    }

    #[test]
    fn test_invalid_ron_is_reported() {
        assert!(matches!(
            EngineConfig::from_ron("(max_resolve_depth: \"deep\")"),
            Err(ConfigError::Parse(_))
        ));
    }
}
