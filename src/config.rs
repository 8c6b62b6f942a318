//! Plugin configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::registry::DEFAULT_NODE_NAME;

/// Behaviour switches for a superfluous-variable session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Hide merged variables from the variable list instead of tagging them with a
    /// comment. Hidden variables cannot be unmarked from the UI.
    pub hide_superfluous: bool,
    /// Wipe the storage node on startup (recovers from bad saved data)
    pub reset_store: bool,
    /// Storage node holding the records
    pub node_name: String,
    /// Replay saved merges when a function's ctree becomes final
    pub auto_replay: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            hide_superfluous: false,
            reset_store: false,
            node_name: DEFAULT_NODE_NAME.to_string(),
            auto_replay: true,
        }
    }
}

impl PluginConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Config file if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PluginConfig = serde_json::from_str(r#"{ "hide_superfluous": true }"#).unwrap();
        assert!(config.hide_superfluous);
        assert!(config.auto_replay);
        assert_eq!(config.node_name, DEFAULT_NODE_NAME);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sf_lvars.json");
        std::fs::write(&path, r#"{ "node_name": "$ test", "auto_replay": false }"#).unwrap();

        let config = PluginConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.node_name, "$ test");
        assert!(!config.auto_replay);
        assert_eq!(PluginConfig::load_or_default(None).unwrap(), PluginConfig::default());
    }
}
