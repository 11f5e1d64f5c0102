use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use renmado_ipc::MirrorOptions;
use serde::{Deserialize, Serialize};

use super::{ClassifierKind, WindowClassifier, DEFAULT_BRAND};

/// Daemon settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Substring that marks a browser's main window title.
    pub brand: String,
    pub classifier: ClassifierKind,
    /// Defaults for sessions started without explicit options.
    pub mirror: MirrorOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brand: DEFAULT_BRAND.to_string(),
            classifier: ClassifierKind::default(),
            mirror: MirrorOptions::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("renmado").join("config.json"))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn classifier(&self) -> Arc<dyn WindowClassifier> {
        Arc::from(self.classifier.build(&self.brand))
    }
}
