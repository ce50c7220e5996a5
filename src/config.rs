use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{suggest_similar, PyLuaError};

/// Configuration file looked up in the working directory by the CLI.
pub const DEFAULT_CONFIG_PATH: &str = ".pyluaconf.json";

const TOP_LEVEL_KEYS: &[&str] = &["class", "top_locals"];
const CLASS_KEYS: &[&str] = &["return_at_the_end"];

/// Translation options.
///
/// Unknown keys are kept in `extra` so a config written for a newer version
/// still loads; they have no effect on translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub class: ClassConfig,
    /// Declare module-level bindings with `local`.
    pub top_locals: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    /// Emit `return <Class>` after every top-level class.
    pub return_at_the_end: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            class: ClassConfig::default(),
            top_locals: true,
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config, PyLuaError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Config::from_json(&text, &path.display().to_string())?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse config text; `origin` names the source in error messages.
    pub fn from_json(text: &str, origin: &str) -> Result<Config, PyLuaError> {
        let config: Config = serde_json::from_str(text).map_err(|err| PyLuaError::Config {
            path: origin.to_string(),
            message: err.to_string(),
        })?;
        for key in config.unknown_keys() {
            let leaf = key.rsplit('.').next().unwrap_or(&key);
            let candidates = if key.starts_with("class.") {
                CLASS_KEYS
            } else {
                TOP_LEVEL_KEYS
            };
            match suggest_similar(leaf, candidates) {
                Some(hint) => warn!(key = %key, "unknown config option (did you mean '{}'?)", hint),
                None => warn!(key = %key, "unknown config option"),
            }
        }
        Ok(config)
    }

    /// Dotted names of every unrecognised option, `class.*` ones included.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.extra.keys().cloned().collect();
        keys.extend(self.class.extra.keys().map(|k| format!("class.{}", k)));
        keys
    }
}
