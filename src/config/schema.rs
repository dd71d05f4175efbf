use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "DATA_EXPLORER";

/// Up to this many databases, new ones start expanded and every database's
/// collections are listed on refresh.
pub const DEFAULT_AUTO_EXPAND_CEILING: usize = 5;

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ExplorerConfig {
    pub source: Source,
    #[serde(default)]
    pub tree: Tree,
    #[serde(default)]
    pub misc: Misc,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    Snapshot(SnapshotSource),
    #[serde(rename = "memory")]
    InMemory(InMemory),
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct SnapshotSource {
    pub path: String,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct InMemory {}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Tree {
    pub auto_expand_ceiling: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self {
            auto_expand_ceiling: DEFAULT_AUTO_EXPAND_CEILING,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Default, Clone)]
#[serde(default)]
pub struct Misc {
    pub json_logs: bool,
}

pub fn validate_config(config: ExplorerConfig) -> Result<ExplorerConfig, ConfigError> {
    if let Source::Snapshot(SnapshotSource { ref path }) = config.source {
        if path.trim().is_empty() {
            return Err(ConfigError::Message(
                "A snapshot source needs a non-empty `path` to a JSON listing".to_string(),
            ));
        }
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<ExplorerConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    config.build()?.try_deserialize().and_then(validate_config)
}

// Load a config from a string (to test our structs are defined correctly)
pub fn load_config_from_string(
    config_str: &str,
    skip_validation: bool,
    env_override: Option<HashMap<String, String>>,
) -> Result<ExplorerConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(config_str, FileFormat::Toml))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env_override),
        );

    if skip_validation {
        config.build()?.try_deserialize()
    } else {
        config.build()?.try_deserialize().and_then(validate_config)
    }
}
