//! Host configuration surface.
//!
//! The bootstrap only ever reads strings (and one flag) by dotted key, so the
//! host's store is a trait. [`TomlConfig`] backs it with `config.toml` in the
//! data folder.

use crate::catalog::LIBRARIES;
use crate::error::ConfigError;
use crate::fetch::CacheMode;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const NAMESPACE: &str = "kotlin";
pub const REPOSITORY_KEY: &str = "kotlin.repository";
pub const PACKAGING_KEY: &str = "kotlin.packaging";
pub const ATOMIC_DOWNLOADS_KEY: &str = "kotlin.atomic-downloads";

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_REPOSITORY: &str = "https://repo.maven.apache.org/maven2/";
pub const DEFAULT_PACKAGING: &str = "jar";

/// Written by `kload init`.
pub const DEFAULT_CONFIG: &str = r#"[kotlin]
# Maven-layout repository base. Must end with '/'.
repository = "https://repo.maven.apache.org/maven2/"
packaging = "jar"
# Download into a temp file and rename on success. When false, an empty
# placeholder is created first and a failed download stays cached.
atomic-downloads = true

[kotlin.library]
coroutines = "1.6.4"
stdlib = "1.8.0"
reflect = "1.8.0"
"#;

/// Read-only key/value view of host configuration.
pub trait ConfigStore {
    fn get_string(&self, key: &str) -> Option<String>;

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_string(key).and_then(|v| v.trim().parse().ok())
    }

    /// Like `get_string`, but absent or empty is an error.
    fn require_string(&self, key: &str) -> Result<String, ConfigError> {
        self.get_string(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                key: key.to_string(),
            })
    }
}

impl ConfigStore for HashMap<String, String> {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// TOML document addressed by dotted keys (`kotlin.library.stdlib`).
#[derive(Debug, Clone, Default)]
pub struct TomlConfig {
    table: toml::Table,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(Self { table })
    }

    /// Load from a file. A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("Config file not found at {}, using empty config", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            context: format!("reading config from {}", path.display()),
            source: e,
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write [`DEFAULT_CONFIG`] to `path`. Returns `false` if a file was
    /// already there and `force` is not set.
    pub fn write_default(path: &Path, force: bool) -> Result<bool, ConfigError> {
        if path.exists() && !force {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                context: format!("creating {}", parent.display()),
                source: e,
            })?;
        }
        fs::write(path, DEFAULT_CONFIG).map_err(|e| ConfigError::Io {
            context: format!("writing config to {}", path.display()),
            source: e,
        })?;
        Ok(true)
    }

    fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let mut parts = key.split('.');
        let mut value = self.table.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }
}

impl ConfigStore for TomlConfig {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.lookup(key)? {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.lookup(key)? {
            toml::Value::Boolean(b) => Some(*b),
            toml::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Everything the bootstrap reads besides per-library versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub repository: String,
    pub packaging: String,
    pub cache_mode: CacheMode,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigStore) -> Self {
        let repository = config.get_string(REPOSITORY_KEY).unwrap_or_else(|| {
            warn!("No repository configured ({})", REPOSITORY_KEY);
            String::new()
        });
        let packaging = config
            .get_string(PACKAGING_KEY)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PACKAGING.to_string());
        let cache_mode = match config.get_bool(ATOMIC_DOWNLOADS_KEY) {
            Some(false) => CacheMode::Placeholder,
            _ => CacheMode::Atomic,
        };

        Self {
            repository,
            packaging,
            cache_mode,
        }
    }

    /// Keys the bootstrap needs that are absent or empty.
    pub fn missing_keys(config: &dyn ConfigStore) -> Vec<ConfigError> {
        std::iter::once(REPOSITORY_KEY.to_string())
            .chain(LIBRARIES.iter().map(|lib| lib.version_key()))
            .filter_map(|key| config.require_string(&key).err())
            .collect()
    }
}
