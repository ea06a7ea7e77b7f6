//! A self-contained host: a data folder, its `config.toml`, and a loading
//! context picked from the configured packaging.
//!
//! Shared-library packagings (`so`, `dylib`, `dll`) link into
//! [`NativeLibraries`]; anything else into a [`ClassPath`].

use crate::bootstrap::{Host, LIBRARIES_DIR};
use crate::config::{CONFIG_FILE, ConfigStore, PACKAGING_KEY, TomlConfig};
use crate::error::ConfigError;
use crate::link::{ClassPath, LinkTarget, NativeLibraries};
use std::path::{Path, PathBuf};

const NATIVE_PACKAGINGS: [&str; 3] = ["so", "dylib", "dll"];

pub struct StandaloneHost {
    data_folder: PathBuf,
    config: TomlConfig,
    class_path: ClassPath,
    native: NativeLibraries,
    use_native: bool,
}

impl StandaloneHost {
    /// Open a data folder, reading `config.toml` if present.
    pub fn open(data_folder: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let data_folder = data_folder.into();
        let config = TomlConfig::load(&data_folder.join(CONFIG_FILE))?;
        Ok(Self::with_config(data_folder, config))
    }

    pub fn with_config(data_folder: impl Into<PathBuf>, config: TomlConfig) -> Self {
        let use_native = config
            .get_string(PACKAGING_KEY)
            .is_some_and(|p| NATIVE_PACKAGINGS.contains(&p.as_str()));
        Self {
            data_folder: data_folder.into(),
            config,
            class_path: ClassPath::new(),
            native: NativeLibraries::new(),
            use_native,
        }
    }

    /// `<data dir>/kload`, falling back to the working directory.
    pub fn default_data_folder() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kload")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_folder.join(CONFIG_FILE)
    }

    pub fn cache_folder(&self) -> PathBuf {
        self.data_folder.join(LIBRARIES_DIR)
    }

    pub fn class_path(&self) -> &ClassPath {
        &self.class_path
    }

    pub fn native_libraries(&self) -> &NativeLibraries {
        &self.native
    }

    /// Whether artifacts are linked as shared libraries.
    pub fn is_native(&self) -> bool {
        self.use_native
    }
}

impl Host for StandaloneHost {
    fn config(&self) -> &dyn ConfigStore {
        &self.config
    }

    fn data_folder(&self) -> &Path {
        &self.data_folder
    }

    fn link_target(&self) -> &dyn LinkTarget {
        if self.use_native {
            &self.native
        } else {
            &self.class_path
        }
    }
}
