use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::IndexerOptions;

pub const CONFIG_VERSION: u32 = 1;
const CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub version: u32,
    pub music_folders: Vec<String>,
    pub scan_files: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            music_folders: Vec::new(),
            scan_files: true,
        }
    }
}

impl CatalogConfig {
    pub fn indexer_options(&self) -> IndexerOptions {
        IndexerOptions {
            scan_files: self.scan_files,
        }
    }

    /// Upgrades old versions and drops blank or repeated folders.
    fn normalize(&mut self) {
        self.version = self.version.max(CONFIG_VERSION);
        let mut folders: Vec<String> = Vec::with_capacity(self.music_folders.len());
        for folder in self.music_folders.drain(..) {
            let folder = folder.trim();
            if !folder.is_empty() && !folders.iter().any(|known| known == folder) {
                folders.push(folder.to_string());
            }
        }
        self.music_folders = folders;
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config file not accessible: {}", err),
            ConfigError::Yaml(err) => write!(f, "config file not valid yaml: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

/// `CATALOG_CONFIG` when set, else `config.yaml` next to the running binary.
pub fn config_path_from_env() -> PathBuf {
    env::var("CATALOG_CONFIG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)))
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
        })
}

/// Loads the config, writing defaults first when the file does not exist.
/// The flag is true when a new file was created.
pub fn load_or_create_config(path: &Path) -> Result<(CatalogConfig, bool), ConfigError> {
    if !path.exists() {
        let config = CatalogConfig::default();
        save_config(path, &config)?;
        return Ok((config, true));
    }

    let mut config: CatalogConfig = serde_yaml::from_str(&fs::read_to_string(path)?)?;
    config.normalize();
    Ok((config, false))
}

pub fn save_config(path: &Path, config: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_yaml::to_string(config)?)?;
    Ok(())
}

/// Relative folders are taken from the directory holding the config file.
pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let folder = Path::new(value);
    if folder.is_absolute() {
        return folder.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(folder),
        _ => Path::new(".").join(folder),
    }
}

pub fn resolve_music_folders(config_path: &Path, config: &CatalogConfig) -> Vec<PathBuf> {
    config
        .music_folders
        .iter()
        .map(|folder| resolve_path(config_path, folder))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.yaml");

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert_eq!(config, CatalogConfig::default());
        assert!(path.exists());

        let (again, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(again, config);
    }

    #[test]
    fn normalizes_folders_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "version: 0\nmusic_folders:\n  - ' music '\n  - ''\n  - music\n  - /srv/audio\nscan_files: false\n",
        )
        .unwrap();

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.music_folders, vec!["music", "/srv/audio"]);
        assert!(!config.indexer_options().scan_files);

        let folders = resolve_music_folders(&path, &config);
        assert_eq!(folders[0], dir.path().join("music"));
        assert_eq!(folders[1], PathBuf::from("/srv/audio"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "music_folders: [unterminated").unwrap();
        assert!(matches!(
            load_or_create_config(&path),
            Err(ConfigError::Yaml(_))
        ));
    }
}
