//! Patcher configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PatchError, PatchResult};

/// Default directory for backups, relative to the working directory.
pub const DEFAULT_BACKUP_DIR: &str = ".code_analyzer_backups";

/// Default config file name looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "codepatch.yaml";

/// How instruction phrases are associated with code blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingPolicy {
    /// The first matching phrase anywhere in the text applies to every block.
    #[default]
    FirstMatch,
    /// Each block takes the phrase that ends closest before its opening fence.
    NearestPreceding,
}

/// Configuration for a [`CodePatcher`](crate::CodePatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Directory that receives timestamped backups
    pub backup_dir: PathBuf,
    /// Instruction-to-block pairing
    pub pairing: PairingPolicy,
    /// Context lines in diff previews
    pub diff_context: usize,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            pairing: PairingPolicy::default(),
            diff_context: 3,
        }
    }
}

impl PatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    pub fn pairing(mut self, pairing: PairingPolicy) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn diff_context(mut self, lines: usize) -> Self {
        self.diff_context = lines;
        self
    }

    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> PatchResult<Self> {
        debug!("Loading patcher config from {:?}", path);
        if !path.exists() {
            return Err(PatchError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: PatcherConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `codepatch.yaml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> PatchResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> PatchResult<()> {
        if self.backup_dir.as_os_str().is_empty() {
            return Err(PatchError::InvalidConfig("backup_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PatcherConfig::default();
        assert_eq!(config.backup_dir, PathBuf::from(DEFAULT_BACKUP_DIR));
        assert_eq!(config.pairing, PairingPolicy::FirstMatch);
        assert_eq!(config.diff_context, 3);
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "pairing: nearest_preceding\n").unwrap();

        let config = PatcherConfig::load(&path).unwrap();
        assert_eq!(config.pairing, PairingPolicy::NearestPreceding);
        assert_eq!(config.backup_dir, PathBuf::from(DEFAULT_BACKUP_DIR));
    }

    #[test]
    fn test_empty_backup_dir_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "backup_dir: ''\n").unwrap();

        assert!(matches!(
            PatcherConfig::load(&path),
            Err(PatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_discover_without_file() {
        let temp = tempdir().unwrap();
        let config = PatcherConfig::discover(temp.path()).unwrap();
        assert_eq!(config, PatcherConfig::default());
    }
}
