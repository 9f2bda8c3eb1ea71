//! CLI command definitions.
//!
//! Each subcommand is a thin wrapper over one `codepatch_core` operation.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use codepatch_core::{PairingPolicy, PatcherConfig};

pub mod apply;
pub mod backups;
pub mod extract;
pub mod preview;
pub mod restore;

/// codepatch - apply AI code suggestions to source files
#[derive(Parser)]
#[command(name = "codepatch")]
#[command(version, about = "codepatch - apply AI code suggestions to source files")]
#[command(long_about = r#"
codepatch reads an assistant reply that mixes instructions with fenced code
blocks ("Replace function load with:", "Change line 12 to:", ...) and applies
each block to the target file. A timestamped backup is written first.

COMMANDS:
  apply     → Back up the file and apply the suggested changes
  preview   → Show the unified diff without touching the file
  extract   → Print the code blocks and resolved changes as JSON
  restore   → Restore a file from a backup
  backups   → List backups of a file, newest first

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - No applicable changes
  4 - I/O error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ./codepatch.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backup directory, overrides the config file
    #[arg(long, global = true)]
    pub backup_dir: Option<PathBuf>,

    /// How instructions are paired with code blocks, overrides the config file
    #[arg(long, global = true, value_enum)]
    pub pairing: Option<PairingArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply suggested changes to a file
    Apply(apply::ApplyArgs),

    /// Preview suggested changes as a unified diff
    Preview(preview::PreviewArgs),

    /// Print extracted blocks and changes as JSON
    Extract(extract::ExtractArgs),

    /// Restore a file from a backup
    Restore(restore::RestoreArgs),

    /// List backups of a file
    Backups(backups::BackupsArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PairingArg {
    /// First instruction in the reply applies to every block
    FirstMatch,
    /// Each block uses the instruction right before it
    NearestPreceding,
}

impl From<PairingArg> for PairingPolicy {
    fn from(arg: PairingArg) -> Self {
        match arg {
            PairingArg::FirstMatch => PairingPolicy::FirstMatch,
            PairingArg::NearestPreceding => PairingPolicy::NearestPreceding,
        }
    }
}

impl Cli {
    /// Resolve the patcher configuration from file and flags.
    pub fn patcher_config(&self) -> Result<PatcherConfig> {
        let mut config = match &self.config {
            Some(path) => PatcherConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => {
                let current_dir = std::env::current_dir()?;
                PatcherConfig::discover(&current_dir).context("Failed to load codepatch.yaml")?
            }
        };

        if let Some(dir) = &self.backup_dir {
            config = config.backup_dir(dir);
        }
        if let Some(pairing) = self.pairing {
            config = config.pairing(pairing.into());
        }
        debug!("Using config: {:?}", config);
        Ok(config)
    }
}

/// Read suggestion text from a file, or stdin for `-`.
pub fn read_suggestions(source: &Path) -> Result<String> {
    if source.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read suggestions from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(source).with_context(|| format!("Failed to read suggestions {:?}", source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "codepatch",
            "--backup-dir",
            "/tmp/bk",
            "--pairing",
            "nearest-preceding",
            "backups",
            "--file",
            "a.py",
        ]);
        let config = cli.patcher_config().unwrap();
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/bk"));
        assert_eq!(config.pairing, PairingPolicy::NearestPreceding);
    }

    #[test]
    fn test_read_suggestions_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("reply.md");
        fs::write(&path, "Change line 1 to:\n```\nx\n```").unwrap();
        assert!(read_suggestions(&path).unwrap().starts_with("Change line 1"));
    }
}
