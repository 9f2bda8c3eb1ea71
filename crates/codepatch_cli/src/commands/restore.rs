//! Restore command - Put a backup back in place.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use codepatch_core::CodePatcher;

use super::Cli;

#[derive(Args)]
pub struct RestoreArgs {
    /// File to restore
    #[arg(short, long)]
    file: PathBuf,

    /// Backup to restore from
    #[arg(short, long, conflicts_with = "latest", required_unless_present = "latest")]
    backup: Option<PathBuf>,

    /// Use the newest backup of the file
    #[arg(long)]
    latest: bool,
}

pub fn execute(cli: &Cli, args: &RestoreArgs) -> Result<()> {
    let patcher = CodePatcher::new(cli.patcher_config()?);

    let backup = match &args.backup {
        Some(backup) => {
            if !patcher.restore_backup(backup, &args.file) {
                anyhow::bail!("IO error: could not restore {:?} from {:?}", args.file, backup);
            }
            backup.clone()
        }
        None => patcher.restore_latest(&args.file)?.ok_or_else(|| {
            anyhow::anyhow!(
                "No backup found for {:?} in {:?}",
                args.file,
                patcher.backups().dir()
            )
        })?,
    };

    info!("Restored {:?} from {:?}", args.file, backup);
    if !cli.quiet {
        println!("✅ Restored {} from {}", args.file.display(), backup.display());
    }
    Ok(())
}
