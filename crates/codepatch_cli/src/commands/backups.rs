//! Backups command - List backups of a file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use codepatch_core::CodePatcher;

use super::Cli;

#[derive(Args)]
pub struct BackupsArgs {
    /// File whose backups to list
    #[arg(short, long)]
    file: PathBuf,
}

pub fn execute(cli: &Cli, args: &BackupsArgs) -> Result<()> {
    let patcher = CodePatcher::new(cli.patcher_config()?);
    let backups = patcher.backups().list_backups(&args.file)?;

    if backups.is_empty() {
        if !cli.quiet {
            println!("No backups of {} in {}", args.file.display(), patcher.backups().dir().display());
        }
        return Ok(());
    }
    for backup in backups {
        println!("{}", backup.display());
    }
    Ok(())
}
