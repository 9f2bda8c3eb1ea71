//! Preview command - Show what apply would change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use codepatch_core::CodePatcher;

use super::{read_suggestions, Cli};

#[derive(Args)]
pub struct PreviewArgs {
    /// File the suggestions target
    #[arg(short, long)]
    file: PathBuf,

    /// File holding the assistant reply, `-` for stdin
    #[arg(short, long, default_value = "-")]
    suggestions: PathBuf,
}

pub fn execute(cli: &Cli, args: &PreviewArgs) -> Result<()> {
    let text = read_suggestions(&args.suggestions)?;
    let patcher = CodePatcher::new(cli.patcher_config()?);
    let preview = patcher
        .preview_targeted_changes(&args.file, &text)
        .with_context(|| format!("Failed to preview changes for {:?}", args.file))?;

    for result in preview.changes.iter().filter(|r| !r.success) {
        eprintln!("⚠️  {} ({})", result.intent, result.error.as_deref().unwrap_or("failed"));
    }

    if !preview.has_changes() {
        anyhow::bail!("No changes could be applied");
    }
    print!("{}", preview.diff);
    Ok(())
}
