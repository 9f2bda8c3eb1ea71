//! Apply command - Back up a file and apply suggested changes.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use codepatch_core::{CodePatcher, PatchOutcome};

use super::{read_suggestions, Cli};

#[derive(Args)]
pub struct ApplyArgs {
    /// File to patch
    #[arg(short, long)]
    file: PathBuf,

    /// File holding the assistant reply, `-` for stdin
    #[arg(short, long, default_value = "-")]
    suggestions: PathBuf,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(cli: &Cli, args: &ApplyArgs) -> Result<()> {
    info!("Applying suggestions to {:?}", args.file);

    let text = read_suggestions(&args.suggestions)?;
    let patcher = CodePatcher::new(cli.patcher_config()?);
    let outcome = patcher.apply_targeted_changes(&args.file, &text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if !cli.quiet {
        if let Some(backup) = &outcome.backup_path {
            println!("📁 Backup created: {}", backup.display());
        }
        if outcome.success {
            println!(
                "✅ Changes applied: {} ({})",
                outcome.applied_count(),
                applied_kinds(&outcome)
            );
        }
        for (i, result) in outcome.applied_changes.iter().enumerate() {
            match &result.error {
                None => println!("   {}. ✅ {}", i + 1, result.intent),
                Some(error) => println!("   {}. ⚠️  {} ({})", i + 1, result.intent, error),
            }
        }
    }

    match (outcome.success, outcome.error) {
        (true, _) => Ok(()),
        (false, Some(error)) => anyhow::bail!(error),
        (false, None) => anyhow::bail!("No changes could be applied"),
    }
}

/// Kinds of the applied changes, in order and without repeats.
fn applied_kinds(outcome: &PatchOutcome) -> String {
    let mut kinds: Vec<&str> = Vec::new();
    for result in outcome.applied_changes.iter().filter(|r| r.success) {
        let kind = result.intent.kind();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepatch_core::{ApplyResult, ChangeIntent, ChangedRange};

    #[test]
    fn test_applied_kinds_skips_failures_and_repeats() {
        let outcome = PatchOutcome {
            success: true,
            applied_changes: vec![
                ApplyResult::applied(ChangeIntent::LineReplace { line: 1 }, ChangedRange::new(0, 1)),
                ApplyResult::failed(
                    ChangeIntent::FunctionReplace { name: "f".into() },
                    "Function f not found",
                ),
                ApplyResult::applied(ChangeIntent::InsertAfter { line: 2 }, ChangedRange::new(2, 2)),
                ApplyResult::applied(ChangeIntent::LineReplace { line: 3 }, ChangedRange::new(2, 3)),
            ],
            backup_path: None,
            error: None,
        };

        assert_eq!(applied_kinds(&outcome), "line_replace, insert_after");
    }
}
