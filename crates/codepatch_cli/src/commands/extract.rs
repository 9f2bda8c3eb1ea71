//! Extract command - Show how a reply is parsed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use codepatch_core::{Change, SuggestionBlock, SuggestionParser};

use super::{read_suggestions, Cli};

#[derive(Args)]
pub struct ExtractArgs {
    /// File holding the assistant reply, `-` for stdin
    #[arg(short, long, default_value = "-")]
    suggestions: PathBuf,
}

#[derive(Serialize)]
struct Extraction {
    blocks: Vec<SuggestionBlock>,
    changes: Vec<Change>,
}

pub fn execute(cli: &Cli, args: &ExtractArgs) -> Result<()> {
    let text = read_suggestions(&args.suggestions)?;
    let config = cli.patcher_config()?;

    let extraction = Extraction {
        blocks: SuggestionParser::extract_blocks(&text),
        changes: SuggestionParser::new(config.pairing).parse(&text),
    };
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}
