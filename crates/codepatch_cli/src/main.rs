//! codepatch CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: No applicable changes
//! - 4: I/O error

use std::process::ExitCode;

use clap::Parser;
use codepatch_core::PatchError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const NO_CHANGES: u8 = 3;
    pub const IO_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match &cli.command {
        Commands::Apply(args) => commands::apply::execute(&cli, args),
        Commands::Preview(args) => commands::preview::execute(&cli, args),
        Commands::Extract(args) => commands::extract::execute(&cli, args),
        Commands::Restore(args) => commands::restore::execute(&cli, args),
        Commands::Backups(args) => commands::backups::execute(&cli, args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "codepatch=debug"
    } else if cli.quiet {
        "codepatch=warn"
    } else {
        "codepatch=info"
    };

    // Target prefix covers codepatch_core and codepatch_cli
    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Already initialized is fine
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Categorize error to determine exit code.
///
/// Typed causes from the core win. Otherwise only the leading words of the
/// top-level message count, so paths inside it cannot change the category.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<PatchError>() {
            return match err {
                PatchError::NoChanges | PatchError::NothingApplied => ExitCodes::NO_CHANGES,
                PatchError::InvalidConfig(_) | PatchError::Yaml(_) => ExitCodes::INVALID_ARGS,
                PatchError::FileNotFound(_) | PatchError::Io(_) => ExitCodes::IO_ERROR,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return ExitCodes::IO_ERROR;
        }
    }

    // Outcome errors from apply arrive as plain strings.
    let msg = e.to_string().to_lowercase();
    let msg = msg.strip_prefix("error applying changes: ").unwrap_or(&msg);
    if msg.starts_with("no valid changes") || msg.starts_with("no changes could be applied") {
        ExitCodes::NO_CHANGES
    } else if msg.starts_with("invalid configuration") || msg.starts_with("yaml error") {
        ExitCodes::INVALID_ARGS
    } else if msg.starts_with("file not found") || msg.starts_with("io error") {
        ExitCodes::IO_ERROR
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
