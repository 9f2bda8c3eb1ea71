//! # codepatch_core
//!
//! Targeted patch engine for AI code suggestions.
//!
//! Takes a file and a block of annotated text (typically an assistant reply)
//! that mixes prose instructions with fenced code, works out where each code
//! block belongs, and splices it into the file:
//!
//! - **Function / class replacement**: locate a definition by name and replace
//!   it up to the end of its indented body
//! - **Line and range replacement**: 1-based lines, validated against the buffer
//! - **Insertion**: add a block after a given line
//! - **Backups**: timestamped copy written before any change, restorable later
//! - **Previews**: unified diff of what a session would change
//!
//! ## Example
//!
//! ```rust,no_run
//! use codepatch_core::{CodePatcher, PatcherConfig, PairingPolicy};
//! use std::path::Path;
//!
//! let config = PatcherConfig::new()
//!     .backup_dir(".code_analyzer_backups")
//!     .pairing(PairingPolicy::NearestPreceding);
//! let patcher = CodePatcher::new(config);
//!
//! let reply = "Change line 2 to:\n```\nhello\n```";
//! let outcome = patcher.apply_targeted_changes(Path::new("notes.txt"), reply);
//! if !outcome.success {
//!     eprintln!("Error: {}", outcome.error.unwrap_or_default());
//! }
//!
//! if let Some(backup) = outcome.backup_path {
//!     patcher.restore_backup(&backup, Path::new("notes.txt"));
//! }
//! ```

pub mod backup;
pub mod buffer;
pub mod config;
pub mod diff;
pub mod error;
pub mod models;
pub mod parser;
pub mod patcher;

pub use backup::{restore_backup, BackupStore};
pub use buffer::LineBuffer;
pub use config::{PairingPolicy, PatcherConfig, CONFIG_FILE_NAME, DEFAULT_BACKUP_DIR};
pub use diff::create_diff_preview;
pub use error::{PatchError, PatchResult};
pub use models::*;
pub use parser::SuggestionParser;
pub use patcher::CodePatcher;
