//! The patch session: backup, parse, apply, write.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backup::{self, BackupStore};
use crate::buffer::LineBuffer;
use crate::config::PatcherConfig;
use crate::diff;
use crate::error::{PatchError, PatchResult};
use crate::models::{ApplyResult, Change, PatchOutcome, PatchPreview};
use crate::parser::SuggestionParser;

/// Applies AI-suggested code blocks to files.
///
/// Callers must serialize sessions on the same path; nothing here locks.
#[derive(Debug, Clone)]
pub struct CodePatcher {
    config: PatcherConfig,
    backups: BackupStore,
    parser: SuggestionParser,
}

impl Default for CodePatcher {
    fn default() -> Self {
        Self::new(PatcherConfig::default())
    }
}

impl CodePatcher {
    pub fn new(config: PatcherConfig) -> Self {
        let backups = BackupStore::new(config.backup_dir.clone());
        let parser = SuggestionParser::new(config.pairing);
        Self {
            config,
            backups,
            parser,
        }
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Resolve the changes described by annotated suggestion text.
    pub fn parse_suggestions(&self, annotated: &str) -> Vec<Change> {
        self.parser.parse(annotated)
    }

    /// Apply the changes found in `annotated` to `file_path`.
    ///
    /// A backup is always written first, even when nothing ends up applied.
    /// Failures never escape: they are reported in the outcome.
    pub fn apply_targeted_changes(&self, file_path: &Path, annotated: &str) -> PatchOutcome {
        info!("Applying targeted changes to {:?}", file_path);

        let backup_path = match self.backups.create(file_path) {
            Ok(path) => path,
            Err(e) => {
                return PatchOutcome::failure(format!("Error applying changes: {}", e), None);
            }
        };

        match self.run_session(file_path, annotated) {
            Ok(applied_changes) => PatchOutcome {
                success: true,
                applied_changes,
                backup_path: Some(backup_path),
                error: None,
            },
            Err(SessionError { error, results }) => {
                let message = match &error {
                    PatchError::NoChanges | PatchError::NothingApplied => error.to_string(),
                    _ => format!("Error applying changes: {}", error),
                };
                PatchOutcome {
                    success: false,
                    applied_changes: results,
                    backup_path: Some(backup_path),
                    error: Some(message),
                }
            }
        }
    }

    /// Compute what `apply_targeted_changes` would do, without backups or writes.
    pub fn preview_targeted_changes(&self, file_path: &Path, annotated: &str) -> PatchResult<PatchPreview> {
        let original = read_source(file_path)?;
        let changes = self.parser.parse(annotated);
        if changes.is_empty() {
            return Err(PatchError::NoChanges);
        }

        let (buffer, results) = apply_all(LineBuffer::from_text(&original), &changes);
        let modified = buffer.to_text();
        Ok(PatchPreview {
            diff: diff::unified_diff(&original, &modified, self.config.diff_context),
            changes: results,
            modified,
        })
    }

    /// Unified diff between two line sequences, using the configured context.
    pub fn create_diff_preview(&self, original: &[String], modified: &[String]) -> String {
        diff::create_diff_preview(original, modified, self.config.diff_context)
    }

    /// Overwrite `target` with `backup`. Returns false on failure.
    pub fn restore_backup(&self, backup: &Path, target: &Path) -> bool {
        backup::restore_backup(backup, target)
    }

    /// Restore `target` from its newest backup, returning the backup used.
    pub fn restore_latest(&self, target: &Path) -> PatchResult<Option<PathBuf>> {
        let Some(latest) = self.backups.latest_backup(target)? else {
            return Ok(None);
        };
        if backup::restore_backup(&latest, target) {
            Ok(Some(latest))
        } else {
            Err(PatchError::Io(std::io::Error::other(format!(
                "could not restore {:?} from {:?}",
                target, latest
            ))))
        }
    }

    fn run_session(&self, file_path: &Path, annotated: &str) -> Result<Vec<ApplyResult>, SessionError> {
        let changes = self.parser.parse(annotated);
        if changes.is_empty() {
            warn!("No valid changes found in suggestions for {:?}", file_path);
            return Err(PatchError::NoChanges.into());
        }

        let original = read_source(file_path)?;
        let (buffer, results) = apply_all(LineBuffer::from_text(&original), &changes);

        if !results.iter().any(|r| r.success) {
            return Err(SessionError {
                error: PatchError::NothingApplied,
                results,
            });
        }

        if let Err(e) = backup::write_atomic(file_path, buffer.to_text().as_bytes()) {
            return Err(SessionError { error: e, results });
        }
        info!(
            "Applied {}/{} change(s) to {:?}",
            results.iter().filter(|r| r.success).count(),
            results.len(),
            file_path
        );
        Ok(results)
    }
}

/// Session failure, with whatever per-change results exist so far.
struct SessionError {
    error: PatchError,
    results: Vec<ApplyResult>,
}

impl From<PatchError> for SessionError {
    fn from(error: PatchError) -> Self {
        Self {
            error,
            results: Vec::new(),
        }
    }
}

fn read_source(path: &Path) -> PatchResult<String> {
    if !path.is_file() {
        return Err(PatchError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Apply changes in order, continuing past failures.
fn apply_all(mut buffer: LineBuffer, changes: &[Change]) -> (LineBuffer, Vec<ApplyResult>) {
    let mut results = Vec::with_capacity(changes.len());
    for change in changes {
        match buffer.apply(change) {
            Ok(range) => {
                debug!("Applied {} at {}..{}", change.intent, range.start, range.end);
                results.push(ApplyResult::applied(change.intent.clone(), range));
            }
            Err(e) => {
                warn!("Failed to apply change ({}): {}", change.intent, e);
                results.push(ApplyResult::failed(change.intent.clone(), e.to_string()));
            }
        }
    }
    (buffer, results)
}
