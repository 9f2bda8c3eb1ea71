//! Timestamped backups and atomic file replacement.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use regex::Regex;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{PatchError, PatchResult};

/// Timestamp format used in backup file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Directory of `<stem>_<YYYYMMDD_HHMMSS><suffix>` copies.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `file` into the backup directory, creating the directory if needed.
    ///
    /// A backup made in the same second as an earlier one overwrites it.
    pub fn create(&self, file: &Path) -> PatchResult<PathBuf> {
        if !file.is_file() {
            return Err(PatchError::FileNotFound(file.to_path_buf()));
        }
        fs::create_dir_all(&self.dir)?;

        let backup_path = self.dir.join(backup_name(file, Local::now()));
        fs::copy(file, &backup_path)?;
        info!("Backup created: {:?}", backup_path);
        Ok(backup_path)
    }

    /// Backups of `file` in this store, newest first.
    pub fn list_backups(&self, file: &Path) -> PatchResult<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let (stem, suffix) = stem_and_suffix(file);
        let pattern = Regex::new(&format!(
            r"^{}_\d{{8}}_\d{{6}}{}$",
            regex::escape(&stem),
            regex::escape(&suffix)
        ))?;

        let mut backups: Vec<PathBuf> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| pattern.is_match(&e.file_name().to_string_lossy()))
            .map(|e| e.into_path())
            .collect();

        // Same stem and suffix, so name order is timestamp order.
        backups.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        debug!("Found {} backup(s) for {:?}", backups.len(), file);
        Ok(backups)
    }

    pub fn latest_backup(&self, file: &Path) -> PatchResult<Option<PathBuf>> {
        Ok(self.list_backups(file)?.into_iter().next())
    }
}

/// Backup file name for `file` taken at `at`.
pub fn backup_name(file: &Path, at: DateTime<Local>) -> String {
    let (stem, suffix) = stem_and_suffix(file);
    format!("{}_{}{}", stem, at.format(TIMESTAMP_FORMAT), suffix)
}

fn stem_and_suffix(file: &Path) -> (String, String) {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

/// Overwrite `target` with the contents of `backup`.
///
/// Returns false and logs on any I/O failure.
pub fn restore_backup(backup: &Path, target: &Path) -> bool {
    let result = fs::read(backup)
        .map_err(PatchError::from)
        .and_then(|content| write_atomic(target, &content));

    match result {
        Ok(()) => {
            info!("Restored {:?} from {:?}", target, backup);
            true
        }
        Err(e) => {
            error!("Error restoring backup {:?}: {}", backup, e);
            false
        }
    }
}

/// Replace `path` with `content` via a temp file next to the real file.
///
/// Symlinks are followed, so the link stays in place and its target is
/// rewritten. Readers see either the old or the new content, never a partial
/// write. An existing read-only file is refused; otherwise its permissions
/// are carried over.
pub fn write_atomic(path: &Path, content: &[u8]) -> PatchResult<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let metadata = fs::metadata(&target).ok();
    if let Some(metadata) = &metadata {
        if metadata.permissions().readonly() {
            return Err(PatchError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is read-only", target.display()),
            )));
        }
    }

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    if let Some(metadata) = metadata {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.persist(&target).map_err(|e| PatchError::Io(e.error))?;
    debug!("Wrote {} bytes to {:?}", content.len(), target);
    Ok(())
}
