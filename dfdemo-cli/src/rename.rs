//! Port of DemoCleaner3's `ExtClasses.FileHelper.renameFile` for Linux filesystems.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStatus {
    Renamed,
    AlreadyMatches,
    SkippedExisting,
    DeletedDuplicate,
}

impl RenameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenameStatus::Renamed => "renamed",
            RenameStatus::AlreadyMatches => "already_matches",
            RenameStatus::SkippedExisting => "skipped_existing",
            RenameStatus::DeletedDuplicate => "deleted_duplicate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub status: RenameStatus,
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Minimal logger interface used by the renamer.
pub trait Logger {
    fn log(&self, operation: &str, messages: &[&str]);
}

pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _operation: &str, _messages: &[&str]) {}
}

/// Append-only text logger mirroring DemoCleaner3's log structure.
pub struct FileLogger {
    path: PathBuf,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }
}

impl Logger for FileLogger {
    fn log(&self, operation: &str, messages: &[&str]) {
        let handle = fs::OpenOptions::new().create(true).append(true).open(&self.path);
        let mut handle = match handle {
            Ok(h) => h,
            Err(err) => {
                tracing::warn!(%err, "failed to open rename log");
                return;
            }
        };
        let _ = writeln!(handle, "{operation}");
        for (idx, message) in messages.iter().enumerate() {
            let _ = writeln!(handle, "  arg{}: {}", idx + 1, message);
        }
        let _ = writeln!(handle, "-------------------------------");
    }
}

/// Port of `FileRenamer`. Retries once after widening permissions on a
/// `PermissionDenied` error, matching `renamer.py`'s `_try_operate`/`_ensure_writable`.
pub struct FileRenamer {
    pub logger: Box<dyn Logger>,
    pub count_move_files: u64,
    pub count_delete_files: u64,
}

impl Default for FileRenamer {
    fn default() -> Self {
        Self::new(Box::new(NullLogger))
    }
}

impl FileRenamer {
    pub fn new(logger: Box<dyn Logger>) -> Self {
        Self {
            logger,
            count_move_files: 0,
            count_delete_files: 0,
        }
    }

    pub fn rename_file(&mut self, file_path: impl AsRef<Path>, new_name: &str, delete_identical: bool) -> Result<RenameOutcome> {
        let source = file_path.as_ref().to_path_buf();
        if !source.exists() {
            bail!("File not found: {}", source.display());
        }
        if Path::new(new_name).file_name().and_then(|n| n.to_str()) != Some(new_name) {
            bail!("new_name must be a file name, not a path.");
        }

        let target = source.with_file_name(new_name);
        let source_lower = source.to_string_lossy().to_lowercase();
        let target_lower = target.to_string_lossy().to_lowercase();

        if source_lower != target_lower {
            if target.exists() {
                if delete_identical {
                    self.delete_file(&source)?;
                    return Ok(RenameOutcome { status: RenameStatus::DeletedDuplicate, source, target });
                }
                return Ok(RenameOutcome { status: RenameStatus::SkippedExisting, source, target });
            }
            self.move_file(&source, &target)?;
            return Ok(RenameOutcome { status: RenameStatus::Renamed, source, target });
        }

        if source != target {
            self.move_file(&source, &target)?;
            return Ok(RenameOutcome { status: RenameStatus::Renamed, source, target });
        }

        Ok(RenameOutcome { status: RenameStatus::AlreadyMatches, source, target })
    }

    fn delete_file(&mut self, path: &Path) -> Result<()> {
        try_operate(path, || fs::remove_file(path))?;
        self.count_delete_files += 1;
        self.logger.log("DeleteFile", &[&path.display().to_string()]);
        Ok(())
    }

    fn move_file(&mut self, source: &Path, target: &Path) -> Result<()> {
        try_operate(source, || fs::rename(source, target))?;
        self.count_move_files += 1;
        self.logger
            .log("RenameFile", &[&source.display().to_string(), &target.display().to_string()]);
        Ok(())
    }
}

fn try_operate(path: &Path, operation: impl Fn() -> std::io::Result<()>) -> Result<()> {
    match operation() {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            ensure_writable(path);
            Ok(operation()?)
        }
        Err(err) => Err(err.into()),
    }
}

fn ensure_writable(path: &Path) {
    let Ok(metadata) = fs::metadata(path) else { return };
    let mut perms = metadata.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o222);
    }
    let _ = fs::set_permissions(path, perms);
}

/// Parses `file_path` and returns the suggested bare filename, or `None` if the demo
/// failed to parse or the reconstructed run came back with an error.
pub fn suggest_name(file_path: impl AsRef<Path>) -> Option<String> {
    let mut raw = dfdemo_core::parser::parse_demo_file(file_path).ok()?;
    let mut demo = dfdemo_core::naming::Demo::get_demo_from_raw_info(&mut raw);
    if demo.has_error {
        return None;
    }
    let name = demo.demo_new_name();
    Path::new(&name).file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_file_rejects_a_path_as_new_name() {
        let mut path = std::env::temp_dir();
        path.push("dfdemo-cli-rename-test-source.dm_68");
        std::fs::write(&path, b"demo").unwrap();
        let mut renamer = FileRenamer::default();
        let result = renamer.rename_file(&path, "some/dir/name.dm_68", false);
        assert!(result.is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rename_file_reports_already_matches_for_identical_name() {
        let mut path = std::env::temp_dir();
        path.push("dfdemo-cli-rename-test-identical.dm_68");
        std::fs::write(&path, b"demo").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let mut renamer = FileRenamer::default();
        let outcome = renamer.rename_file(&path, &name, false).unwrap();
        assert_eq!(outcome.status, RenameStatus::AlreadyMatches);
        std::fs::remove_file(&path).ok();
    }
}
