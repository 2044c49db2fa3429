//! Directory-wide rename with MD5-based dedup, porting `original_source`'s
//! `BatchDemoRenamer.py`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use md5::{Digest, Md5};

use crate::rename::{suggest_name, FileRenamer, RenameStatus};

pub const DEMO_EXTENSIONS: &[&str] = &["dm_68", "dm_67", "dm_66"];

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchStats {
    pub processed: u64,
    pub renamed: u64,
    pub already_named: u64,
    pub identical_deleted: u64,
    pub conflicts: u64,
    pub errors: u64,
}

fn calculate_md5(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut hasher = Md5::new();
    hasher.update(&data);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Removes identical files (same MD5 hash), keeping the oldest by modification time.
fn deduplicate_by_md5(demo_files: Vec<PathBuf>) -> Vec<PathBuf> {
    tracing::info!("deduplicating identical files by md5");
    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for file in demo_files {
        match calculate_md5(&file) {
            Ok(hash) => groups.entry(hash).or_default().push(file),
            Err(err) => tracing::warn!(%err, file = %file.display(), "failed to hash demo"),
        }
    }

    let mut remaining = Vec::new();
    let mut deleted_count = 0u64;
    for (_, mut identical) in groups {
        if identical.len() > 1 {
            identical.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).ok());
            let keep = identical.remove(0);
            for duplicate in identical {
                match fs::remove_file(&duplicate) {
                    Ok(()) => {
                        deleted_count += 1;
                        tracing::info!(file = %duplicate.display(), "deleted duplicate");
                    }
                    Err(err) => tracing::warn!(%err, file = %duplicate.display(), "failed to delete duplicate"),
                }
            }
            remaining.push(keep);
        } else {
            remaining.push(identical.remove(0));
        }
    }
    tracing::info!(deleted_count, "md5 deduplication complete");
    remaining
}

fn scan_demo_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ext in DEMO_EXTENSIONS {
        let pattern = directory.join(format!("*.{ext}"));
        for entry in glob::glob(&pattern.to_string_lossy())? {
            files.push(entry?);
        }
    }
    Ok(files)
}

fn move_to_conflicts(demo_file: &Path) -> Result<PathBuf> {
    let parent = demo_file.parent().unwrap_or_else(|| Path::new("."));
    let conflicts_dir = parent.join("_conflicts");
    fs::create_dir_all(&conflicts_dir)?;

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let stem = demo_file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = demo_file.extension().map(|s| s.to_string_lossy().into_owned());
    let conflict_name = match ext {
        Some(ext) => format!("{stem}_{timestamp}.{ext}"),
        None => format!("{stem}_{timestamp}"),
    };
    let conflict_path = conflicts_dir.join(conflict_name);
    fs::rename(demo_file, &conflict_path)?;
    Ok(conflict_path)
}

pub struct BatchDemoRenamer {
    renamer: FileRenamer,
}

impl Default for BatchDemoRenamer {
    fn default() -> Self {
        Self {
            renamer: FileRenamer::default(),
        }
    }
}

impl BatchDemoRenamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames a single already-deduplicated demo, routing name conflicts into
    /// `_conflicts/` (or skipping them) per `create_conflicts_dir`.
    fn rename_demo(&mut self, demo_file: &Path, suggested_name: &str, create_conflicts_dir: bool) -> &'static str {
        if demo_file.file_name().map(|n| n.to_string_lossy().to_lowercase()) == Some(suggested_name.to_lowercase()) {
            return "already_named";
        }

        match self.renamer.rename_file(demo_file, suggested_name, true) {
            Ok(outcome) => match outcome.status {
                RenameStatus::Renamed => "renamed",
                RenameStatus::AlreadyMatches => "already_named",
                RenameStatus::DeletedDuplicate => "identical_deleted",
                RenameStatus::SkippedExisting => {
                    if create_conflicts_dir {
                        match move_to_conflicts(demo_file) {
                            Ok(conflict_path) => {
                                tracing::info!(target = %conflict_path.display(), "name conflict moved aside");
                                "conflict_moved"
                            }
                            Err(err) => {
                                tracing::warn!(%err, "failed to move conflicting demo aside");
                                "error_renaming"
                            }
                        }
                    } else {
                        "name_conflict_skipped"
                    }
                }
            },
            Err(err) => {
                tracing::warn!(%err, file = %demo_file.display(), "failed to rename demo");
                "error_renaming"
            }
        }
    }

    pub fn process_directory(&mut self, directory: impl AsRef<Path>, create_conflicts_dir: bool) -> Result<BatchStats> {
        let directory = directory.as_ref();
        if !directory.exists() {
            anyhow::bail!("Directory not found: {}", directory.display());
        }

        let demo_files = scan_demo_files(directory)?;
        tracing::info!(count = demo_files.len(), directory = %directory.display(), "found demo files");

        let demo_files = deduplicate_by_md5(demo_files);
        tracing::info!(count = demo_files.len(), "unique files remaining after dedup");

        let mut stats = BatchStats::default();
        for demo_file in &demo_files {
            stats.processed += 1;

            let Some(suggested) = suggest_name(demo_file) else {
                tracing::warn!(file = %demo_file.display(), "could not parse demo");
                stats.errors += 1;
                continue;
            };

            match self.rename_demo(demo_file, &suggested, create_conflicts_dir) {
                "renamed" => {
                    stats.renamed += 1;
                    tracing::info!(file = %demo_file.display(), new_name = %suggested, "renamed");
                }
                "already_named" => stats.already_named += 1,
                "identical_deleted" => stats.identical_deleted += 1,
                "conflict_moved" | "name_conflict_skipped" => stats.conflicts += 1,
                _ => stats.errors += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_demo_files_only_matches_known_extensions() {
        let mut dir = std::env::temp_dir();
        dir.push("dfdemo-cli-batch-test-scan");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.dm_68"), b"x").unwrap();
        std::fs::write(dir.join("b.txt"), b"x").unwrap();

        let files = scan_demo_files(&dir).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.dm_68"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn deduplicate_by_md5_keeps_one_copy_of_identical_files() {
        let mut dir = std::env::temp_dir();
        dir.push("dfdemo-cli-batch-test-dedup");
        std::fs::create_dir_all(&dir).unwrap();
        let a = dir.join("a.dm_68");
        let b = dir.join("b.dm_68");
        std::fs::write(&a, b"same content").unwrap();
        std::fs::write(&b, b"same content").unwrap();

        let remaining = deduplicate_by_md5(vec![a, b]);
        assert_eq!(remaining.len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
