use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::fs;
use tokio::sync::Mutex;
use walkdir::WalkDir;

use crate::protocol::{FileNode, FlatEntry, NodeKind, StorageError};
use crate::tree;

use super::config::DocsConfig;
use super::path_utils;
use super::security::PathValidator;
use super::text;

/// Reads and writes beneath the docs root. Every path goes through the
/// [`PathValidator`] first.
#[derive(Clone)]
pub struct DocsStorage {
    validator: Arc<PathValidator>,
    config: Arc<DocsConfig>,
    write_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl DocsStorage {
    pub fn new(validator: Arc<PathValidator>, config: Arc<DocsConfig>) -> Self {
        Self {
            validator,
            config,
            write_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    /// Recursively list the docs root as a sorted tree. Hidden entries (and
    /// everything beneath a hidden folder) are skipped. A missing root is
    /// not an error: it lists as empty.
    pub async fn list(&self) -> Result<Vec<FileNode>, StorageError> {
        let root = self.config.root.clone();
        if !root.exists() {
            tracing::warn!("Docs root {} does not exist", root.display());
            return Ok(Vec::new());
        }

        let hidden_prefix = self.config.hidden_prefix.clone();
        let follow_symlinks = self.config.follow_symlinks;
        let entries = tokio::task::spawn_blocking(move || {
            collect_entries(&root, &hidden_prefix, follow_symlinks)
        })
        .await
        .map_err(|e| StorageError::Io {
            message: format!("listing task failed: {}", e),
        })?;

        Ok(tree::build_tree(entries))
    }

    /// Read a file as text. A missing file reads as `""`.
    pub async fn read_content(&self, path: &str) -> Result<String, StorageError> {
        let (relative, full) = self.validator.resolve(path)?;
        if !full.exists() {
            return Ok(String::new());
        }
        if full.is_dir() {
            return Err(StorageError::NotAFile { path: relative });
        }
        let bytes = fs::read(&full).await?;
        Ok(text::decode_lossy(&bytes))
    }

    /// Read a file for search. `None` when the file is missing or does not
    /// look like text.
    pub async fn read_text(&self, path: &str) -> Result<Option<String>, StorageError> {
        let (relative, full) = self.validator.resolve(path)?;
        if !full.exists() {
            return Ok(None);
        }
        if full.is_dir() {
            return Err(StorageError::NotAFile { path: relative });
        }
        let bytes = fs::read(&full).await?;
        if !text::is_probably_text(&bytes) {
            return Ok(None);
        }
        Ok(Some(text::decode_lossy(&bytes)))
    }

    pub async fn exists(&self, path: &str) -> Result<Option<NodeKind>, StorageError> {
        let (_, full) = self.validator.resolve(path)?;
        Ok(match fs::metadata(&full).await {
            Ok(meta) if meta.is_dir() => Some(NodeKind::Folder),
            Ok(_) => Some(NodeKind::File),
            Err(_) => None,
        })
    }

    /// Write `content` to `path`, creating parent folders and overwriting an
    /// existing file. Returns the normalized relative path.
    pub async fn write(&self, path: &str, content: &str) -> Result<String, StorageError> {
        let (relative, full) = self.validator.resolve(path)?;

        let size = content.len() as u64;
        if size > self.config.max_write_size {
            return Err(StorageError::FileTooLarge {
                path: relative,
                size,
                max_size: self.config.max_write_size,
            });
        }

        let lock = self
            .write_locks
            .entry(relative.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.write_locked(&relative, &full, content).await
        };
        drop(lock);
        // Drop the entry once nobody else is queued on it.
        self.write_locks
            .remove_if(&relative, |_, lock| Arc::strong_count(lock) == 1);

        result.map(|()| relative)
    }

    async fn write_locked(
        &self,
        relative: &str,
        full: &Path,
        content: &str,
    ) -> Result<(), StorageError> {
        if full.is_dir() {
            return Err(StorageError::NotAFile {
                path: relative.to_string(),
            });
        }

        path_utils::create_parent_dirs_safe(&self.config.root, full).await?;
        // Parents may have been created just now; recheck containment.
        self.validator.resolve(relative)?;

        let temp_path = path_utils::sibling_temp_path(full);
        if let Err(e) = fs::write(&temp_path, content.as_bytes()).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, full).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io {
                message: format!("Failed to move temp file into place: {}", e),
            });
        }

        tracing::debug!("Wrote {} ({} bytes)", relative, content.len());
        Ok(())
    }

    /// Delete a file, or a folder with everything beneath it.
    pub async fn delete(&self, path: &str) -> Result<String, StorageError> {
        let (relative, full) = self.validator.resolve(path)?;
        let meta = match fs::symlink_metadata(&full).await {
            Ok(meta) => meta,
            Err(_) => return Err(StorageError::NotFound { path: relative }),
        };

        if meta.is_dir() {
            fs::remove_dir_all(&full).await?;
        } else {
            fs::remove_file(&full).await?;
        }
        tracing::info!("Deleted {}", relative);
        Ok(relative)
    }

    /// Create a folder and any missing parents. Returns `false` when the
    /// folder already existed.
    pub async fn create_folder(&self, path: &str) -> Result<bool, StorageError> {
        let (relative, full) = self.validator.resolve(path)?;
        if full.is_dir() {
            return Ok(false);
        }
        if full.exists() {
            return Err(StorageError::AlreadyExists { path: relative });
        }

        path_utils::validate_parent_components(&self.config.root, &full)?;
        fs::create_dir_all(&full).await?;
        self.validator.resolve(&relative)?;
        Ok(true)
    }

    /// Create a new file; anything already at `path` is a conflict.
    pub async fn create_file(&self, path: &str, content: &str) -> Result<String, StorageError> {
        let (relative, full) = self.validator.resolve(path)?;
        if full.exists() {
            return Err(StorageError::AlreadyExists { path: relative });
        }
        self.write(&relative, content).await
    }
}

fn collect_entries(root: &Path, hidden_prefix: &str, follow_symlinks: bool) -> Vec<FlatEntry> {
    let is_hidden = |name: &str| !hidden_prefix.is_empty() && name.starts_with(hidden_prefix);

    WalkDir::new(root)
        .min_depth(1)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_entry(|entry| !is_hidden(&entry.file_name().to_string_lossy()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter_map(|entry| {
            let relative: PathBuf = entry.path().strip_prefix(root).ok()?.to_path_buf();
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                NodeKind::Folder
            } else if file_type.is_file() {
                NodeKind::File
            } else {
                return None;
            };
            Some(FlatEntry {
                id: tree::path_id(&path),
                path,
                kind,
                size: None,
            })
        })
        .collect()
}
