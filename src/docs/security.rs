use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use path_jail::Jail;

use crate::protocol::StorageError;

use super::config::DocsConfig;

/// Resolves caller-supplied relative paths against the docs root and refuses
/// anything that would land outside it.
pub struct PathValidator {
    config: Arc<DocsConfig>,
}

impl PathValidator {
    pub fn new(config: Arc<DocsConfig>) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Normalize a relative path to its `/`-joined form.
    ///
    /// `.` segments are dropped; `..`, absolute paths and drive prefixes are
    /// rejected before anything touches the filesystem.
    pub fn normalize(&self, relative: &str) -> Result<String, StorageError> {
        let unified = relative.trim().replace('\\', "/");
        if unified.is_empty() {
            return Err(invalid_path(relative));
        }

        let mut segments = Vec::new();
        for component in Path::new(&unified).components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment.to_str().ok_or_else(|| invalid_path(relative))?;
                    if segment.contains('\0') {
                        return Err(invalid_path(relative));
                    }
                    segments.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::PathTraversal {
                        attempted_path: relative.to_string(),
                    });
                }
            }
        }

        if segments.is_empty() {
            return Err(invalid_path(relative));
        }
        Ok(segments.join("/"))
    }

    /// Normalize `relative` and join it to the root, checking that the nearest
    /// existing ancestor still resolves inside the root.
    pub fn resolve(&self, relative: &str) -> Result<(String, PathBuf), StorageError> {
        let normalized = self.normalize(relative)?;
        let full = self.config.root.join(&normalized);
        self.ensure_contained(&full, relative)?;
        Ok((normalized, full))
    }

    fn ensure_contained(&self, full: &Path, attempted: &str) -> Result<(), StorageError> {
        let root = &self.config.root;
        if !root.exists() {
            // Nothing on disk can redirect the path yet; the lexical check holds.
            return Ok(());
        }

        let canonical_root = root.canonicalize()?;
        let existing = match full.ancestors().find(|p| p.exists()) {
            Some(existing) => existing,
            None => return Ok(()),
        };
        let canonical = existing.canonicalize()?;

        let inside = canonical == canonical_root
            || match Jail::new(&canonical_root) {
                Ok(jail) => jail.contains(&canonical).is_ok(),
                Err(_) => canonical.starts_with(&canonical_root),
            };
        if !inside {
            return Err(StorageError::PathTraversal {
                attempted_path: attempted.to_string(),
            });
        }

        if !self.config.follow_symlinks && contains_symlink(root, full) {
            return Err(StorageError::PermissionDenied {
                path: attempted.to_string(),
                reason: "Symlinked paths are not allowed".to_string(),
            });
        }

        Ok(())
    }
}

fn invalid_path(path: &str) -> StorageError {
    StorageError::InvalidPath {
        path: path.to_string(),
    }
}

/// Whether any existing component strictly below `root` is a symlink
fn contains_symlink(root: &Path, full: &Path) -> bool {
    let relative = match full.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) => return false,
    };

    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component.as_os_str());
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return true,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn validator(root: &Path) -> PathValidator {
        PathValidator::new(Arc::new(DocsConfig::with_root(root)))
    }

    #[test]
    fn normalize_drops_current_dir_and_backslashes() {
        let temp = TempDir::new().unwrap();
        let v = validator(temp.path());
        assert_eq!(v.normalize("./guides//intro.md").unwrap(), "guides/intro.md");
        assert_eq!(v.normalize("guides\\intro.md").unwrap(), "guides/intro.md");
    }

    #[test]
    fn normalize_rejects_traversal_and_absolute_paths() {
        let temp = TempDir::new().unwrap();
        let v = validator(temp.path());
        for attempt in ["../escape.md", "guides/../../escape.md", "/etc/passwd", "..\\escape.md"] {
            match v.normalize(attempt) {
                Err(StorageError::PathTraversal { attempted_path }) => {
                    assert_eq!(attempted_path, attempt)
                }
                other => panic!("expected PathTraversal for {}, got {:?}", attempt, other),
            }
        }
    }

    #[test]
    fn normalize_rejects_empty_paths() {
        let temp = TempDir::new().unwrap();
        let v = validator(temp.path());
        assert!(matches!(v.normalize("  "), Err(StorageError::InvalidPath { .. })));
        assert!(matches!(v.normalize("./"), Err(StorageError::InvalidPath { .. })));
    }

    #[test]
    fn resolve_joins_under_root() {
        let temp = TempDir::new().unwrap();
        let v = validator(temp.path());
        let (rel, full) = v.resolve("a/b.md").unwrap();
        assert_eq!(rel, "a/b.md");
        assert_eq!(full, temp.path().join("a/b.md"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_blocks_symlink_escape() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        symlink(outside.path(), temp.path().join("link")).unwrap();

        let v = validator(temp.path());
        match v.resolve("link/secret.md") {
            Err(StorageError::PathTraversal { .. }) => {}
            other => panic!("expected PathTraversal, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn resolve_blocks_inner_symlinks_when_disabled() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("real")).unwrap();
        symlink(temp.path().join("real"), temp.path().join("alias")).unwrap();

        let v = validator(temp.path());
        match v.resolve("alias/file.md") {
            Err(StorageError::PermissionDenied { .. }) => {}
            other => panic!("expected PermissionDenied, got {:?}", other),
        }

        let permissive = PathValidator::new(Arc::new(DocsConfig {
            follow_symlinks: true,
            ..DocsConfig::with_root(temp.path())
        }));
        assert!(permissive.resolve("alias/file.md").is_ok());
    }
}
