use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::protocol::StorageError;

/// Walk the components of `path` below `root` and fail on the first one that
/// exists as a file. Catches writes like `notes.md/inner.md` before the
/// filesystem reports a less useful ENOTDIR.
pub fn validate_parent_components(root: &Path, path: &Path) -> Result<(), StorageError> {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) => return Ok(()),
    };

    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        if current.is_file() {
            return Err(StorageError::NotADirectory {
                path: display_relative(root, &current),
            });
        }
    }

    Ok(())
}

/// Create the parent directories of `path`, refusing to descend through files
pub async fn create_parent_dirs_safe(root: &Path, path: &Path) -> Result<(), StorageError> {
    let parent = match path.parent() {
        Some(parent) => parent,
        None => return Ok(()),
    };
    validate_parent_components(root, parent)?;

    tokio::fs::create_dir_all(parent).await.map_err(|e| {
        // ENOTDIR: something raced us and put a file in the way
        if e.raw_os_error() == Some(20) {
            if let Err(not_dir) = validate_parent_components(root, parent) {
                return not_dir;
            }
        }
        StorageError::from(e)
    })
}

/// Hidden sibling used as the staging file for an atomic write
pub fn sibling_temp_path(path: &Path) -> PathBuf {
    let mut file_name = OsString::from(".");
    file_name.push(
        path.file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("file")),
    );
    file_name.push(format!(".tmp-{}", uuid::Uuid::new_v4()));
    path.with_file_name(file_name)
}

pub fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_in_parent_chain_is_reported() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.md"), "x").unwrap();

        let err = validate_parent_components(temp.path(), &temp.path().join("notes.md/inner"))
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::NotADirectory {
                path: "notes.md".to_string()
            }
        );
    }

    #[tokio::test]
    async fn creates_missing_parents() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a/b/c.md");
        create_parent_dirs_safe(temp.path(), &target).await.unwrap();
        assert!(temp.path().join("a/b").is_dir());
    }

    #[test]
    fn temp_sibling_is_hidden() {
        let temp = sibling_temp_path(Path::new("/docs/guide.md"));
        let name = temp.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".guide.md.tmp-"));
        assert_eq!(temp.parent(), Some(Path::new("/docs")));
    }
}
