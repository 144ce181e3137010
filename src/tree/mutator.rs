//! In-place tree mutations used to reconcile client state after a write.
//!
//! Only nodes on the path to the target are touched; everything else is left
//! where it is.

use crate::protocol::FileNode;

use super::{find_mut, remove_where};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("parent folder not found: {0}")]
    ParentNotFound(String),
    #[error("not a folder: {0}")]
    NotAFolder(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("'{name}' already exists in {parent}")]
    NameConflict { parent: String, name: String },
    #[error("node not found: {0}")]
    NodeNotFound(String),
}

/// Append `node` to the root (no parent) or to the children of the folder at
/// `parent_path`.
pub fn insert(
    tree: &mut Vec<FileNode>,
    node: FileNode,
    parent_path: Option<&str>,
) -> Result<(), TreeError> {
    let siblings = match parent_path {
        None => tree,
        Some(parent_path) => {
            let parent = find_mut(tree, &|n| n.path == parent_path)
                .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
            if !parent.is_folder() {
                return Err(TreeError::NotAFolder(parent_path.to_string()));
            }
            parent.children.get_or_insert_with(Vec::new)
        }
    };

    if siblings.iter().any(|sibling| sibling.name == node.name) {
        return Err(TreeError::NameConflict {
            parent: parent_path.unwrap_or("/").to_string(),
            name: node.name,
        });
    }

    siblings.push(node);
    Ok(())
}

/// Remove every node whose path equals `target_path`, at any depth. Returns
/// the removed subtrees (empty when nothing matched).
pub fn remove(tree: &mut Vec<FileNode>, target_path: &str) -> Vec<FileNode> {
    remove_where(tree, &|n| n.path == target_path)
}

/// Replace the cached content of the file at `target_path`, returning the
/// previous value.
pub fn update_content(
    tree: &mut [FileNode],
    target_path: &str,
    content: Option<String>,
) -> Result<Option<String>, TreeError> {
    let node = find_mut(tree, &|n| n.path == target_path)
        .ok_or_else(|| TreeError::NodeNotFound(target_path.to_string()))?;
    if node.is_folder() {
        return Err(TreeError::NotAFile(target_path.to_string()));
    }
    Ok(std::mem::replace(&mut node.content, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{find_by_path, walk};
    use std::collections::BTreeSet;

    fn sample() -> Vec<FileNode> {
        vec![
            FileNode::folder("guides", "guides", "guides")
                .with_children(vec![FileNode::file("guides_a_md", "a.md", "guides/a.md")]),
            FileNode::file("README_md", "README.md", "README.md"),
        ]
    }

    fn path_set(tree: &[FileNode]) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        walk(tree, &mut |n| {
            paths.insert(n.path.clone());
        });
        paths
    }

    #[test]
    fn insert_appends_to_root_and_folders() {
        let mut tree = sample();
        insert(&mut tree, FileNode::file("new_md", "new.md", "new.md"), None).unwrap();
        insert(
            &mut tree,
            FileNode::file("guides_b_md", "b.md", "guides/b.md"),
            Some("guides"),
        )
        .unwrap();

        assert_eq!(tree.last().unwrap().path, "new.md");
        let guides = find_by_path(&tree, "guides").unwrap();
        assert_eq!(guides.children.as_ref().unwrap().last().unwrap().path, "guides/b.md");
    }

    #[test]
    fn insert_rejects_missing_or_file_parent() {
        let mut tree = sample();
        let err = insert(&mut tree, FileNode::file("x", "x.md", "nope/x.md"), Some("nope")).unwrap_err();
        assert_eq!(err, TreeError::ParentNotFound("nope".to_string()));

        let err = insert(
            &mut tree,
            FileNode::file("x", "x.md", "README.md/x.md"),
            Some("README.md"),
        )
        .unwrap_err();
        assert_eq!(err, TreeError::NotAFolder("README.md".to_string()));
    }

    #[test]
    fn insert_rejects_sibling_name_conflict() {
        let mut tree = sample();
        let err = insert(
            &mut tree,
            FileNode::file("dup", "a.md", "guides/a.md"),
            Some("guides"),
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::NameConflict { .. }));
    }

    #[test]
    fn remove_after_insert_restores_path_set() {
        let original = sample();
        let mut tree = original.clone();
        insert(
            &mut tree,
            FileNode::folder("guides_more", "more", "guides/more"),
            Some("guides"),
        )
        .unwrap();
        let removed = remove(&mut tree, "guides/more");
        assert_eq!(removed.len(), 1);
        assert_eq!(path_set(&tree), path_set(&original));
    }

    #[test]
    fn remove_matches_every_occurrence() {
        let mut tree = vec![
            FileNode::file("a", "a.md", "a.md"),
            FileNode::folder("d", "d", "d").with_children(vec![FileNode::file("a2", "a.md", "a.md")]),
        ];
        let removed = remove(&mut tree, "a.md");
        assert_eq!(removed.len(), 2);
        assert_eq!(path_set(&tree), BTreeSet::from(["d".to_string()]));
    }

    #[test]
    fn update_content_only_touches_content() {
        let original = sample();
        let mut tree = original.clone();
        let previous = update_content(&mut tree, "guides/a.md", Some("# A".to_string())).unwrap();
        assert_eq!(previous, None);

        let updated = find_by_path(&tree, "guides/a.md").unwrap();
        assert_eq!(updated.content.as_deref(), Some("# A"));
        assert_eq!(updated.name, "a.md");
        assert_eq!(path_set(&tree), path_set(&original));

        let mut reverted = tree.clone();
        update_content(&mut reverted, "guides/a.md", previous).unwrap();
        assert_eq!(reverted, original);
    }

    #[test]
    fn update_content_rejects_folders_and_unknown_paths() {
        let mut tree = sample();
        assert_eq!(
            update_content(&mut tree, "guides", Some(String::new())).unwrap_err(),
            TreeError::NotAFile("guides".to_string())
        );
        assert_eq!(
            update_content(&mut tree, "missing.md", None).unwrap_err(),
            TreeError::NodeNotFound("missing.md".to_string())
        );
        assert!(find_by_path(&tree, "README.md").is_some());
    }
}
