//! Client-side docs state
//!
//! All tree changes go through [`Workspace::apply`], which returns the inverse
//! mutation so an optimistic change can be rolled back when the server write
//! it predicted fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::protocol::{FileNode, NodeKind};
use crate::tree::{self, mutator, TreeError};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert {
        node: FileNode,
        parent: Option<String>,
    },
    Remove {
        path: String,
    },
    UpdateContent {
        path: String,
        content: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    tree: Vec<FileNode>,
}

impl Workspace {
    pub fn new(tree: Vec<FileNode>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &[FileNode] {
        &self.tree
    }

    pub fn into_tree(self) -> Vec<FileNode> {
        self.tree
    }

    pub fn get(&self, path: &str) -> Option<&FileNode> {
        tree::find_by_path(&self.tree, path)
    }

    /// Apply one mutation and return its inverse.
    pub fn apply(&mut self, mutation: Mutation) -> Result<Mutation, TreeError> {
        match mutation {
            Mutation::Insert { node, parent } => {
                let path = node.path.clone();
                mutator::insert(&mut self.tree, node, parent.as_deref())?;
                Ok(Mutation::Remove { path })
            }
            Mutation::Remove { path } => {
                let mut removed = mutator::remove(&mut self.tree, &path);
                if removed.is_empty() {
                    return Err(TreeError::NodeNotFound(path));
                }
                // Paths are unique within a tree, so the first match is the node.
                let node = removed.swap_remove(0);
                let parent = tree::parent_path(&path).map(str::to_string);
                Ok(Mutation::Insert { node, parent })
            }
            Mutation::UpdateContent { path, content } => {
                let previous = mutator::update_content(&mut self.tree, &path, content)?;
                Ok(Mutation::UpdateContent {
                    path,
                    content: previous,
                })
            }
        }
    }

    /// Apply a batch; on failure the already-applied part is rolled back.
    /// Returns the inverses in the order they must be replayed.
    pub fn apply_all(&mut self, mutations: Vec<Mutation>) -> Result<Vec<Mutation>, TreeError> {
        let mut inverses = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            match self.apply(mutation) {
                Ok(inverse) => inverses.push(inverse),
                Err(e) => {
                    inverses.reverse();
                    self.revert(inverses);
                    return Err(e);
                }
            }
        }
        inverses.reverse();
        Ok(inverses)
    }

    pub fn revert(&mut self, inverses: Vec<Mutation>) {
        for inverse in inverses {
            if let Err(e) = self.apply(inverse) {
                tracing::warn!("Failed to revert optimistic change: {}", e);
            }
        }
    }

    /// Insert a node at `path`, creating any missing ancestor folders.
    pub fn insert_path(&mut self, path: &str, kind: NodeKind) -> Result<Vec<Mutation>, TreeError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut plan = Vec::new();
        let mut parent: Option<String> = None;

        for (i, segment) in segments.iter().enumerate() {
            let current = tree::join_path(parent.as_deref(), segment);
            let is_leaf = i + 1 == segments.len();

            match self.get(&current) {
                Some(existing) if !is_leaf => {
                    if !existing.is_folder() {
                        return Err(TreeError::NotAFolder(current));
                    }
                }
                Some(_) => {
                    return Err(TreeError::NameConflict {
                        parent: parent.unwrap_or_else(|| "/".to_string()),
                        name: segment.to_string(),
                    });
                }
                None => {
                    let id = tree::path_id(&current);
                    let node = if is_leaf && kind == NodeKind::File {
                        FileNode::file(id, *segment, current.clone())
                    } else {
                        FileNode::folder(id, *segment, current.clone())
                    };
                    plan.push(Mutation::Insert {
                        node,
                        parent: parent.clone(),
                    });
                }
            }
            parent = Some(current);
        }

        self.apply_all(plan)
    }
}

/// Auto-save gate: skips saves of content identical to the last successful
/// save and allows a single save in flight.
#[derive(Debug, Default)]
pub struct SaveGuard {
    in_flight: AtomicBool,
    last_saved: Mutex<Option<String>>,
}

impl SaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with content known to be on disk (e.g. just loaded).
    pub fn with_saved(content: impl Into<String>) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            last_saved: Mutex::new(Some(content.into())),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn try_begin(&self, content: &str) -> Option<SaveTicket<'_>> {
        let unchanged = self
            .last_saved
            .lock()
            .ok()
            .map(|last| last.as_deref() == Some(content))
            .unwrap_or(false);
        if unchanged {
            return None;
        }

        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        Some(SaveTicket {
            guard: self,
            content: content.to_string(),
        })
    }
}

/// Held for the duration of one save; releases the in-flight slot on drop.
#[derive(Debug)]
pub struct SaveTicket<'a> {
    guard: &'a SaveGuard,
    content: String,
}

impl SaveTicket<'_> {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn succeeded(self) {
        if let Ok(mut last) = self.guard.last_saved.lock() {
            *last = Some(self.content.clone());
        }
    }

    pub fn failed(self) {}
}

impl Drop for SaveTicket<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(vec![
            FileNode::folder("guides", "guides", "guides")
                .with_children(vec![FileNode::file("guides_a_md", "a.md", "guides/a.md")]),
            FileNode::file("README_md", "README.md", "README.md"),
        ])
    }

    #[test]
    fn optimistic_insert_can_be_reverted() {
        let mut ws = workspace();
        let before = ws.clone().into_tree();

        let undo = ws
            .apply(Mutation::Insert {
                node: FileNode::file("guides_b_md", "b.md", "guides/b.md"),
                parent: Some("guides".to_string()),
            })
            .unwrap();
        assert!(ws.get("guides/b.md").is_some());

        ws.revert(vec![undo]);
        assert_eq!(ws.tree(), before.as_slice());
    }

    #[test]
    fn remove_inverse_reinserts_subtree() {
        let mut ws = workspace();
        let undo = ws
            .apply(Mutation::Remove {
                path: "guides".to_string(),
            })
            .unwrap();
        assert!(ws.get("guides/a.md").is_none());

        ws.revert(vec![undo]);
        assert_eq!(
            ws.get("guides/a.md").map(|n| n.path.as_str()),
            Some("guides/a.md")
        );
    }

    #[test]
    fn content_update_inverse_restores_previous_content() {
        let mut ws = workspace();
        let undo = ws
            .apply(Mutation::UpdateContent {
                path: "README.md".to_string(),
                content: Some("hello".to_string()),
            })
            .unwrap();
        assert_eq!(ws.get("README.md").unwrap().content.as_deref(), Some("hello"));
        ws.revert(vec![undo]);
        assert_eq!(ws.get("README.md").unwrap().content, None);
    }

    #[test]
    fn insert_path_creates_ancestors_and_reverts_cleanly() {
        let mut ws = workspace();
        let before = ws.clone().into_tree();

        let undo = ws
            .insert_path("codebase/my-org_my-repo/src/app.py", NodeKind::File)
            .unwrap();
        assert_eq!(undo.len(), 4);
        let leaf = ws.get("codebase/my-org_my-repo/src/app.py").unwrap();
        assert!(!leaf.is_folder());
        assert!(ws.get("codebase/my-org_my-repo").unwrap().is_folder());

        ws.revert(undo);
        assert_eq!(ws.tree(), before.as_slice());
    }

    #[test]
    fn insert_path_reuses_existing_folders() {
        let mut ws = workspace();
        let undo = ws.insert_path("guides/new.md", NodeKind::File).unwrap();
        assert_eq!(undo, vec![Mutation::Remove {
            path: "guides/new.md".to_string()
        }]);
    }

    #[test]
    fn insert_path_rejects_existing_leaf_and_file_ancestor() {
        let mut ws = workspace();
        assert!(matches!(
            ws.insert_path("guides/a.md", NodeKind::File),
            Err(TreeError::NameConflict { .. })
        ));
        assert_eq!(
            ws.insert_path("README.md/x.md", NodeKind::File).unwrap_err(),
            TreeError::NotAFolder("README.md".to_string())
        );
    }

    #[test]
    fn apply_all_rolls_back_on_failure() {
        let mut ws = workspace();
        let before = ws.clone().into_tree();
        let result = ws.apply_all(vec![
            Mutation::Insert {
                node: FileNode::file("n", "n.md", "n.md"),
                parent: None,
            },
            Mutation::Remove {
                path: "missing.md".to_string(),
            },
        ]);
        assert!(result.is_err());
        assert_eq!(ws.tree(), before.as_slice());
    }

    #[test]
    fn save_guard_suppresses_unchanged_content() {
        let guard = SaveGuard::with_saved("hello");
        assert!(guard.try_begin("hello").is_none());

        let ticket = guard.try_begin("hello world").unwrap();
        ticket.succeeded();
        assert!(guard.try_begin("hello world").is_none());
    }

    #[test]
    fn save_guard_allows_one_save_in_flight() {
        let guard = SaveGuard::new();
        let first = guard.try_begin("a").unwrap();
        assert!(guard.is_saving());
        assert!(guard.try_begin("b").is_none());

        first.failed();
        assert!(!guard.is_saving());
        let retry = guard.try_begin("a").unwrap();
        assert_eq!(retry.content(), "a");
    }
}
