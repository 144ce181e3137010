//! Path-keyed file trees
//!
//! The builder, mutator, workspace and search all traverse trees through the
//! helpers in this module rather than carrying their own recursion.

pub mod builder;
pub mod mutator;

use std::cmp::Ordering;

use crate::protocol::{FileNode, FlatEntry, NodeKind};

pub use builder::build_tree;
pub use mutator::TreeError;

/// Stable node identifier derived from a relative path
pub fn path_id(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Last `/`-separated segment of a path
pub fn leaf_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Parent path, or `None` for a root-level node
pub fn parent_path(path: &str) -> Option<&str> {
    path.trim_end_matches('/').rsplit_once('/').map(|(parent, _)| parent)
}

pub fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, name),
        _ => name.to_string(),
    }
}

/// Pre-order traversal over every node
pub fn walk<'a>(nodes: &'a [FileNode], visit: &mut impl FnMut(&'a FileNode)) {
    for node in nodes {
        visit(node);
        if let Some(children) = &node.children {
            walk(children, visit);
        }
    }
}

pub fn find<'a>(nodes: &'a [FileNode], pred: &impl Fn(&FileNode) -> bool) -> Option<&'a FileNode> {
    for node in nodes {
        if pred(node) {
            return Some(node);
        }
        if let Some(children) = &node.children {
            if let Some(found) = find(children, pred) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_mut<'a>(
    nodes: &'a mut [FileNode],
    pred: &impl Fn(&FileNode) -> bool,
) -> Option<&'a mut FileNode> {
    for node in nodes.iter_mut() {
        if pred(node) {
            return Some(node);
        }
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = find_mut(children, pred) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_by_path<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
    find(nodes, &|node| node.path == path)
}

/// Removes every node matching `pred` at any depth and returns the removed
/// subtrees in traversal order.
pub fn remove_where(nodes: &mut Vec<FileNode>, pred: &impl Fn(&FileNode) -> bool) -> Vec<FileNode> {
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        if pred(&node) {
            removed.push(node);
            continue;
        }
        if let Some(children) = node.children.as_mut() {
            removed.extend(remove_where(children, pred));
        }
        kept.push(node);
    }
    *nodes = kept;
    removed
}

/// All file nodes in traversal order
pub fn files(nodes: &[FileNode]) -> Vec<&FileNode> {
    let mut out = Vec::new();
    walk(nodes, &mut |node| {
        if !node.is_folder() {
            out.push(node);
        }
    });
    out
}

/// Folders before files, then by name
pub fn compare_nodes(a: &FileNode, b: &FileNode) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| a.name.cmp(&b.name))
}

pub fn sort_nodes(nodes: &mut [FileNode]) {
    nodes.sort_by(compare_nodes);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            sort_nodes(children);
        }
    }
}

impl From<FlatEntry> for FileNode {
    fn from(entry: FlatEntry) -> Self {
        let name = leaf_name(&entry.path).to_string();
        let mut node = match entry.kind {
            NodeKind::Folder => FileNode::folder(entry.id, name, entry.path),
            NodeKind::File => FileNode::file(entry.id, name, entry.path),
        };
        node.size = entry.size;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FileNode> {
        vec![
            FileNode::folder("guides", "guides", "guides").with_children(vec![
                FileNode::file("guides_a_md", "a.md", "guides/a.md"),
                FileNode::folder("guides_deep", "deep", "guides/deep")
                    .with_children(vec![FileNode::file("guides_deep_b_md", "b.md", "guides/deep/b.md")]),
            ]),
            FileNode::file("README_md", "README.md", "README.md"),
        ]
    }

    #[test]
    fn path_id_replaces_non_alphanumerics() {
        assert_eq!(path_id("guides/getting-started.md"), "guides_getting_started_md");
        assert_eq!(path_id("ä.md"), "__md");
    }

    #[test]
    fn path_helpers_split_on_slash() {
        assert_eq!(leaf_name("a/b/c.md"), "c.md");
        assert_eq!(leaf_name("src/"), "src");
        assert_eq!(parent_path("a/b/c.md"), Some("a/b"));
        assert_eq!(parent_path("c.md"), None);
        assert_eq!(join_path(Some("a"), "b"), "a/b");
        assert_eq!(join_path(None, "b"), "b");
    }

    #[test]
    fn walk_is_pre_order() {
        let tree = sample();
        let mut seen = Vec::new();
        walk(&tree, &mut |node| seen.push(node.path.clone()));
        assert_eq!(
            seen,
            vec!["guides", "guides/a.md", "guides/deep", "guides/deep/b.md", "README.md"]
        );
    }

    #[test]
    fn find_mut_reaches_nested_nodes() {
        let mut tree = sample();
        let node = find_mut(&mut tree, &|n| n.path == "guides/deep/b.md").unwrap();
        node.content = Some("x".to_string());
        assert_eq!(
            find_by_path(&tree, "guides/deep/b.md").unwrap().content.as_deref(),
            Some("x")
        );
    }

    #[test]
    fn remove_where_drops_whole_subtrees() {
        let mut tree = sample();
        let removed = remove_where(&mut tree, &|n| n.path == "guides/deep");
        assert_eq!(removed.len(), 1);
        assert!(find_by_path(&tree, "guides/deep/b.md").is_none());
        assert!(find_by_path(&tree, "guides/a.md").is_some());
    }

    #[test]
    fn sort_nodes_puts_folders_first() {
        let mut nodes = vec![
            FileNode::file("b", "b.md", "b.md"),
            FileNode::folder("z", "z", "z"),
            FileNode::file("a", "a.md", "a.md"),
            FileNode::folder("c", "c", "c"),
        ];
        sort_nodes(&mut nodes);
        let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["c", "z", "a.md", "b.md"]);
    }
}
