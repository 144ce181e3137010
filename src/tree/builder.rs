//! Builds a nested tree from a flat `{path, type}` listing.
//!
//! Listings come from the local docs walk and from the GitLab tree API; order
//! is not guaranteed and intermediate folders may be missing from the input.

use std::collections::{HashMap, HashSet};

use crate::protocol::{FileNode, FlatEntry, NodeKind};

struct Slot {
    node: FileNode,
    children: Vec<usize>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    by_path: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl Arena {
    fn push(&mut self, parent: Option<usize>, node: FileNode) -> usize {
        let idx = self.slots.len();
        self.by_path.insert(node.path.clone(), idx);
        self.slots.push(Slot {
            node,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.slots[parent].children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    /// Children always sit at higher indices than their parent, so assembling
    /// from the back hands every folder its finished children.
    fn assemble(mut self) -> Vec<FileNode> {
        let mut built: Vec<Option<FileNode>> = vec![None; self.slots.len()];
        while let Some(Slot { mut node, children }) = self.slots.pop() {
            let idx = self.slots.len();
            if node.is_folder() {
                node.children = Some(children.iter().filter_map(|&c| built[c].take()).collect());
            }
            built[idx] = Some(node);
        }
        self.roots.iter().filter_map(|&r| built[r].take()).collect()
    }
}

/// Build a tree from a flat listing.
///
/// Duplicate paths keep their first occurrence. Ancestors absent from the
/// listing are synthesized with an id of `folder-<path>`. The result obeys the
/// sibling ordering of [`super::sort_nodes`].
pub fn build_tree(entries: impl IntoIterator<Item = FlatEntry>) -> Vec<FileNode> {
    let mut seen = HashSet::new();
    let mut entries: Vec<(String, FlatEntry)> = entries
        .into_iter()
        .filter_map(|entry| {
            let normalized = entry
                .path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join("/");
            if normalized.is_empty() {
                return None;
            }
            if !seen.insert(normalized.clone()) {
                tracing::debug!("Dropping duplicate listing entry: {}", normalized);
                return None;
            }
            Some((normalized, entry))
        })
        .collect();

    entries.sort_by(|(a_path, a), (b_path, b)| {
        b.kind
            .is_folder()
            .cmp(&a.kind.is_folder())
            .then_with(|| a_path.cmp(b_path))
    });

    let mut arena = Arena::default();
    'entries: for (path, entry) in entries {
        let segments: Vec<&str> = path.split('/').collect();
        let (name, ancestors) = match segments.split_last() {
            Some(split) => split,
            None => continue,
        };

        let mut parent = None;
        let mut current = String::new();
        for segment in ancestors {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);

            let idx = match arena.by_path.get(&current) {
                Some(&idx) => idx,
                None => arena.push(
                    parent,
                    FileNode::folder(format!("folder-{}", current), *segment, current.clone()),
                ),
            };
            if !arena.slots[idx].node.is_folder() {
                tracing::warn!("Skipping {}: ancestor {} is a file", path, current);
                continue 'entries;
            }
            parent = Some(idx);
        }

        if arena.by_path.contains_key(&path) {
            continue;
        }

        let mut node = match entry.kind {
            NodeKind::Folder => FileNode::folder(entry.id, *name, path.clone()),
            NodeKind::File => FileNode::file(entry.id, *name, path.clone()),
        };
        node.size = entry.size;
        arena.push(parent, node);
    }

    let mut tree = arena.assemble();
    super::sort_nodes(&mut tree);
    tree
}
