//! Plain-text views of the storage tree, the cache tree and change batches.

use std::fmt::Display;

use colored::Colorize;

use crate::cache::{Cache, CacheNode, NodeId};
use crate::change::NodeChange;
use crate::path::Path;
use crate::storage::{Storage, StorageNode};

const INDENT: &str = "  ";

pub fn render_storage<T: Display>(storage: &Storage<T>) -> String {
    let mut lines = Vec::new();
    for (index, node) in storage.children().iter().enumerate() {
        storage_lines(node, &Path::from(vec![index]), 0, &mut lines);
    }
    lines.join("\n")
}

fn storage_lines<T: Display>(node: &StorageNode<T>, path: &Path, depth: usize, lines: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);
    if node.is_deleted() {
        lines.push(format!(
            "{indent}{} {} {}",
            path.to_string().dimmed(),
            node.document().to_string().strikethrough(),
            "[deleted]".red()
        ));
    } else {
        lines.push(format!("{indent}{} {}", path.to_string().dimmed(), node.document()));
    }

    for (index, child) in node.children().iter().enumerate() {
        storage_lines(child, &path.append(index), depth + 1, lines);
    }
}

pub fn render_cache<T: Display>(cache: &Cache<T>) -> String {
    let mut lines = Vec::new();
    for id in cache.root_children() {
        cache_lines(cache, *id, 0, &mut lines);
    }
    lines.join("\n")
}

/// Follows a run of missing nodes that each have a single missing child.
/// Returns the last node of the run and how many nodes were skipped to get
/// there.
pub fn deepest_non_ephemeral<T>(cache: &Cache<T>, id: NodeId) -> (NodeId, usize) {
    let mut current = id;
    let mut skipped = 0;
    while let [only] = cache.children(current) {
        let ephemeral = cache.node(current).is_some_and(CacheNode::is_missing)
            && cache.node(*only).is_some_and(CacheNode::is_missing);
        if !ephemeral {
            break;
        }
        current = *only;
        skipped += 1;
    }
    (current, skipped)
}

fn cache_lines<T: Display>(cache: &Cache<T>, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(node) = cache.node(id) else {
        return;
    };
    let indent = INDENT.repeat(depth);

    match node {
        CacheNode::Missing(missing) => {
            let (deepest, skipped) = deepest_non_ephemeral(cache, id);
            if skipped == 0 {
                lines.push(format!(
                    "{indent}{} {}",
                    missing.handle_path().to_string().dimmed(),
                    "(missing)".dimmed()
                ));
            } else {
                let last = cache
                    .handle_path(deepest)
                    .map(Path::to_string)
                    .unwrap_or_default();
                lines.push(format!(
                    "{indent}{} {}",
                    format!("{} .. {}", missing.handle_path(), last).dimmed(),
                    format!("({} missing documents)", skipped + 1).dimmed()
                ));
            }
            for child in cache.children(deepest) {
                cache_lines(cache, *child, depth + 1, lines);
            }
        }
        CacheNode::Handle(handle) => {
            let path = handle.handle_path().to_string().dimmed();
            if handle.is_deleted() {
                lines.push(format!(
                    "{indent}{path} {} {}",
                    handle.document().to_string().strikethrough(),
                    "[deleted]".red()
                ));
                return;
            }
            match handle.edited_document() {
                Some(edited) => lines.push(format!(
                    "{indent}{path} {} {}",
                    edited.to_string().yellow(),
                    "*".yellow().bold()
                )),
                None => lines.push(format!("{indent}{path} {}", handle.document())),
            }
            for child in handle.children() {
                cache_lines(cache, *child, depth + 1, lines);
            }
            for added in handle.added_children() {
                cache_lines(cache, *added, depth + 1, lines);
            }
        }
        CacheNode::Added(added) => {
            lines.push(format!(
                "{indent}{} {}",
                "+".green().bold(),
                added.document().to_string().green()
            ));
            for child in added.added_children() {
                cache_lines(cache, *child, depth + 1, lines);
            }
        }
    }
}

pub fn render_changes<T: Display>(changes: &[NodeChange<T>]) -> String {
    changes
        .iter()
        .map(|change| {
            let head = format!("{} {}", change.change_type(), change.handle_path());
            match change {
                NodeChange::DocumentChanged { document, .. } => format!("{head} -> {document}"),
                NodeChange::ChildrenAdded { added, .. } => {
                    let count: usize = added.iter().map(|snapshot| snapshot.count()).sum();
                    format!("{head} +{count} documents")
                }
                NodeChange::Deleted { .. } => head,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::DocumentHandle;
    use crate::snapshot::{DocumentSnapshot, RootSnapshot};

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn pulled(paths: &[&str]) -> Cache<String> {
        let mut cache = Cache::new();
        for p in paths {
            cache
                .add_handle(DocumentHandle::new(path(p), format!("doc {p}")))
                .unwrap();
        }
        cache
    }

    #[test]
    fn single_missing_node_is_not_ephemeral() {
        let cache = pulled(&["/0/0"]);
        let missing = cache.node_at(&path("/0")).unwrap();
        assert_eq!(deepest_non_ephemeral(&cache, missing), (missing, 0));
    }

    #[test]
    fn skips_down_a_chain_of_single_missing_children() {
        let cache = pulled(&["/0/0/0/0/0"]);
        let top = cache.node_at(&path("/0")).unwrap();
        let deepest = cache.node_at(&path("/0/0/0/0")).unwrap();
        assert_eq!(deepest_non_ephemeral(&cache, top), (deepest, 3));
    }

    #[test]
    fn renders_cache_with_collapsed_missing_chain_and_markers() {
        colored::control::set_override(false);
        let mut cache = pulled(&["/0/0/0/1", "/1"]);
        let edited = cache.node_at(&path("/0/0/0/1")).unwrap();
        cache.set_edited_document(edited, "changed".to_string()).unwrap();
        let top = cache.node_at(&path("/1")).unwrap();
        cache.add_subdocument(top, "new".to_string()).unwrap();

        assert_eq!(
            render_cache(&cache),
            [
                "/0 .. /0/0/0 (3 missing documents)",
                "  /0/0/0/1 changed *",
                "/1 doc /1",
                "  + new",
            ]
            .join("\n")
        );
    }

    #[test]
    fn deleted_handle_hides_its_subtree() {
        colored::control::set_override(false);
        let mut cache = pulled(&["/0", "/0/0"]);
        let top = cache.node_at(&path("/0")).unwrap();
        cache.delete(top).unwrap();

        assert_eq!(render_cache(&cache), "/0 doc /0 [deleted]");
    }

    #[test]
    fn renders_storage_with_tombstones() {
        colored::control::set_override(false);
        let mut storage = Storage::from_snapshot(RootSnapshot::from(vec![
            DocumentSnapshot::with_children(
                "A".to_string(),
                vec![DocumentSnapshot::leaf("A0".to_string())],
            ),
            DocumentSnapshot::leaf("B".to_string()),
        ]));
        storage.apply_changes(vec![NodeChange::Deleted {
            handle_path: path("/1"),
        }]);

        assert_eq!(render_storage(&storage), "/0 A\n  /0/0 A0\n/1 B [deleted]");
    }

    #[test]
    fn renders_change_batches() {
        let changes = vec![
            NodeChange::DocumentChanged {
                handle_path: path("/1/0"),
                document: "B0-edited".to_string(),
            },
            NodeChange::ChildrenAdded {
                handle_path: path("/0"),
                added: vec![DocumentSnapshot::with_children(
                    "x".to_string(),
                    vec![DocumentSnapshot::leaf("y".to_string())],
                )],
            },
            NodeChange::Deleted {
                handle_path: path("/2"),
            },
        ];

        assert_eq!(
            render_changes(&changes),
            "changed /1/0 -> B0-edited\nchanged /0 +2 documents\ndeleted /2"
        );
    }
}
