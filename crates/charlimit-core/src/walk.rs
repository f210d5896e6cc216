//! Pre-order traversal of a node subtree.

use crate::error::HostError;
use crate::host::{DocumentTree, NodeId};

/// Visit every text node under `root` (including `root` itself) in document
/// order, returning how many were visited.
///
/// The walk keeps its own stack, so nesting depth is bounded by memory rather
/// than by the call stack. A node's children are read only after the visitor
/// has run on the nodes before it, so the visitor may mutate the document.
/// A queued node that the visitor deleted in the meantime is skipped; a
/// missing `root` is still an error. The first visitor error stops the walk.
#[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
pub fn walk_text_nodes<T, E, F>(tree: &mut T, root: NodeId, mut visit: F) -> Result<usize, E>
where
    T: DocumentTree + ?Sized,
    E: From<HostError>,
    F: FnMut(&mut T, &NodeId) -> Result<(), E>,
{
    // Only the root is looked up eagerly; everything else was queued from a
    // children list and may be gone by the time it is popped.
    tree.kind(&root)?;
    let mut stack = vec![root];
    let mut visited = 0;
    let mut vanished = 0;

    while let Some(node) = stack.pop() {
        let kind = match tree.kind(&node) {
            Ok(kind) => kind,
            Err(HostError::NodeNotFound(_)) => {
                tracing::trace!(node = %node, "queued node removed during walk");
                vanished += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if kind.is_text() {
            visit(tree, &node)?;
            visited += 1;
        }
        if let Some(children) = tree.children(&node)? {
            stack.extend(children.into_iter().rev());
        }
    }

    tracing::debug!(visited, vanished, "subtree walked");
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostResult;
    use crate::host::{Bounds, Host, NodeKind};
    use crate::memory::MemoryDocument;

    #[test]
    fn visits_text_in_document_order() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let a = doc.add_text(&page, "a", "", Bounds::default());
        let frame = doc.add_frame(&page, "frame", Bounds::default());
        let b = doc.add_text(&frame, "b", "", Bounds::default());
        let group = doc.add_group(&frame, "group");
        let c = doc.add_text(&group, "c", "", Bounds::default());
        let d = doc.add_text(&page, "d", "", Bounds::default());

        let mut seen = Vec::new();
        let count = walk_text_nodes(&mut doc, page, |_, node| -> HostResult<()> {
            seen.push(node.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 4);
        assert_eq!(seen, vec![a, b, c, d]);
    }

    #[test]
    fn text_root_is_visited() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let text = doc.add_text(&page, "solo", "hi", Bounds::default());

        let count = walk_text_nodes(&mut doc, text, |_, _| -> HostResult<()> { Ok(()) }).unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut doc = MemoryDocument::new();
        let mut parent = doc.page();
        for depth in 0..50_000 {
            parent = doc.add_group(&parent, &format!("g{depth}"));
        }
        doc.add_text(&parent, "leaf", "x", Bounds::default());

        let page = doc.page();
        let count = walk_text_nodes(&mut doc, page, |_, _| -> HostResult<()> { Ok(()) }).unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn non_text_leaves_are_skipped() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        doc.add_shape(&page, "icon", NodeKind::Shape, Bounds::default());

        let count = walk_text_nodes(&mut doc, page, |_, _| -> HostResult<()> { Ok(()) }).unwrap();

        assert_eq!(count, 0);
    }

    #[test]
    fn missing_root_is_a_host_error() {
        let mut doc = MemoryDocument::new();
        let result = walk_text_nodes(&mut doc, NodeId::from("nope"), |_, _| -> HostResult<()> {
            Ok(())
        });
        assert_eq!(result, Err(HostError::NodeNotFound(NodeId::from("nope"))));
    }

    #[test]
    fn nodes_removed_by_the_visitor_are_skipped() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let first = doc.add_text(&page, "first", "", Bounds::default());
        let doomed = doc.add_shape(&page, "doomed", NodeKind::Rectangle, Bounds::default());
        let last = doc.add_text(&page, "last", "", Bounds::default());

        let mut seen = Vec::new();
        let count = walk_text_nodes(&mut doc, page, |doc, node| -> HostResult<()> {
            if *node == first {
                doc.remove(&doomed)?;
            }
            seen.push(node.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(seen, vec![first, last]);
    }

    #[test]
    fn visitor_error_stops_walk() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let first = doc.add_text(&page, "first", "", Bounds::default());
        doc.add_text(&page, "second", "", Bounds::default());

        let mut calls = 0;
        let result = walk_text_nodes(&mut doc, page, |_, node| {
            calls += 1;
            Err(HostError::NodeNotFound(node.clone()))
        });

        assert_eq!(result, Err(HostError::NodeNotFound(first)));
        assert_eq!(calls, 1);
    }
}
