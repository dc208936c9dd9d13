use std::collections::VecDeque;

use crate::errors::{LimeError, Result};
use crate::scene::{NodeHandle, Scene};

impl Scene {
    /// Finds a descendant of `from` by id or by a slash-delimited id path.
    ///
    /// Each path segment is searched breadth first below the node matched by
    /// the previous segment; ids compare exactly and the first match wins.
    #[must_use]
    pub fn try_find_node(&self, from: NodeHandle, path: &str) -> Option<NodeHandle> {
        let mut queue = VecDeque::new();
        self.try_find_node_with(from, path, &mut queue)
    }

    /// [`try_find_node`](Self::try_find_node) using a caller-supplied queue,
    /// so repeated lookups do not allocate.
    pub fn try_find_node_with(
        &self,
        from: NodeHandle,
        path: &str,
        queue: &mut VecDeque<NodeHandle>,
    ) -> Option<NodeHandle> {
        let mut current = from;
        for segment in path.split('/') {
            current = self.find_descendant_by_id(current, segment, queue)?;
        }
        Some(current)
    }

    /// Like [`try_find_node`](Self::try_find_node) but reports a miss as an error.
    pub fn find_node(&self, from: NodeHandle, path: &str) -> Result<NodeHandle> {
        self.try_find_node(from, path)
            .ok_or_else(|| LimeError::NodeNotFound {
                path: path.to_string(),
                context: self.describe(from),
            })
    }

    /// Finds the first descendant whose tag equals `tag`.
    #[must_use]
    pub fn try_find_node_by_tag(&self, from: NodeHandle, tag: &str) -> Option<NodeHandle> {
        self.descendants(from)
            .find(|h| self.get_node(*h).and_then(|n| n.tag.as_deref()) == Some(tag))
    }

    fn find_descendant_by_id(
        &self,
        root: NodeHandle,
        id: &str,
        queue: &mut VecDeque<NodeHandle>,
    ) -> Option<NodeHandle> {
        queue.clear();
        queue.push_back(root);
        let mut found = None;
        while let Some(node) = queue.pop_front() {
            for child in self.children(node) {
                if self.get_node(child).and_then(|n| n.id()) == Some(id) {
                    found = Some(child);
                    break;
                }
                queue.push_back(child);
            }
            if found.is_some() {
                break;
            }
        }
        queue.clear();
        found
    }
}
