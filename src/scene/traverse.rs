use crate::scene::{NodeHandle, Scene};

/// Restartable pre-order walk over the descendants of a root.
///
/// The cursor keeps no borrow of the scene between steps, so the tree may be
/// edited while walking. Nodes inserted below the current position are
/// visited; a removed current node ends the walk.
#[derive(Debug, Clone, Copy)]
pub struct DescendantCursor {
    root: NodeHandle,
    current: Option<NodeHandle>,
    finished: bool,
}

impl DescendantCursor {
    #[must_use]
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            current: None,
            finished: false,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.finished = false;
    }

    /// Skips the subtree of the node last returned.
    pub fn skip_children(&mut self, scene: &Scene) -> Option<NodeHandle> {
        let current = self.current?;
        self.step_over(scene, current)
    }

    pub fn move_next(&mut self, scene: &Scene) -> Option<NodeHandle> {
        if self.finished {
            return None;
        }
        let from = self.current.unwrap_or(self.root);
        let Some(node) = scene.get_node(from) else {
            self.finished = true;
            return None;
        };
        if let Some(child) = node.first_child {
            self.current = Some(child);
            return Some(child);
        }
        if self.current.is_none() {
            self.finished = true;
            return None;
        }
        self.step_over(scene, from)
    }

    fn step_over(&mut self, scene: &Scene, from: NodeHandle) -> Option<NodeHandle> {
        let mut node = from;
        loop {
            if node == self.root {
                break;
            }
            let Some(n) = scene.get_node(node) else { break };
            if let Some(next) = n.next_sibling {
                self.current = Some(next);
                return Some(next);
            }
            match n.parent {
                Some(parent) => node = parent,
                None => break,
            }
        }
        self.finished = true;
        self.current = None;
        None
    }
}

/// Borrowing iterator over the descendants of a node, in pre-order.
pub struct Descendants<'a> {
    scene: &'a Scene,
    cursor: DescendantCursor,
}

impl Iterator for Descendants<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        self.cursor.move_next(self.scene)
    }
}

pub struct Children<'a> {
    scene: &'a Scene,
    next: Option<NodeHandle>,
}

impl Iterator for Children<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let current = self.next?;
        self.next = self.scene.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

pub struct Ancestors<'a> {
    scene: &'a Scene,
    next: Option<NodeHandle>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let current = self.next?;
        self.next = self.scene.parent(current);
        Some(current)
    }
}

impl Scene {
    /// Children of `node` from first to last sibling.
    #[must_use]
    pub fn children(&self, node: NodeHandle) -> Children<'_> {
        Children {
            scene: self,
            next: self.first_child(node),
        }
    }

    /// Descendants of `node` (not including it), depth first.
    #[must_use]
    pub fn descendants(&self, node: NodeHandle) -> Descendants<'_> {
        Descendants {
            scene: self,
            cursor: DescendantCursor::new(node),
        }
    }

    /// Parent chain of `node`, nearest first (not including it).
    #[must_use]
    pub fn ancestors(&self, node: NodeHandle) -> Ancestors<'_> {
        Ancestors {
            scene: self,
            next: self.parent(node),
        }
    }

    /// Topmost ancestor of `node`, or `node` itself for a root.
    #[must_use]
    pub fn root_of(&self, node: NodeHandle) -> NodeHandle {
        self.ancestors(node).last().unwrap_or(node)
    }

    #[must_use]
    pub fn is_descendant_of(&self, node: NodeHandle, ancestor: NodeHandle) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    #[must_use]
    pub fn same_or_descendant_of(&self, node: NodeHandle, ancestor: NodeHandle) -> bool {
        node == ancestor || self.is_descendant_of(node, ancestor)
    }

    /// `node` followed by its descendants, collected so the caller may mutate
    /// the scene while visiting them.
    #[must_use]
    pub fn subtree(&self, node: NodeHandle) -> Vec<NodeHandle> {
        if !self.contains(node) {
            return Vec::new();
        }
        std::iter::once(node).chain(self.descendants(node)).collect()
    }
}
