use crate::errors::Result;
use crate::scene::{NodeHandle, Scene};

impl Scene {
    /// Deep copy of `node` and its subtree as a new detached root.
    ///
    /// Component hooks run on the source subtree before copying and on the
    /// copy afterwards. Animators share their keys with the source; animations
    /// get fresh identities; behaviours and tasks are not copied.
    pub fn clone_node(&mut self, node: NodeHandle) -> Result<NodeHandle> {
        self.node_ref(node)?;

        let sources = self.subtree(node);
        for &source in &sources {
            if let Some(n) = self.nodes.get_mut(source) {
                for component in n.components.iter_mut() {
                    component.on_before_owner_clone(source);
                }
            }
        }

        let mut pairs = Vec::with_capacity(sources.len());
        let clone = self.clone_subtree(node, &mut pairs)?;

        for (source, copy) in pairs {
            if let Some(n) = self.nodes.get_mut(copy) {
                for component in n.components.iter_mut() {
                    component.on_after_owner_clone(source, copy);
                }
            }
        }
        Ok(clone)
    }

    fn clone_subtree(
        &mut self,
        source: NodeHandle,
        pairs: &mut Vec<(NodeHandle, NodeHandle)>,
    ) -> Result<NodeHandle> {
        let copy = self.node_ref(source)?.clone_detached();
        let handle = self.insert_node(copy);
        pairs.push((source, handle));
        let children: Vec<NodeHandle> = self.children(source).collect();
        for child in children {
            let child_copy = self.clone_subtree(child, pairs)?;
            self.push_node(handle, child_copy)?;
        }
        Ok(handle)
    }

    /// Unlinks `node` and releases it with its subtree. Handles to them
    /// become stale.
    pub fn dispose(&mut self, node: NodeHandle) {
        self.unlink(node);
        self.dispose_subtree(node);
    }

    fn dispose_subtree(&mut self, node: NodeHandle) {
        let children: Vec<NodeHandle> = self.children(node).collect();
        for child in children {
            self.dispose_subtree(child);
        }
        if let Some(mut n) = self.nodes.remove(node) {
            n.components.dispose_all();
            for mut animation in n.animations.take_all() {
                if animation.is_running {
                    animation.is_running = false;
                    animation.raise_stopped();
                }
            }
            log::trace!("Disposed node {:?}", n.id());
        }
    }

    pub fn unlink_and_dispose(&mut self, node: NodeHandle) {
        self.dispose(node);
    }
}
