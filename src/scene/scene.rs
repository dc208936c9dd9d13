use std::sync::Arc;

use slotmap::SlotMap;

use crate::animation::animator::Animator;
use crate::animation::values::Value;
use crate::assets::AnimationDataSource;
use crate::errors::{LimeError, Result};
use crate::scene::NodeHandle;
use crate::scene::flags::{DirtyFlags, EditorFlags};
use crate::scene::kind::NodeKind;
use crate::scene::node::Node;
use crate::settings::EngineSettings;

/// Arena owning every node of a scene forest.
///
/// Any node without a parent is a root. Handles are generation checked, so a
/// handle to a disposed node resolves to `None` instead of another node.
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeHandle, Node>,
    pub settings: EngineSettings,
    pub(crate) animation_data_source: Option<Arc<dyn AnimationDataSource>>,
    pub(crate) pending_disposal: Vec<NodeHandle>,
    pub(crate) update_depth: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            settings,
            animation_data_source: None,
            pending_disposal: Vec::new(),
            update_depth: 0,
        }
    }

    /// Source of external animation data, used to load animators of
    /// animations with a contents path.
    pub fn set_animation_data_source(&mut self, source: Option<Arc<dyn AnimationDataSource>>) {
        self.animation_data_source = source;
    }

    /// Starts building a detached node.
    pub fn build_node(&'_ mut self, kind: NodeKind) -> NodeBuilder<'_> {
        NodeBuilder::new(self, kind)
    }

    /// Inserts a detached node into the arena.
    pub fn insert_node(&mut self, node: Node) -> NodeHandle {
        debug_assert!(node.parent.is_none() && node.first_child.is_none());
        let handle = self.nodes.insert(node);
        if let Some(node) = self.nodes.get_mut(handle) {
            for animation in node.animations.iter_mut() {
                animation.set_owner(Some(handle));
            }
        }
        handle
    }

    pub fn create_node(&mut self, kind: NodeKind) -> NodeHandle {
        self.insert_node(Node::new(kind))
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    pub(crate) fn node_ref(&self, handle: NodeHandle) -> Result<&Node> {
        self.nodes.get(handle).ok_or(LimeError::StaleHandle)
    }

    pub(crate) fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        self.nodes.get_mut(handle).ok_or(LimeError::StaleHandle)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Parentless nodes.
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(h, _)| h)
    }

    /// Human readable description used in diagnostics: `'id' in 'parent' (Kind)`.
    #[must_use]
    pub fn describe(&self, handle: NodeHandle) -> String {
        let Some(node) = self.nodes.get(handle) else {
            return "<disposed node>".to_string();
        };
        let mut text = format!("'{}'", node.id().unwrap_or(""));
        let mut parent = node.parent;
        while let Some(p) = parent {
            let Some(pn) = self.nodes.get(p) else { break };
            text.push_str(&format!(" in '{}'", pn.id().unwrap_or("")));
            parent = pn.parent;
        }
        text.push_str(&format!(" ({})", node.kind));
        if let Some(tag) = &node.tag {
            text.push_str(&format!(" [{tag}]"));
        }
        text
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn first_child(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(|n| n.first_child)
    }

    #[must_use]
    pub fn next_sibling(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(|n| n.next_sibling)
    }

    #[must_use]
    pub fn child_count(&self, handle: NodeHandle) -> usize {
        self.children(handle).count()
    }

    #[must_use]
    pub fn nth_child(&self, handle: NodeHandle, index: usize) -> Option<NodeHandle> {
        self.children(handle).nth(index)
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_self_or_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// Inserts `child` as the first child of `parent` (bottom rendering layer).
    pub fn add_node(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.check_attach(parent, child)?;
        let old_first = self.node_ref(parent)?.first_child;
        self.link(parent, child, None, old_first);
        Ok(())
    }

    /// Inserts `child` as the last child of `parent` (topmost rendering layer).
    pub fn push_node(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.check_attach(parent, child)?;
        let old_last = self.node_ref(parent)?.last_child;
        self.link(parent, child, old_last, None);
        Ok(())
    }

    /// Inserts `child` so that it ends up at `index` among the children of
    /// `parent`. Indices past the end append.
    pub fn insert_node_at(&mut self, parent: NodeHandle, index: usize, child: NodeHandle) -> Result<()> {
        self.check_attach(parent, child)?;
        match self.nth_child(parent, index) {
            Some(next) => {
                let prev = self.node_ref(next)?.prev_sibling;
                self.link(parent, child, prev, Some(next));
            }
            None => {
                let old_last = self.node_ref(parent)?.last_child;
                self.link(parent, child, old_last, None);
            }
        }
        Ok(())
    }

    /// Detaches `child` from its parent. No-op for roots.
    pub fn unlink(&mut self, child: NodeHandle) {
        let Some(node) = self.nodes.get_mut(child) else {
            return;
        };
        let Some(parent) = node.parent.take() else {
            return;
        };
        let prev = node.prev_sibling.take();
        let next = node.next_sibling.take();

        match prev {
            Some(p) => {
                if let Some(pn) = self.nodes.get_mut(p) {
                    pn.next_sibling = next;
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.first_child = next;
                }
            }
        }
        match next {
            Some(n) => {
                if let Some(nn) = self.nodes.get_mut(n) {
                    nn.prev_sibling = prev;
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.last_child = prev;
                }
            }
        }
        self.propagate_dirty_flags(child, DirtyFlags::ALL);
    }

    /// Removes `child` from `parent`. Returns `false` when it was not a child.
    pub fn remove_node(&mut self, parent: NodeHandle, child: NodeHandle) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.unlink(child);
        true
    }

    fn check_attach(&self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.node_ref(parent)?;
        let child_node = self.node_ref(child)?;
        if child_node.parent.is_some() {
            return Err(LimeError::AlreadyParented {
                node: self.describe(child),
            });
        }
        if self.is_self_or_ancestor(child, parent) {
            return Err(LimeError::CyclicHierarchy {
                node: self.describe(child),
            });
        }
        Ok(())
    }

    fn link(
        &mut self,
        parent: NodeHandle,
        child: NodeHandle,
        prev: Option<NodeHandle>,
        next: Option<NodeHandle>,
    ) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match prev {
            Some(p) => {
                if let Some(pn) = self.nodes.get_mut(p) {
                    pn.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.first_child = Some(child);
                }
            }
        }
        match next {
            Some(n) => {
                if let Some(nn) = self.nodes.get_mut(n) {
                    nn.prev_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.last_child = Some(child);
                }
            }
        }
        self.propagate_dirty_flags(child, DirtyFlags::ALL);
    }

    // ========================================================================
    // Dirty state
    // ========================================================================

    /// Marks `mask` dirty on `node` and every descendant that does not already
    /// carry it. Stops at once when `node` already has the whole mask.
    pub fn propagate_dirty_flags(&mut self, node: NodeHandle, mask: DirtyFlags) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        if n.dirty_mask.contains(mask) {
            return;
        }
        let mut stack: smallvec::SmallVec<[NodeHandle; 16]> = smallvec::smallvec![node];
        while let Some(handle) = stack.pop() {
            let Some(n) = self.nodes.get_mut(handle) else {
                continue;
            };
            n.dirty_mask.insert(mask);
            let mut child = n.first_child;
            while let Some(c) = child {
                let Some(cn) = self.nodes.get(c) else { break };
                if !cn.dirty_mask.contains(mask) {
                    stack.push(c);
                }
                child = cn.next_sibling;
            }
        }
    }

    pub fn clean_dirty_flags(&mut self, node: NodeHandle, mask: DirtyFlags) -> bool {
        self.nodes
            .get_mut(node)
            .is_some_and(|n| n.clean_dirty_flags(mask))
    }

    // ========================================================================
    // Properties and flags
    // ========================================================================

    #[must_use]
    pub fn property(&self, node: NodeHandle, name: &str) -> Option<&Value> {
        self.nodes.get(node).and_then(|n| n.properties.get(name))
    }

    /// Sets a property and invalidates the dirty state it affects on the node
    /// and its subtree.
    pub fn set_property(&mut self, node: NodeHandle, name: &str, value: Value) -> Result<()> {
        let n = self.node_mut(node)?;
        if let Some(current) = n.properties.get(name)
            && std::mem::discriminant(current) != std::mem::discriminant(&value)
        {
            return Err(LimeError::PropertyTypeMismatch {
                property: name.to_string(),
                expected: current.kind_name(),
                found: value.kind_name(),
            });
        }
        let dirty = n.store_property(name, value);
        if !dirty.is_empty() {
            self.propagate_dirty_flags(node, dirty);
        }
        Ok(())
    }

    /// Sets or clears editor flags. Any change invalidates visibility of the subtree.
    pub fn set_editor_flags(&mut self, node: NodeHandle, flags: EditorFlags, value: bool) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        let before = n.editor_flags;
        n.editor_flags.set(flags, value);
        if n.editor_flags != before {
            self.propagate_dirty_flags(node, DirtyFlags::VISIBLE);
        }
    }

    /// [`set_editor_flags`](Self::set_editor_flags) on `node` and its whole subtree.
    pub fn set_editor_flags_recursive(&mut self, node: NodeHandle, flags: EditorFlags, value: bool) {
        let handles: Vec<NodeHandle> = std::iter::once(node).chain(self.descendants(node)).collect();
        for handle in handles {
            self.set_editor_flags(handle, flags, value);
        }
    }

    /// Adds an animator to `node`, replacing the one for the same property
    /// and animation.
    pub fn add_animator(&mut self, node: NodeHandle, animator: Animator) -> Result<()> {
        self.node_mut(node)?.animators.add(animator);
        Ok(())
    }
}

/// Fluent construction of a detached node.
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    node: Node,
    parent: Option<NodeHandle>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, kind: NodeKind) -> Self {
        Self {
            scene,
            node: Node::new(kind),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.node.id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.node.properties.set(name, value);
        self
    }

    #[must_use]
    pub fn with_animator(mut self, animator: Animator) -> Self {
        self.node.animators.add(animator);
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animation: crate::animation::Animation) -> Self {
        self.node.animations.push(animation);
        self
    }

    #[must_use]
    pub fn with_contents_path(mut self, path: &str) -> Self {
        self.node.contents_path = Some(path.to_string());
        self
    }

    /// Appends the node as the last child of `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> Result<NodeHandle> {
        let handle = self.scene.insert_node(self.node);
        if let Some(parent) = self.parent {
            self.scene.push_node(parent, handle)?;
        }
        Ok(handle)
    }
}
