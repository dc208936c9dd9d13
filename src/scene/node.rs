use std::sync::Arc;

use crate::animation::animators::AnimatorCollection;
use crate::animation::collection::AnimationCollection;
use crate::animation::values::Value;
use crate::scene::NodeHandle;
use crate::scene::behaviour::NodeBehaviours;
use crate::scene::component::NodeComponentCollection;
use crate::scene::flags::{DirtyFlags, EditorFlags};
use crate::scene::kind::NodeKind;
use crate::scene::presenter::{Presenter, RenderChainBuilder};
use crate::scene::properties::{self, PropertyBag};

/// A scene tree node.
///
/// # Hierarchy
///
/// Nodes are linked intrusively: each node stores its parent, its first and
/// last child and its two siblings. Links are only changed through
/// [`Scene`](crate::scene::Scene), which keeps both sides in sync.
///
/// # Animation
///
/// A node owns a set of [`Animation`](crate::animation::Animation)s and the
/// [`Animator`](crate::animation::Animator)s that drive its own properties.
/// `running_animation_count` mirrors how many of its animations are running
/// so idle nodes skip the animation pass.
pub struct Node {
    pub(crate) id: Option<String>,
    pub tag: Option<String>,
    pub(crate) contents_path: Option<String>,
    pub(crate) kind: NodeKind,

    // === Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) first_child: Option<NodeHandle>,
    pub(crate) last_child: Option<NodeHandle>,
    pub(crate) next_sibling: Option<NodeHandle>,
    pub(crate) prev_sibling: Option<NodeHandle>,

    // === State ===
    pub(crate) dirty_mask: DirtyFlags,
    pub(crate) editor_flags: EditorFlags,
    pub animation_speed: f32,
    pub layer: i32,
    pub(crate) properties: PropertyBag,

    // === Animation ===
    pub(crate) animations: AnimationCollection,
    pub(crate) animators: AnimatorCollection,
    pub(crate) running_animation_count: usize,

    // === Attachments ===
    pub(crate) components: NodeComponentCollection,
    pub(crate) presenter: Option<Arc<dyn Presenter>>,
    pub(crate) post_presenter: Option<Arc<dyn Presenter>>,
    pub(crate) render_chain_builder: Option<Arc<dyn RenderChainBuilder>>,
    pub(crate) behaviours: NodeBehaviours,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("animations", &self.animations.len())
            .field("animators", &self.animators.len())
            .finish_non_exhaustive()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(NodeKind::Node)
    }
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: None,
            tag: None,
            contents_path: None,
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            dirty_mask: DirtyFlags::ALL,
            editor_flags: EditorFlags::empty(),
            animation_speed: 1.0,
            layer: 0,
            properties: PropertyBag::default(),
            animations: AnimationCollection::default(),
            animators: AnimatorCollection::default(),
            running_animation_count: 0,
            components: NodeComponentCollection::default(),
            presenter: None,
            post_presenter: None,
            render_chain_builder: None,
            behaviours: NodeBehaviours::default(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.set(name, value);
        self
    }

    #[must_use]
    pub fn with_contents_path(mut self, path: impl Into<String>) -> Self {
        self.contents_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    // --- Identity ---

    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn contents_path(&self) -> Option<&str> {
        self.contents_path.as_deref()
    }

    pub fn set_contents_path(&mut self, path: Option<String>) {
        self.contents_path = path;
    }

    // --- Hierarchy ---

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn first_child(&self) -> Option<NodeHandle> {
        self.first_child
    }

    #[inline]
    #[must_use]
    pub fn last_child(&self) -> Option<NodeHandle> {
        self.last_child
    }

    #[inline]
    #[must_use]
    pub fn next_sibling(&self) -> Option<NodeHandle> {
        self.next_sibling
    }

    #[inline]
    #[must_use]
    pub fn prev_sibling(&self) -> Option<NodeHandle> {
        self.prev_sibling
    }

    // --- State ---

    #[must_use]
    pub fn dirty_mask(&self) -> DirtyFlags {
        self.dirty_mask
    }

    #[must_use]
    pub fn is_dirty(&self, mask: DirtyFlags) -> bool {
        self.dirty_mask.intersects(mask)
    }

    /// Clears `mask`, returning whether any of it was set.
    pub fn clean_dirty_flags(&mut self, mask: DirtyFlags) -> bool {
        let was = self.dirty_mask.intersects(mask);
        self.dirty_mask.remove(mask);
        was
    }

    #[must_use]
    pub fn editor_flags(&self) -> EditorFlags {
        self.editor_flags
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Stores a property value and returns the dirty state its change
    /// invalidates. Nothing is invalidated when the value is unchanged.
    #[must_use]
    pub(crate) fn store_property(&mut self, name: &str, value: Value) -> DirtyFlags {
        if self.properties.set(name, value) {
            properties::dirty_flags_for(name)
        } else {
            DirtyFlags::empty()
        }
    }

    /// Current value of the `Trigger` property.
    #[must_use]
    pub fn trigger(&self) -> Option<&str> {
        self.properties.get(properties::TRIGGER).and_then(Value::as_str)
    }

    /// `false` when the node is hidden in the editor or its `Visible` property is off.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.editor_flags.contains(EditorFlags::HIDDEN)
            && self
                .properties
                .get(properties::VISIBLE)
                .and_then(Value::as_bool)
                .unwrap_or(true)
    }

    // --- Animation ---

    #[must_use]
    pub fn animations(&self) -> &AnimationCollection {
        &self.animations
    }

    #[must_use]
    pub fn animators(&self) -> &AnimatorCollection {
        &self.animators
    }

    pub fn animators_mut(&mut self) -> &mut AnimatorCollection {
        &mut self.animators
    }

    #[must_use]
    pub fn running_animation_count(&self) -> usize {
        self.running_animation_count
    }

    /// True when the node owns an animation with this id (`None` for legacy).
    #[must_use]
    pub fn has_animation(&self, id: Option<&str>) -> bool {
        self.animations.index_of(id).is_some()
    }

    // --- Attachments ---

    #[must_use]
    pub fn components(&self) -> &NodeComponentCollection {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut NodeComponentCollection {
        &mut self.components
    }

    #[must_use]
    pub fn presenter(&self) -> Option<&Arc<dyn Presenter>> {
        self.presenter.as_ref()
    }

    pub fn set_presenter(&mut self, presenter: Option<Arc<dyn Presenter>>) {
        self.presenter = presenter;
    }

    #[must_use]
    pub fn post_presenter(&self) -> Option<&Arc<dyn Presenter>> {
        self.post_presenter.as_ref()
    }

    pub fn set_post_presenter(&mut self, presenter: Option<Arc<dyn Presenter>>) {
        self.post_presenter = presenter;
    }

    pub fn set_render_chain_builder(&mut self, builder: Option<Arc<dyn RenderChainBuilder>>) {
        self.render_chain_builder = builder;
    }

    /// Copy of this node's own state for a clone: no links, fresh animation
    /// serials, shared animator keys, no behaviours and everything dirty.
    pub(crate) fn clone_detached(&self) -> Node {
        let mut animations = AnimationCollection::default();
        for animation in self.animations.iter() {
            animations.push(animation.clone());
        }
        let running_animation_count = animations.running_count();
        Node {
            id: self.id.clone(),
            tag: self.tag.clone(),
            contents_path: self.contents_path.clone(),
            kind: self.kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            dirty_mask: DirtyFlags::ALL,
            editor_flags: self.editor_flags,
            animation_speed: self.animation_speed,
            layer: self.layer,
            properties: self.properties.clone(),
            animations,
            animators: self.animators.shared_clone(),
            running_animation_count,
            components: self.components.clone_all(),
            presenter: self
                .presenter
                .as_ref()
                .map(|p| p.clone_presenter().unwrap_or_else(|| p.clone())),
            post_presenter: self
                .post_presenter
                .as_ref()
                .map(|p| p.clone_presenter().unwrap_or_else(|| p.clone())),
            render_chain_builder: self
                .render_chain_builder
                .as_ref()
                .map(|b| b.clone_builder().unwrap_or_else(|| b.clone())),
            behaviours: NodeBehaviours::default(),
        }
    }
}
