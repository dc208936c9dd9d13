//! Render chain plumbing.
//!
//! The update thread walks the tree and collects `(layer, node, presenter)`
//! entries into a [`RenderChain`]. Presenters then turn each entry into an
//! opaque [`RenderObject`] that the render thread consumes.

use std::any::Any;
use std::sync::Arc;

use crate::scene::{NodeHandle, Scene};

/// Snapshot of a node's visual state, detached from the scene.
pub type RenderObject = Box<dyn Any + Send + Sync>;

pub trait Presenter: Send + Sync {
    fn render_object(&self, scene: &Scene, node: NodeHandle) -> Option<RenderObject>;

    /// Presenter for a cloned node. `None` shares this presenter with the clone.
    fn clone_presenter(&self) -> Option<Arc<dyn Presenter>> {
        None
    }
}

/// Overrides how a node contributes itself and its subtree to a render chain.
pub trait RenderChainBuilder: Send + Sync {
    fn add_to_render_chain(&self, scene: &Scene, node: NodeHandle, chain: &mut dyn RenderChain);

    /// Builder for a cloned node. `None` shares this builder with the clone.
    fn clone_builder(&self) -> Option<Arc<dyn RenderChainBuilder>> {
        None
    }
}

pub trait RenderChain {
    fn add(&mut self, node: NodeHandle, presenter: Arc<dyn Presenter>);
    fn current_layer(&self) -> i32;
    fn set_current_layer(&mut self, layer: i32);
}

pub struct RenderEntry {
    pub layer: i32,
    pub node: NodeHandle,
    pub presenter: Arc<dyn Presenter>,
}

/// Layered [`RenderChain`].
///
/// Within a layer, entries added later are drawn underneath entries added
/// earlier; higher layers are drawn above lower ones.
#[derive(Default)]
pub struct RenderList {
    entries: Vec<RenderEntry>,
    current_layer: i32,
}

impl RenderList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_layer = 0;
    }

    /// Entries in back-to-front order.
    #[must_use]
    pub fn draw_order(&self) -> Vec<&RenderEntry> {
        let mut ordered: Vec<&RenderEntry> = self.entries.iter().rev().collect();
        ordered.sort_by_key(|e| e.layer);
        ordered
    }
}

impl RenderChain for RenderList {
    fn add(&mut self, node: NodeHandle, presenter: Arc<dyn Presenter>) {
        self.entries.push(RenderEntry {
            layer: self.current_layer,
            node,
            presenter,
        });
    }

    fn current_layer(&self) -> i32 {
        self.current_layer
    }

    fn set_current_layer(&mut self, layer: i32) {
        self.current_layer = layer;
    }
}
