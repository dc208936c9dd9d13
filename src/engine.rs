//! Engine Core Module
//!
//! [`Engine`] drives one scene: it advances the tree once per frame and
//! prepares what the render thread draws. It owns no window or GPU state, so
//! any frontend can host it.
//!
//! # Threading
//!
//! The scene lives behind the `ui_sync` lock. The whole update pass and the
//! whole render preparation pass each hold it, so render never observes a
//! tree mid-mutation. Preparation publishes an immutable [`PreparedFrame`];
//! the render thread keeps drawing the previous one until the next is
//! published.
//!
//! # Example
//!
//! ```rust,ignore
//! use lime::{Engine, Scene, NodeKind};
//!
//! let mut scene = Scene::new();
//! let root = scene.create_node(NodeKind::Frame);
//! let engine = Engine::new(scene, root);
//!
//! // Update thread
//! engine.update(1.0 / 60.0);
//! engine.prepare_render();
//!
//! // Render thread
//! let frame = engine.prepared_frame();
//! for object in &frame.objects { /* draw */ }
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::scene::presenter::{RenderList, RenderObject};
use crate::scene::{NodeHandle, Scene};

/// A render object produced for one render chain entry.
pub struct PreparedObject {
    pub layer: i32,
    pub node: NodeHandle,
    pub object: RenderObject,
}

/// Everything the render thread needs for one frame, in draw order.
#[derive(Default)]
pub struct PreparedFrame {
    /// Update frame the objects were prepared after.
    pub frame_index: u64,
    pub objects: Vec<PreparedObject>,
}

struct EngineState {
    scene: Scene,
    root: NodeHandle,
    time: f64,
    frame_count: u64,
    render_list: RenderList,
}

/// Frame driver for a single scene root.
pub struct Engine {
    ui_sync: Mutex<EngineState>,
    prepared: RwLock<Arc<PreparedFrame>>,
}

impl Engine {
    #[must_use]
    pub fn new(scene: Scene, root: NodeHandle) -> Self {
        Self {
            ui_sync: Mutex::new(EngineState {
                scene,
                root,
                time: 0.0,
                frame_count: 0,
                render_list: RenderList::new(),
            }),
            prepared: RwLock::new(Arc::new(PreparedFrame::default())),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.ui_sync.lock().root
    }

    /// Total seconds passed to [`update`](Self::update).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.ui_sync.lock().time
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.ui_sync.lock().frame_count
    }

    /// Runs `f` on the scene with the `ui_sync` lock held.
    pub fn with_scene<R>(&self, f: impl FnOnce(&mut Scene, NodeHandle) -> R) -> R {
        let mut state = self.ui_sync.lock();
        let root = state.root;
        f(&mut state.scene, root)
    }

    /// Advances the scene root by `delta` seconds.
    pub fn update(&self, delta: f32) {
        let mut state = self.ui_sync.lock();
        let root = state.root;
        state.scene.update(root, delta);
        state.time += f64::from(delta);
        state.frame_count += 1;
    }

    /// Collects the render chain of the root and turns it into render objects.
    /// The result becomes visible through [`prepared_frame`](Self::prepared_frame)
    /// once complete.
    pub fn prepare_render(&self) {
        let frame = {
            let mut guard = self.ui_sync.lock();
            let state = &mut *guard;
            state.render_list.clear();
            state.scene.add_to_render_chain(state.root, &mut state.render_list);
            let objects = state
                .render_list
                .draw_order()
                .into_iter()
                .filter_map(|entry| {
                    entry
                        .presenter
                        .render_object(&state.scene, entry.node)
                        .map(|object| PreparedObject {
                            layer: entry.layer,
                            node: entry.node,
                            object,
                        })
                })
                .collect();
            PreparedFrame {
                frame_index: state.frame_count,
                objects,
            }
        };
        *self.prepared.write() = Arc::new(frame);
    }

    /// The most recently completed [`PreparedFrame`].
    #[must_use]
    pub fn prepared_frame(&self) -> Arc<PreparedFrame> {
        self.prepared.read().clone()
    }
}
