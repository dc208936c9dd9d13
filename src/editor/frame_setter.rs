//! Timeline scrubbing.
//!
//! Seeking replays the document from a known state with bounded
//! [`Scene::update`] steps, so triggers and marker-less logic behave exactly
//! as in real playback. To keep forward scrubbing cheap, the running state and
//! time of every animation below the scrubbed node can be cached and restored
//! on the next seek.
//!
//! A cache entry is tagged with the animation it was built for. It is only
//! used when every node of the subtree still has an entry with the same tag
//! and the same number of animations; replaced nodes carry new handles, so a
//! reloaded external scene invalidates the whole cache and it is rebuilt.

use std::sync::Arc;

use slotmap::SecondaryMap;

use crate::animation::animation::AnimationRef;
use crate::animation::utils::{SECONDS_PER_FRAME, frames_to_seconds, seconds_to_frames};
use crate::editor::audio::{AudioSwitch, MuteGuard};
use crate::scene::flags::EditorFlags;
use crate::scene::{NodeHandle, Scene};
use crate::settings::ScrubSettings;

/// Lands fast-forwards just past the target frame so its triggers fire.
const TRIGGER_EPSILON: f64 = 0.000_01;

/// Cached playback state of one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub is_running: bool,
    pub time: f64,
    pub animation_id: Option<String>,
    /// Animation the cache was built for.
    pub root: AnimationRef,
}

pub struct FrameSetter {
    settings: ScrubSettings,
    cache_animation_states: bool,
    cache: SecondaryMap<NodeHandle, Vec<AnimationState>>,
    audio: Arc<dyn AudioSwitch>,
}

impl FrameSetter {
    pub fn new(settings: ScrubSettings, audio: Arc<dyn AudioSwitch>) -> Self {
        Self {
            cache_animation_states: settings.cache_animation_states,
            settings,
            cache: SecondaryMap::new(),
            audio,
        }
    }

    #[must_use]
    pub fn audio(&self) -> &Arc<dyn AudioSwitch> {
        &self.audio
    }

    #[must_use]
    pub fn cache_animation_states(&self) -> bool {
        self.cache_animation_states
    }

    /// Turning caching off drops every cached state.
    pub fn set_cache_animation_states(&mut self, value: bool) {
        self.cache_animation_states = value;
        if !value && !self.cache.is_empty() {
            log::debug!("Discarding animation state cache");
            self.cache.clear();
        }
    }

    #[must_use]
    pub fn has_cache(&self, node: NodeHandle) -> bool {
        self.cache.contains_key(node)
    }

    /// Number of nodes with cached animation states.
    #[must_use]
    pub fn cached_node_count(&self) -> usize {
        self.cache.len()
    }

    /// Shows `frame_index` of `animation` in the document rooted at `root`.
    ///
    /// Outside animation mode, or when the frame is unchanged and the seek is
    /// not forced, the animation is simply moved to the frame. Otherwise the
    /// owner's subtree is replayed up to the frame, starting from the cache
    /// when one is usable. Every animation of the document is stopped
    /// afterwards and audio stays muted for the whole seek.
    pub fn set_current_frame(
        &mut self,
        scene: &mut Scene,
        root: NodeHandle,
        frame_index: i32,
        animation: AnimationRef,
        animation_mode: bool,
        is_forced: bool,
    ) {
        let audio = self.audio.clone();
        let _mute = MuteGuard::new(audio.as_ref());
        let node = animation.node;
        let Some((current_frame, id)) = scene.animation(animation).map(|a| (a.frame(), a.id.clone())) else {
            return;
        };

        scene.stop_animations_recursive(root);

        if animation_mode && (current_frame != frame_index || is_forced) {
            scene.set_editor_flags(node, EditorFlags::IGNORE_MARKERS, true);
            let mut cache_frame = self.cached_frame(node, id.as_deref());
            // The first cache records the subtree without running it, so other
            // animations are not reset.
            if self.cache_animation_states && cache_frame.is_none() {
                self.set_time_recursive(scene, node, 0.0, id.as_deref());
                scene.set_animation_running(animation, true);
                self.fast_forward(scene, animation, frame_index);
                self.create_cache(scene, node, animation, true);
                cache_frame = Some(frame_index);
            }
            match cache_frame {
                None => self.set_node_time(scene, node, 0.0),
                Some(_) => {
                    if !self.restore_cache(scene, node, animation) {
                        self.create_cache(scene, node, animation, false);
                    }
                }
            }
            scene.set_animation_running(animation, true);

            if let Some(cached) = cache_frame {
                let moving_back = cached > frame_index;
                let rollback = self.settings.optimal_rollback_frames;
                if moving_back || frame_index > cached + rollback * 2 {
                    self.remove_cache(scene, node);
                    if moving_back {
                        self.set_time_recursive(scene, node, 0.0, id.as_deref());
                        scene.stop_animations_recursive(node);
                        scene.set_animation_running(animation, true);
                        self.fast_forward(scene, animation, (frame_index - rollback).max(0));
                    } else {
                        self.fast_forward(scene, animation, frame_index);
                    }
                    self.create_cache(scene, node, animation, false);
                }
            }
            self.fast_forward(scene, animation, frame_index);
            scene.stop_animations_recursive(node);
            scene.set_editor_flags(node, EditorFlags::IGNORE_MARKERS, false);

            // Re-applies the landed frame and refreshes the rest of the document.
            if let Some(frame) = scene.animation(animation).map(|a| a.frame()) {
                scene.set_animation_frame(animation, frame);
            }
            scene.update(root, 0.0);
        } else {
            scene.set_animation_frame(animation, frame_index);
            scene.update(node, 0.0);
        }

        scene.stop_animations_recursive(root);
    }

    /// Plays `animation` forward to `frame` with markers ignored and audio muted.
    pub fn fast_forward_to_frame(&self, scene: &mut Scene, animation: AnimationRef, frame: i32) {
        let _mute = MuteGuard::new(self.audio.as_ref());
        scene.set_editor_flags(animation.node, EditorFlags::IGNORE_MARKERS, true);
        self.fast_forward(scene, animation, frame);
        scene.set_editor_flags(animation.node, EditorFlags::IGNORE_MARKERS, false);
    }

    fn fast_forward(&self, scene: &mut Scene, animation: AnimationRef, frame: i32) {
        let owner = animation.node;
        scene.set_editor_flags_recursive(owner, EditorFlags::FAST_FORWARDING, true);
        let step = f64::from(self.settings.fast_forward_step_frames) * SECONDS_PER_FRAME;
        loop {
            let Some((forward, scale)) = delta_to_frame(scene, animation, frame) else {
                break;
            };
            let delta = forward.min(step);
            log::trace!("Fast-forward {} by {delta:.4}s (x{scale})", scene.describe(owner));
            scene.update(owner, (delta * scale) as f32);
            let still_running = scene.animation(animation).is_some_and(|a| a.is_running());
            if forward <= step || !still_running {
                break;
            }
        }
        scene.set_editor_flags_recursive(owner, EditorFlags::FAST_FORWARDING, false);
    }

    /// Moves every animation of `node` itself to `time`.
    pub fn set_node_time(&self, scene: &mut Scene, node: NodeHandle, time: f64) {
        for serial in scene.animation_serials(node) {
            scene.set_animation_time(AnimationRef { node, serial }, time);
        }
    }

    /// Moves animation `animation_id` of `node` to `time`. The legacy
    /// animation (`None`) is moved on the whole subtree.
    pub fn set_time_recursive(&self, scene: &mut Scene, node: NodeHandle, time: f64, animation_id: Option<&str>) {
        if let Some(animation) = scene.try_find_animation(node, animation_id) {
            scene.set_animation_time(animation, time);
        }
        if animation_id.is_none() {
            let children: Vec<NodeHandle> = scene.children(node).collect();
            for child in children {
                self.set_time_recursive(scene, child, time, animation_id);
            }
        }
    }

    // ========================================================================
    // Cache
    // ========================================================================

    fn cached_frame(&self, node: NodeHandle, animation_id: Option<&str>) -> Option<i32> {
        self.cache
            .get(node)?
            .iter()
            .find(|state| state.animation_id.as_deref() == animation_id)
            .map(|state| seconds_to_frames(state.time))
    }

    fn create_cache(&mut self, scene: &Scene, node: NodeHandle, root: AnimationRef, initial: bool) {
        log::debug!("Caching animation states of {}", scene.describe(node));
        self.cache.retain(|handle, _| scene.contains(handle));
        for handle in scene.subtree(node) {
            let Some(n) = scene.get_node(handle) else {
                continue;
            };
            let states = n
                .animations()
                .iter()
                .map(|a| AnimationState {
                    is_running: !(initial && handle == node) && a.is_running(),
                    time: a.time(),
                    animation_id: a.id.clone(),
                    root,
                })
                .collect();
            self.cache.insert(handle, states);
        }
    }

    /// True when the cache below `node` was built for `root` and still
    /// matches the subtree.
    #[must_use]
    pub fn is_cache_valid(&self, scene: &Scene, node: NodeHandle, root: AnimationRef) -> bool {
        if scene.animation(root).is_none() {
            return false;
        }
        scene.subtree(node).into_iter().all(|handle| {
            let (Some(n), Some(states)) = (scene.get_node(handle), self.cache.get(handle)) else {
                return false;
            };
            states.len() == n.animations().len() && states.iter().all(|s| s.root == root)
        })
    }

    fn restore_cache(&self, scene: &mut Scene, node: NodeHandle, root: AnimationRef) -> bool {
        if !self.is_cache_valid(scene, node, root) {
            log::debug!("Animation state cache of {} is stale, rebuilding", scene.describe(node));
            return false;
        }
        log::debug!("Restoring animation states of {}", scene.describe(node));
        for handle in scene.subtree(node) {
            let Some(states) = self.cache.get(handle) else {
                continue;
            };
            let serials = scene.animation_serials(handle);
            for (serial, state) in serials.into_iter().zip(states) {
                let animation = AnimationRef { node: handle, serial };
                scene.set_animation_running(animation, state.is_running);
                scene.set_animation_time(animation, state.time);
            }
        }
        true
    }

    fn remove_cache(&mut self, scene: &Scene, node: NodeHandle) {
        for handle in scene.subtree(node) {
            self.cache.remove(handle);
        }
    }
}

/// Seconds left until `frame`, with the engine's update delta scale.
fn delta_to_frame(scene: &Scene, animation: AnimationRef, frame: i32) -> Option<(f64, f64)> {
    let anim = scene.animation(animation)?;
    let forward = frames_to_seconds(frame) - anim.time() + TRIGGER_EPSILON;
    Some((forward.max(0.0), anim.engine.fast_forward_delta_scale()))
}
