//! Animation playback on the scene tree.
//!
//! Every state change of an [`Animation`] goes through these [`Scene`]
//! methods: they keep the owner's running counter in sync, load external
//! animators on first use and apply animator values after time changes.
//!
//! An animation drives the animators found on its owner's descendants that
//! carry the same animation id. The search stops below any node that owns an
//! animation with that id; legacy animations only reach direct children.

use smallvec::SmallVec;

use crate::animation::animation::{Animation, AnimationRef, AnimationSerial};
use crate::animation::data::{AnimationData, split_property_path};
use crate::animation::engine::TriggerWindow;
use crate::animation::utils::{SECONDS_PER_FRAME, frames_to_seconds, seconds_to_frame_position};
use crate::errors::{LimeError, Result};
use crate::scene::flags::DirtyFlags;
use crate::scene::properties::dirty_flags_for;
use crate::scene::traverse::DescendantCursor;
use crate::scene::{NodeHandle, Scene};

const LEGACY_NAME: &str = "<legacy>";

struct FiredTrigger {
    node: NodeHandle,
    value: String,
    correction: f64,
}

impl Scene {
    // ========================================================================
    // Lookup
    // ========================================================================

    #[must_use]
    pub fn animation(&self, animation: AnimationRef) -> Option<&Animation> {
        let animations = &self.nodes.get(animation.node)?.animations;
        match animations.first() {
            Some(first) if first.serial() == animation.serial => Some(first),
            _ => animations.by_serial(animation.serial),
        }
    }

    pub fn animation_mut(&mut self, animation: AnimationRef) -> Option<&mut Animation> {
        self.nodes
            .get_mut(animation.node)?
            .animations
            .by_serial_mut(animation.serial)
    }

    /// Attaches `animation` to `node`. A legacy animation replaces the node's
    /// current legacy animation.
    pub fn add_animation(&mut self, node: NodeHandle, mut animation: Animation) -> Result<AnimationRef> {
        let n = self.node_mut(node)?;
        animation.set_owner(Some(node));
        let reference = AnimationRef {
            node,
            serial: animation.serial(),
        };
        n.animations.push(animation);
        n.running_animation_count = n.animations.running_count();
        Ok(reference)
    }

    /// Detaches an animation from its owner.
    pub fn remove_animation(&mut self, animation: AnimationRef) -> Option<Animation> {
        let n = self.nodes.get_mut(animation.node)?;
        let mut removed = n.animations.remove_by_serial(animation.serial)?;
        n.running_animation_count = n.animations.running_count();
        removed.set_owner(None);
        Some(removed)
    }

    /// Animation of `node` with this id; `None` selects the legacy animation.
    #[must_use]
    pub fn try_find_animation(&self, node: NodeHandle, id: Option<&str>) -> Option<AnimationRef> {
        let animation = self.nodes.get(node)?.animations.try_find(id)?;
        Some(AnimationRef {
            node,
            serial: animation.serial(),
        })
    }

    pub fn find_animation(&self, node: NodeHandle, id: Option<&str>) -> Result<AnimationRef> {
        self.try_find_animation(node, id)
            .ok_or_else(|| LimeError::AnimationNotFound {
                animation: id.unwrap_or(LEGACY_NAME).to_string(),
                context: self.describe(node),
            })
    }

    /// The node's legacy animation, created on first request.
    pub fn default_animation(&mut self, node: NodeHandle) -> Result<AnimationRef> {
        if let Some(found) = self.try_find_animation(node, None) {
            return Ok(found);
        }
        self.add_animation(node, Animation::legacy())
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn set_animation_running(&mut self, animation: AnimationRef, value: bool) {
        let Some(anim) = self.animation_mut(animation) else {
            return;
        };
        if anim.is_running == value {
            return;
        }
        anim.is_running = value;
        if !value {
            anim.raise_stopped();
        }
        self.refresh_running_animation_count(animation.node);
        if value {
            self.load_animation(animation);
        }
    }

    pub fn stop_animation(&mut self, animation: AnimationRef) {
        self.set_animation_running(animation, false);
    }

    /// Moves the animation to `time` seconds and applies its animators without
    /// firing triggers.
    pub fn set_animation_time(&mut self, animation: AnimationRef, time: f64) {
        let Some(anim) = self.animation_mut(animation) else {
            return;
        };
        anim.time = time;
        anim.running_marker_id = None;
        self.apply_animators(animation, false);
    }

    pub fn set_animation_frame(&mut self, animation: AnimationRef, frame: i32) {
        self.set_animation_time(animation, frames_to_seconds(frame));
    }

    /// Runs an animation, optionally from a marker.
    ///
    /// A restarted animation drops its `stopped` subscribers and fires its
    /// assured-stopped subscribers for the interrupted run.
    pub fn try_run_animation_ref(
        &mut self,
        animation: AnimationRef,
        marker_id: Option<&str>,
        time_correction: f64,
    ) -> bool {
        let Some(anim) = self.animation(animation) else {
            return false;
        };
        let engine = anim.engine.clone();
        let was_running = anim.is_running;
        if !engine.try_run_animation(self, animation, marker_id, time_correction) {
            return false;
        }
        if let Some(anim) = self.animation_mut(animation) {
            anim.stopped.clear();
            if was_running {
                anim.raise_stopped();
            }
        }
        true
    }

    /// Runs animation `animation_id` of `node` (the legacy animation for
    /// `None`, created on demand), optionally from a marker.
    pub fn try_run_animation(
        &mut self,
        node: NodeHandle,
        marker_id: Option<&str>,
        animation_id: Option<&str>,
    ) -> bool {
        self.try_run_animation_with_correction(node, marker_id, animation_id, 0.0)
    }

    pub fn try_run_animation_with_correction(
        &mut self,
        node: NodeHandle,
        marker_id: Option<&str>,
        animation_id: Option<&str>,
        time_correction: f64,
    ) -> bool {
        let animation = match animation_id {
            None => match self.default_animation(node) {
                Ok(animation) => animation,
                Err(_) => return false,
            },
            Some(id) => match self.try_find_animation(node, Some(id)) {
                Some(animation) => animation,
                None => return false,
            },
        };
        self.try_run_animation_ref(animation, marker_id, time_correction)
    }

    /// Like [`try_run_animation`](Self::try_run_animation) but reports which
    /// lookup failed.
    pub fn run_animation(
        &mut self,
        node: NodeHandle,
        marker_id: Option<&str>,
        animation_id: Option<&str>,
    ) -> Result<()> {
        let animation = match animation_id {
            None => self.default_animation(node)?,
            Some(_) => self.find_animation(node, animation_id)?,
        };
        if self.try_run_animation_ref(animation, marker_id, 0.0) {
            Ok(())
        } else {
            Err(LimeError::MarkerNotFound {
                marker: marker_id.unwrap_or_default().to_string(),
                animation: animation_id.unwrap_or(LEGACY_NAME).to_string(),
            })
        }
    }

    /// Advances a running animation by `delta` seconds through its engine.
    pub fn advance_animation(&mut self, animation: AnimationRef, delta: f64) {
        let Some(anim) = self.animation(animation) else {
            return;
        };
        if !anim.is_running {
            return;
        }
        let engine = anim.engine.clone();
        engine.advance_animation(self, animation, delta);
    }

    /// Loads external animators, then applies the animators at the current time.
    pub fn apply_animators(&mut self, animation: AnimationRef, invoke_triggers: bool) {
        self.load_animation(animation);
        let Some(engine) = self.animation(animation).map(|a| a.engine.clone()) else {
            return;
        };
        engine.apply_animators(self, animation, invoke_triggers);
    }

    /// Advances a running animation, together with every animation below its
    /// owner, until it reaches the first marker after the current frame.
    pub fn rewind_to_next_marker(&mut self, animation: AnimationRef) {
        let Some(anim) = self.animation(animation) else {
            return;
        };
        if !anim.is_running {
            return;
        }
        let Some(next_marker) = anim.markers.first_after_frame(anim.frame()) else {
            return;
        };
        let step = SECONDS_PER_FRAME - 0.000_01;
        let mut remaining = next_marker.time() - anim.time;
        while remaining >= 0.0 {
            self.advance_propagated(animation, remaining.min(step));
            remaining -= step;
        }
        if self.update_depth == 0 {
            self.flush_pending_disposal();
        }
    }

    fn advance_propagated(&mut self, animation: AnimationRef, delta: f64) {
        self.advance_animation(animation, delta);
        let descendants: Vec<NodeHandle> = self.descendants(animation.node).collect();
        for node in descendants {
            for serial in self.animation_serials(node) {
                self.advance_animation(AnimationRef { node, serial }, delta);
            }
        }
    }

    /// Stops every animation of `node` and its subtree.
    pub fn stop_animations_recursive(&mut self, node: NodeHandle) {
        for handle in self.subtree(node) {
            for serial in self.animation_serials(handle) {
                self.set_animation_running(AnimationRef { node: handle, serial }, false);
            }
        }
    }

    pub(crate) fn advance_node_animations(&mut self, node: NodeHandle, delta: f64) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        if n.running_animation_count == 0 {
            return;
        }
        for serial in self.animation_serials(node) {
            self.advance_animation(AnimationRef { node, serial }, delta);
        }
    }

    pub(crate) fn animation_serials(&self, node: NodeHandle) -> SmallVec<[AnimationSerial; 4]> {
        self.nodes
            .get(node)
            .map(|n| n.animations.serials().collect())
            .unwrap_or_default()
    }

    pub(crate) fn refresh_running_animation_count(&mut self, node: NodeHandle) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.running_animation_count = n.animations.running_count();
        }
    }

    // ========================================================================
    // Animators
    // ========================================================================

    /// Nodes whose animators are driven by animation `id` of `owner`.
    ///
    /// A named animation drives the owner itself and its descendants, except
    /// for subtrees rooted at a node that owns an animation with the same id.
    /// A legacy animation drives the direct children of the owner only.
    #[must_use]
    pub fn animator_hosts(&self, owner: NodeHandle, id: Option<&str>, is_legacy: bool) -> Vec<NodeHandle> {
        let mut hosts = Vec::new();
        if !is_legacy && self.nodes.get(owner).is_some_and(|n| n.animators.has_animation(id)) {
            hosts.push(owner);
        }
        let mut cursor = DescendantCursor::new(owner);
        let mut next = cursor.move_next(self);
        while let Some(handle) = next {
            let Some(node) = self.nodes.get(handle) else {
                break;
            };
            if !is_legacy && node.animations.iter().any(|a| a.id() == id) {
                next = cursor.skip_children(self);
                continue;
            }
            if node.animators.has_animation(id) {
                hosts.push(handle);
            }
            next = if is_legacy {
                cursor.skip_children(self)
            } else {
                cursor.move_next(self)
            };
        }
        hosts
    }

    /// Samples every driven animator at the animation's current time and
    /// fires the trigger keys inside `window`.
    ///
    /// Property writes happen first; triggers run afterwards, in host order,
    /// so they observe the fully applied frame.
    pub fn apply_animation_animators(&mut self, animation: AnimationRef, window: Option<TriggerWindow>) {
        let Some(anim) = self.animation(animation) else {
            return;
        };
        let id = anim.id.clone();
        let time = anim.time;
        let frame = seconds_to_frame_position(time);
        let hosts = self.animator_hosts(animation.node, id.as_deref(), anim.is_legacy);

        let mut dirty: SmallVec<[(NodeHandle, DirtyFlags); 8]> = SmallVec::new();
        let mut fired: SmallVec<[FiredTrigger; 2]> = SmallVec::new();
        for host in hosts {
            let Some(node) = self.nodes.get_mut(host) else {
                continue;
            };
            let mut mask = DirtyFlags::empty();
            for animator in node.animators.iter_mut() {
                if !animator.matches(id.as_deref()) {
                    continue;
                }
                if let Some(w) = window
                    && animator.is_trigger()
                {
                    for (key_frame, value) in animator.track.string_keys_in_range(w.from, w.to, w.include_from) {
                        fired.push(FiredTrigger {
                            node: host,
                            value: value.to_string(),
                            correction: (time - frames_to_seconds(key_frame)).max(0.0),
                        });
                    }
                }
                let Some(value) = animator.sample(frame) else {
                    continue;
                };
                if let Some(current) = node.properties.get(&animator.target_property)
                    && std::mem::discriminant(current) != std::mem::discriminant(&value)
                {
                    log::warn!(
                        "Animator for '{}' produced {}, property holds {}",
                        animator.target_property,
                        value.kind_name(),
                        current.kind_name()
                    );
                    continue;
                }
                if node.properties.set(&animator.target_property, value) {
                    mask |= dirty_flags_for(&animator.target_property);
                }
            }
            if !mask.is_empty() {
                dirty.push((host, mask));
            }
        }

        for (host, mask) in dirty {
            self.propagate_dirty_flags(host, mask);
        }
        for trigger in fired {
            self.on_trigger(trigger.node, &trigger.value, trigger.correction);
        }
    }

    /// Resolves a property path relative to `owner` into the host node and
    /// the property name.
    #[must_use]
    pub fn property_host<'p>(&self, owner: NodeHandle, path: &'p str) -> Option<(NodeHandle, &'p str)> {
        match split_property_path(path) {
            (None, property) => Some((owner, property)),
            (Some(node_path), property) => Some((self.try_find_node(owner, node_path)?, property)),
        }
    }

    /// Copies the animators of an external animation into the tree the first
    /// time the animation is used.
    pub fn load_animation(&mut self, animation: AnimationRef) {
        let Some(anim) = self.animation(animation) else {
            return;
        };
        if anim.animators_are_propagated {
            return;
        }
        let Some(path) = anim.contents_path.clone() else {
            return;
        };
        let id = anim.id.clone();
        let Some(source) = self.animation_data_source.clone() else {
            log::warn!("No animation data source to load '{path}'");
            return;
        };
        let data = match source.load_animation_data(&path) {
            Ok(data) => data,
            Err(err) => {
                log::error!("Failed to load animation '{path}': {err}");
                return;
            }
        };
        for animator in &data.animators {
            let Some((host, property)) = self.property_host(animation.node, &animator.target_property) else {
                log::warn!("No host for animated property '{}' in '{path}'", animator.target_property);
                continue;
            };
            let mut bound = animator.shared_clone();
            bound.target_property = property.to_string();
            bound.animation_id.clone_from(&id);
            if let Some(n) = self.nodes.get_mut(host) {
                n.animators.add(bound);
            }
        }
        if let Some(anim) = self.animation_mut(animation) {
            anim.animators_are_propagated = true;
        }
    }

    /// Collects the animators driven by `animation` with property paths
    /// relative to its owner.
    #[must_use]
    pub fn animation_data(&self, animation: AnimationRef) -> AnimationData {
        let mut data = AnimationData::default();
        let Some(anim) = self.animation(animation) else {
            return data;
        };
        let id = anim.id.as_deref();
        for host in self.animator_hosts(animation.node, id, anim.is_legacy) {
            let Some(node) = self.nodes.get(host) else {
                continue;
            };
            let mut prefix = String::new();
            if host != animation.node {
                prefix = format!("{}/", node.id().unwrap_or_default());
                for ancestor in self.ancestors(host).take_while(|a| *a != animation.node) {
                    let ancestor_id = self.get_node(ancestor).and_then(|n| n.id()).unwrap_or_default();
                    prefix = format!("{ancestor_id}/{prefix}");
                }
            }
            for animator in node.animators.for_animation(id) {
                let mut clone = animator.shared_clone();
                clone.target_property = format!("{prefix}{}", animator.target_property);
                data.animators.push(clone);
            }
        }
        data
    }

    /// Removes animators that belong to external animations of `node`, so
    /// they are not saved inline. They are reloaded on next use.
    pub fn remove_animators_for_external_animations(&mut self, node: NodeHandle) {
        let external: Vec<(AnimationRef, Option<String>, bool)> = match self.nodes.get(node) {
            Some(n) => n
                .animations
                .iter()
                .filter(|a| a.contents_path.is_some())
                .map(|a| {
                    (
                        AnimationRef {
                            node,
                            serial: a.serial(),
                        },
                        a.id.clone(),
                        a.is_legacy,
                    )
                })
                .collect(),
            None => return,
        };
        for (animation, id, is_legacy) in external {
            for host in self.animator_hosts(node, id.as_deref(), is_legacy) {
                if let Some(n) = self.nodes.get_mut(host) {
                    n.animators.remove_for_animation(id.as_deref());
                }
            }
            if let Some(anim) = self.animation_mut(animation) {
                anim.animators_are_propagated = false;
            }
        }
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// Reacts to a `Trigger` value reaching `node`.
    ///
    /// An empty value runs the legacy animation from `time_correction`.
    /// Otherwise the value is a comma separated list of `marker` or
    /// `marker@animation` entries, each run in turn.
    pub fn on_trigger(&mut self, node: NodeHandle, value: &str, time_correction: f64) {
        if !self.contains(node) {
            return;
        }
        if value.is_empty() {
            if let Ok(animation) = self.default_animation(node) {
                self.set_animation_time(animation, time_correction);
                self.set_animation_running(animation, true);
            }
            return;
        }
        for entry in value.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let started = match entry.split_once('@') {
                Some((marker, animation_id)) => self.try_run_animation_with_correction(
                    node,
                    Some(marker),
                    Some(animation_id),
                    time_correction,
                ),
                None => self.try_run_animation_with_correction(node, Some(entry), None, time_correction),
            };
            if !started {
                log::trace!("Trigger '{entry}' did not start on {}", self.describe(node));
            }
        }
    }
}
