//! Pluggable playback strategies.
//!
//! An [`AnimationEngine`] decides how an animation starts, how time advances
//! across markers, and which trigger keys fire. Engines are stateless and
//! shared between animations through `Arc<dyn AnimationEngine>`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::animation::animation::AnimationRef;
use crate::animation::marker::{Marker, MarkerAction};
use crate::animation::utils::seconds_to_frames;
use crate::scene::Scene;
use crate::scene::flags::EditorFlags;

/// Frame window whose trigger keys fire during an animator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerWindow {
    pub from: i32,
    pub to: i32,
    pub include_from: bool,
}

impl TriggerWindow {
    /// Keys in `(from, to]`.
    #[must_use]
    pub fn after(from: i32, to: i32) -> Self {
        Self {
            from,
            to,
            include_from: false,
        }
    }

    /// Keys in `[from, to]`.
    #[must_use]
    pub fn inclusive(from: i32, to: i32) -> Self {
        Self {
            from,
            to,
            include_from: true,
        }
    }
}

/// Serializable selector of the built-in engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineKind {
    #[default]
    Default,
    Compatibility,
}

impl EngineKind {
    #[must_use]
    pub fn create(self) -> Arc<dyn AnimationEngine> {
        match self {
            EngineKind::Default => Arc::new(DefaultAnimationEngine),
            EngineKind::Compatibility => Arc::new(CompatibilityAnimationEngine),
        }
    }
}

pub trait AnimationEngine: Send + Sync {
    /// Built-in engine this one saves as.
    fn kind(&self) -> EngineKind {
        EngineKind::Default
    }

    /// Starts the animation, optionally at a marker. Returns `false` when the
    /// marker does not exist.
    fn try_run_animation(
        &self,
        scene: &mut Scene,
        animation: AnimationRef,
        marker_id: Option<&str>,
        time_correction: f64,
    ) -> bool;

    /// Moves a running animation forward by `delta` seconds.
    fn advance_animation(&self, scene: &mut Scene, animation: AnimationRef, delta: f64);

    /// Applies animator values at the current time, firing trigger keys on the
    /// current frame when `invoke_triggers` is set.
    fn apply_animators(&self, scene: &mut Scene, animation: AnimationRef, invoke_triggers: bool) {
        let Some(frame) = scene.animation(animation).map(|a| a.frame()) else {
            return;
        };
        let window = invoke_triggers.then(|| TriggerWindow::inclusive(frame, frame));
        scene.apply_animation_animators(animation, window);
    }

    /// Multiplier applied to fast-forward deltas by the editor scrubber.
    ///
    /// Engines with a scale other than 1 divide it back out of the deltas
    /// they receive while their owner is fast-forwarding, so the animation
    /// itself still lands on the requested frame.
    fn fast_forward_delta_scale(&self) -> f64 {
        1.0
    }
}

/// Standard playback. Trigger keys on the start frame fire when running.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnimationEngine;

impl AnimationEngine for DefaultAnimationEngine {
    fn try_run_animation(
        &self,
        scene: &mut Scene,
        animation: AnimationRef,
        marker_id: Option<&str>,
        time_correction: f64,
    ) -> bool {
        run(scene, animation, marker_id, time_correction, true)
    }

    fn advance_animation(&self, scene: &mut Scene, animation: AnimationRef, delta: f64) {
        advance(scene, animation, delta);
    }
}

/// Playback for documents saved in the legacy scene format.
///
/// Differs from [`DefaultAnimationEngine`] in that the start frame's trigger
/// keys do not fire when running, and the scrubber doubles its fast-forward
/// deltas. The animation consumes the doubled delta at normal speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityAnimationEngine;

impl AnimationEngine for CompatibilityAnimationEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Compatibility
    }

    fn try_run_animation(
        &self,
        scene: &mut Scene,
        animation: AnimationRef,
        marker_id: Option<&str>,
        time_correction: f64,
    ) -> bool {
        run(scene, animation, marker_id, time_correction, false)
    }

    fn advance_animation(&self, scene: &mut Scene, animation: AnimationRef, delta: f64) {
        let fast_forwarding = scene
            .get_node(animation.node)
            .is_some_and(|n| n.editor_flags().contains(EditorFlags::FAST_FORWARDING));
        let delta = if fast_forwarding {
            delta / self.fast_forward_delta_scale()
        } else {
            delta
        };
        advance(scene, animation, delta);
    }

    fn fast_forward_delta_scale(&self) -> f64 {
        2.0
    }
}

fn run(
    scene: &mut Scene,
    animation: AnimationRef,
    marker_id: Option<&str>,
    time_correction: f64,
    fire_start_frame: bool,
) -> bool {
    let Some(anim) = scene.animation(animation) else {
        return false;
    };
    let start_frame = match marker_id {
        Some(id) => {
            let Some(marker) = anim.markers.try_find(id) else {
                log::debug!("Marker '{id}' not found in animation {:?}", anim.id());
                return false;
            };
            let (frame, time) = (marker.frame, marker.time());
            if let Some(anim) = scene.animation_mut(animation) {
                anim.time = time + time_correction;
                anim.running_marker_id = Some(id.to_string());
            }
            frame
        }
        None => anim.frame(),
    };
    scene.set_animation_running(animation, true);
    let Some(current_frame) = scene.animation(animation).map(|a| a.frame()) else {
        return true;
    };
    let window = TriggerWindow {
        from: start_frame,
        to: current_frame.max(start_frame),
        include_from: fire_start_frame,
    };
    scene.apply_animation_animators(animation, Some(window));
    true
}

fn advance(scene: &mut Scene, animation: AnimationRef, delta: f64) {
    let ignore_markers = scene
        .get_node(animation.node)
        .is_some_and(|n| n.editor_flags().contains(EditorFlags::IGNORE_MARKERS));
    let Some(anim) = scene.animation_mut(animation) else {
        return;
    };
    if !anim.is_running {
        return;
    }

    let prev = anim.time;
    let current = prev + delta;
    let prev_frame = seconds_to_frames(prev);
    let current_frame = seconds_to_frames(current);
    let marker = if ignore_markers || delta <= 0.0 {
        None
    } else {
        anim.markers
            .first_action_in_frames(prev_frame, current_frame)
            .cloned()
    };

    let Some(marker) = marker else {
        anim.time = current;
        scene.apply_animation_animators(animation, Some(TriggerWindow::after(prev_frame, current_frame)));
        return;
    };

    match marker.action {
        MarkerAction::Stop | MarkerAction::Destroy => {
            anim.time = marker.time();
            scene.apply_animation_animators(animation, Some(TriggerWindow::after(prev_frame, marker.frame)));
            scene.set_animation_running(animation, false);
            if marker.action == MarkerAction::Destroy {
                scene.schedule_unlink_and_dispose(animation.node);
            }
        }
        MarkerAction::Jump => {
            let target: Option<Marker> = marker
                .jump_to
                .as_deref()
                .and_then(|id| anim.markers.try_find(id))
                .cloned();
            let Some(target) = target else {
                log::warn!(
                    "Jump marker {:?} points at unknown marker {:?}",
                    marker.id,
                    marker.jump_to
                );
                anim.time = current;
                scene.apply_animation_animators(animation, Some(TriggerWindow::after(prev_frame, current_frame)));
                return;
            };
            let overshoot = current - marker.time();
            anim.time = marker.time();
            scene.apply_animation_animators(animation, Some(TriggerWindow::after(prev_frame, marker.frame)));

            // Triggers fired above may have stopped or repositioned the animation.
            let Some(anim) = scene.animation_mut(animation) else {
                return;
            };
            if !anim.is_running {
                return;
            }
            anim.time = target.time() + overshoot;
            anim.running_marker_id.clone_from(&target.id);
            let landed = seconds_to_frames(anim.time);
            scene.apply_animation_animators(animation, Some(TriggerWindow::inclusive(target.frame, landed)));
        }
        MarkerAction::Play => {
            anim.time = current;
            scene.apply_animation_animators(animation, Some(TriggerWindow::after(prev_frame, current_frame)));
        }
    }
}
