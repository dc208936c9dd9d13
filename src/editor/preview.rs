use crate::animation::animation::AnimationRef;
use crate::editor::frame_setter::FrameSetter;
use crate::scene::{NodeHandle, Scene};

/// Editor playback of an animation that can be stopped without losing the
/// edited state: animation times are saved on start and restored on stop.
#[derive(Debug, Default)]
pub struct AnimationPreview {
    saved_times: Vec<(AnimationRef, f64)>,
    container: Option<NodeHandle>,
    animation: Option<AnimationRef>,
    begin_frame: i32,
}

impl AnimationPreview {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.animation.is_some()
    }

    /// Frame the running preview started from.
    #[must_use]
    pub fn begin_frame(&self) -> i32 {
        self.begin_frame
    }

    /// Starts previewing `animation`, owned by or below `container`.
    ///
    /// With `trigger_markers_before_current_frame` the document is first
    /// replayed from frame 0 so triggers before the current frame take effect.
    pub fn start(
        &mut self,
        scene: &mut Scene,
        setter: &mut FrameSetter,
        root: NodeHandle,
        container: NodeHandle,
        animation: AnimationRef,
        trigger_markers_before_current_frame: bool,
    ) {
        if self.is_active() {
            return;
        }
        self.save_animation_times(scene, root, container);
        let Some(saved_frame) = scene.animation(animation).map(|a| a.frame()) else {
            return;
        };
        setter.set_cache_animation_states(true);
        if trigger_markers_before_current_frame {
            setter.set_current_frame(scene, root, 0, animation, true, false);
        }
        scene.set_animation_running(animation, true);
        if trigger_markers_before_current_frame {
            setter.fast_forward_to_frame(scene, animation, saved_frame);
        }
        setter.set_cache_animation_states(false);
        self.begin_frame = saved_frame;
        self.container = Some(container);
        self.animation = Some(animation);
    }

    /// Stops the preview. Unless `stop_on_current_frame` is set, the saved
    /// animation times are restored and the document returns to the frame the
    /// preview started from.
    pub fn stop(
        &mut self,
        scene: &mut Scene,
        setter: &mut FrameSetter,
        root: NodeHandle,
        animation_mode: bool,
        stop_on_current_frame: bool,
    ) {
        let (Some(animation), Some(container)) = (self.animation.take(), self.container.take()) else {
            return;
        };
        scene.stop_animation(animation);
        scene.stop_animations_recursive(container);
        if !stop_on_current_frame {
            for (saved, time) in std::mem::take(&mut self.saved_times) {
                scene.set_animation_time(saved, time);
            }
            setter.set_current_frame(scene, root, self.begin_frame, animation, animation_mode, false);
        }
        self.saved_times.clear();
        setter.audio().stop_all();

        setter.set_cache_animation_states(true);
        if let Some(frame) = scene.animation(animation).map(|a| a.frame()) {
            setter.set_current_frame(scene, root, frame, animation, animation_mode, true);
        }
        setter.set_cache_animation_states(false);
    }

    /// Records every animation time below `container`, of `container` itself
    /// and of its ancestors up to `root`.
    fn save_animation_times(&mut self, scene: &Scene, root: NodeHandle, container: NodeHandle) {
        self.saved_times.clear();
        let mut nodes: Vec<NodeHandle> = scene.descendants(container).collect();
        nodes.push(container);
        nodes.extend(
            scene
                .ancestors(container)
                .take_while(|a| scene.same_or_descendant_of(*a, root)),
        );
        for node in nodes {
            let Some(n) = scene.get_node(node) else {
                continue;
            };
            for animation in n.animations().iter() {
                self.saved_times.push((
                    AnimationRef {
                        node,
                        serial: animation.serial(),
                    },
                    animation.time(),
                ));
            }
        }
    }
}
