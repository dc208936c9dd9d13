use crate::scene::behaviour::BehaviourStage;
use crate::scene::{NodeHandle, Scene};

impl Scene {
    /// Advances `node` and its subtree by `delta` seconds.
    ///
    /// Deltas above `settings.max_delta` are split into several steps. Each
    /// step runs, in order: updating handlers, tasks, the node's running
    /// animations, every child with its own `animation_speed`, late tasks and
    /// updated handlers.
    pub fn update(&mut self, node: NodeHandle, delta: f32) {
        self.update_depth += 1;
        let max_delta = self.settings.max_delta;
        if max_delta > 0.0 && delta > max_delta {
            self.safe_update(node, delta, max_delta);
        } else {
            self.update_step(node, delta);
        }
        self.update_depth -= 1;
        if self.update_depth == 0 {
            self.flush_pending_disposal();
        }
    }

    fn safe_update(&mut self, node: NodeHandle, mut delta: f32, max_delta: f32) {
        while delta > max_delta {
            self.update_step(node, max_delta);
            delta -= max_delta;
        }
        if delta > 0.0 {
            self.update_step(node, delta);
        }
    }

    fn update_step(&mut self, node: NodeHandle, delta: f32) {
        if !self.contains(node) {
            return;
        }
        self.run_behaviours(node, BehaviourStage::Updating, delta);
        self.run_behaviours(node, BehaviourStage::Tasks, delta);
        self.advance_node_animations(node, f64::from(delta));

        let mut child = self.first_child(node);
        while let Some(c) = child {
            child = self.next_sibling(c);
            let Some(speed) = self.get_node(c).map(|n| n.animation_speed) else {
                continue;
            };
            self.update(c, delta * speed);
        }

        self.run_behaviours(node, BehaviourStage::LateTasks, delta);
        self.run_behaviours(node, BehaviourStage::Updated, delta);
    }

    /// Queues `node` to be unlinked and disposed once the current update pass ends.
    pub fn schedule_unlink_and_dispose(&mut self, node: NodeHandle) {
        if !self.pending_disposal.contains(&node) {
            self.pending_disposal.push(node);
        }
        if self.update_depth == 0 {
            self.flush_pending_disposal();
        }
    }

    pub(crate) fn flush_pending_disposal(&mut self) {
        for node in std::mem::take(&mut self.pending_disposal) {
            self.unlink_and_dispose(node);
        }
    }
}
