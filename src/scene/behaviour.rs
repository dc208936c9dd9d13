use crate::scene::{NodeHandle, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Completed,
}

/// Work stepped once per node update until it completes.
pub trait Task: Send {
    fn step(&mut self, scene: &mut Scene, node: NodeHandle, delta: f32) -> TaskStatus;
}

impl<F> Task for F
where
    F: FnMut(&mut Scene, NodeHandle, f32) -> TaskStatus + Send,
{
    fn step(&mut self, scene: &mut Scene, node: NodeHandle, delta: f32) -> TaskStatus {
        self(scene, node, delta)
    }
}

pub type UpdateHandler = Box<dyn FnMut(&mut Scene, NodeHandle, f32) + Send>;

/// Per-node update hooks. Never copied by clone.
#[derive(Default)]
pub struct NodeBehaviours {
    pub(crate) updating: Vec<UpdateHandler>,
    pub(crate) updated: Vec<UpdateHandler>,
    pub(crate) tasks: Vec<Box<dyn Task>>,
    pub(crate) late_tasks: Vec<Box<dyn Task>>,
}

impl NodeBehaviours {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updating.is_empty()
            && self.updated.is_empty()
            && self.tasks.is_empty()
            && self.late_tasks.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum BehaviourStage {
    Updating,
    Tasks,
    LateTasks,
    Updated,
}

impl Scene {
    pub fn add_task(&mut self, node: NodeHandle, task: impl Task + 'static) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.behaviours.tasks.push(Box::new(task));
        }
    }

    /// Adds a task stepped after the node's children are updated.
    pub fn add_late_task(&mut self, node: NodeHandle, task: impl Task + 'static) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.behaviours.late_tasks.push(Box::new(task));
        }
    }

    pub fn on_updating(&mut self, node: NodeHandle, handler: impl FnMut(&mut Scene, NodeHandle, f32) + Send + 'static) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.behaviours.updating.push(Box::new(handler));
        }
    }

    pub fn on_updated(&mut self, node: NodeHandle, handler: impl FnMut(&mut Scene, NodeHandle, f32) + Send + 'static) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.behaviours.updated.push(Box::new(handler));
        }
    }

    /// Runs one update stage of `node`. Handlers and tasks are taken out of the
    /// node while they run, so they may freely mutate the scene; anything they
    /// register in the meantime is kept after the existing entries.
    pub(crate) fn run_behaviours(&mut self, node: NodeHandle, stage: BehaviourStage, delta: f32) {
        match stage {
            BehaviourStage::Updating | BehaviourStage::Updated => {
                let Some(n) = self.nodes.get_mut(node) else {
                    return;
                };
                let list = match stage {
                    BehaviourStage::Updating => &mut n.behaviours.updating,
                    _ => &mut n.behaviours.updated,
                };
                if list.is_empty() {
                    return;
                }
                let mut handlers = std::mem::take(list);
                for handler in &mut handlers {
                    handler(self, node, delta);
                }
                if let Some(n) = self.nodes.get_mut(node) {
                    let list = match stage {
                        BehaviourStage::Updating => &mut n.behaviours.updating,
                        _ => &mut n.behaviours.updated,
                    };
                    handlers.append(list);
                    *list = handlers;
                }
            }
            BehaviourStage::Tasks | BehaviourStage::LateTasks => {
                let Some(n) = self.nodes.get_mut(node) else {
                    return;
                };
                let list = match stage {
                    BehaviourStage::Tasks => &mut n.behaviours.tasks,
                    _ => &mut n.behaviours.late_tasks,
                };
                if list.is_empty() {
                    return;
                }
                let mut tasks = std::mem::take(list);
                tasks.retain_mut(|task| task.step(self, node, delta) == TaskStatus::Running);
                if let Some(n) = self.nodes.get_mut(node) {
                    let list = match stage {
                        BehaviourStage::Tasks => &mut n.behaviours.tasks,
                        _ => &mut n.behaviours.late_tasks,
                    };
                    tasks.append(list);
                    *list = tasks;
                }
            }
        }
    }
}
