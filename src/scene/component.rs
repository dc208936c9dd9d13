use std::any::{Any, TypeId};

use crate::scene::NodeHandle;

/// Data attached to a node that participates in its clone and dispose lifecycle.
pub trait NodeComponent: Any + Send {
    /// Copy attached to the clone of the owner.
    fn clone_component(&self) -> Box<dyn NodeComponent>;

    /// Called on the source node's components before its subtree is cloned.
    fn on_before_owner_clone(&mut self, _owner: NodeHandle) {}

    /// Called on the clone's components once the whole subtree is copied.
    fn on_after_owner_clone(&mut self, _original: NodeHandle, _clone: NodeHandle) {}

    fn on_owner_disposed(&mut self) {}

    /// Properties the owner must keep from external content when the content
    /// replaces it.
    fn locked_properties(&self) -> &[&'static str] {
        &[]
    }
}

/// Components of a node, at most one per concrete type.
#[derive(Default)]
pub struct NodeComponentCollection {
    items: Vec<Box<dyn NodeComponent>>,
}

impl std::fmt::Debug for NodeComponentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeComponentCollection")
            .field("len", &self.items.len())
            .finish()
    }
}

impl NodeComponentCollection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds a component, replacing one of the same type.
    pub fn add<T: NodeComponent>(&mut self, component: T) {
        self.add_boxed(Box::new(component));
    }

    pub fn add_boxed(&mut self, component: Box<dyn NodeComponent>) {
        let type_id = (*component).type_id();
        match self.items.iter().position(|c| (**c).type_id() == type_id) {
            Some(index) => self.items[index] = component,
            None => self.items.push(component),
        }
    }

    #[must_use]
    pub fn get<T: NodeComponent>(&self) -> Option<&T> {
        self.items.iter().find_map(|c| {
            let any: &dyn Any = &**c;
            any.downcast_ref::<T>()
        })
    }

    pub fn get_mut<T: NodeComponent>(&mut self) -> Option<&mut T> {
        self.items.iter_mut().find_map(|c| {
            let any: &mut dyn Any = &mut **c;
            any.downcast_mut::<T>()
        })
    }

    #[must_use]
    pub fn contains<T: NodeComponent>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.items.iter().any(|c| (**c).type_id() == type_id)
    }

    pub fn remove<T: NodeComponent>(&mut self) -> Option<Box<dyn NodeComponent>> {
        let type_id = TypeId::of::<T>();
        let index = self.items.iter().position(|c| (**c).type_id() == type_id)?;
        Some(self.items.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NodeComponent> {
        self.items.iter().map(|c| &**c)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn NodeComponent>> {
        self.items.iter_mut()
    }

    /// Names of all properties locked by any component.
    pub fn locked_properties(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.items
            .iter()
            .flat_map(|c| c.locked_properties().iter().copied())
    }

    pub(crate) fn clone_all(&self) -> Self {
        Self {
            items: self.items.iter().map(|c| c.clone_component()).collect(),
        }
    }

    pub(crate) fn dispose_all(&mut self) {
        for component in &mut self.items {
            component.on_owner_disposed();
        }
        self.items.clear();
    }
}

/// Records which bundle scene a node was instantiated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBundlePathComponent {
    pub path: String,
}

impl AssetBundlePathComponent {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl NodeComponent for AssetBundlePathComponent {
    fn clone_component(&self) -> Box<dyn NodeComponent> {
        Box::new(self.clone())
    }
}
