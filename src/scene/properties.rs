//! Named property storage and the dirty state each well-known property affects.

use rustc_hash::FxHashMap;

use crate::animation::values::Value;
use crate::scene::flags::DirtyFlags;

pub const POSITION: &str = "Position";
pub const SCALE: &str = "Scale";
pub const ROTATION: &str = "Rotation";
pub const PIVOT: &str = "Pivot";
pub const SIZE: &str = "Size";
pub const COLOR: &str = "Color";
pub const VISIBLE: &str = "Visible";
pub const SHADER: &str = "Shader";
pub const BLENDING: &str = "Blending";
pub const ENABLED: &str = "Enabled";
pub const PADDING: &str = "Padding";
pub const TEXT: &str = "Text";
/// String property whose keys start animations.
pub const TRIGGER: &str = "Trigger";

/// Dirty state invalidated by a change of `property`.
#[must_use]
pub fn dirty_flags_for(property: &str) -> DirtyFlags {
    match property {
        POSITION | SCALE | ROTATION | PIVOT => DirtyFlags::TRANSFORM,
        SIZE => DirtyFlags::TRANSFORM | DirtyFlags::PARENT_BOUNDING_RECT | DirtyFlags::LAYOUT_MANAGER,
        COLOR => DirtyFlags::COLOR,
        VISIBLE => DirtyFlags::VISIBLE,
        SHADER => DirtyFlags::SHADER,
        BLENDING => DirtyFlags::BLENDING,
        ENABLED => DirtyFlags::ENABLED,
        PADDING => DirtyFlags::LAYOUT_MANAGER,
        _ => DirtyFlags::empty(),
    }
}

/// Property values of a node, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: FxHashMap<String, Value>,
}

impl PropertyBag {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Stores `value`; returns `true` when the stored value changed.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(current) if *current == value => false,
            Some(current) => {
                *current = value;
                true
            }
            None => {
                self.values.insert(name.to_string(), value);
                true
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
