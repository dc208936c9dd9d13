//! Process-wide map from property value types to animator track factories.
//!
//! Built-in value kinds are registered up front. Any enum type is animatable
//! through the generic enum track. Other named types need an explicit
//! [`AnimatorRegistry::add`], normally at startup.
//!
//! The registry lives behind a `RwLock`; registration after startup is
//! allowed but the caller is responsible for not racing it with scene loads.

use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::animation::animator::{Animator, AnimatorTrack};
use crate::animation::values::ValueType;
use crate::errors::{LimeError, Result};

/// Builds an empty track for the given value type.
pub type AnimatorFactory = fn(&ValueType) -> AnimatorTrack;

pub struct AnimatorRegistry {
    factories: FxHashMap<ValueType, AnimatorFactory>,
}

static INSTANCE: OnceLock<RwLock<AnimatorRegistry>> = OnceLock::new();

impl Default for AnimatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn enum_factory(value_type: &ValueType) -> AnimatorTrack {
    AnimatorTrack::new_enum(value_type.name())
}

impl AnimatorRegistry {
    /// Registry with all built-in value kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            factories: FxHashMap::default(),
        };
        registry.add(ValueType::Float, |_| AnimatorTrack::new_float());
        registry.add(ValueType::Int, |_| AnimatorTrack::new_int());
        registry.add(ValueType::Bool, |_| AnimatorTrack::new_bool());
        registry.add(ValueType::Vector2, |_| AnimatorTrack::new_vector2());
        registry.add(ValueType::Vector3, |_| AnimatorTrack::new_vector3());
        registry.add(ValueType::Quaternion, |_| AnimatorTrack::new_quaternion());
        registry.add(ValueType::Color4, |_| AnimatorTrack::new_color());
        registry.add(ValueType::String, |_| AnimatorTrack::new_string());
        registry
    }

    /// The shared process-wide registry.
    pub fn instance() -> &'static RwLock<AnimatorRegistry> {
        INSTANCE.get_or_init(|| RwLock::new(AnimatorRegistry::new()))
    }

    pub fn add(&mut self, value_type: ValueType, factory: AnimatorFactory) {
        if self.factories.insert(value_type.clone(), factory).is_some() {
            log::debug!("Animator factory for {} replaced", value_type.name());
        }
    }

    #[must_use]
    pub fn contains(&self, value_type: &ValueType) -> bool {
        value_type.is_enum() || self.factories.contains_key(value_type)
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &ValueType> {
        self.factories.keys()
    }

    /// Creates an empty track for `value_type`.
    pub fn create_track(&self, value_type: &ValueType) -> Result<AnimatorTrack> {
        if let Some(factory) = self.factories.get(value_type) {
            return Ok(factory(value_type));
        }
        if value_type.is_enum() {
            return Ok(enum_factory(value_type));
        }
        Err(LimeError::UnregisteredAnimatorType {
            type_name: value_type.name().to_string(),
        })
    }

    /// Fails on the first value type that could not be animated.
    pub fn ensure_registered<'a>(
        &self,
        value_types: impl IntoIterator<Item = &'a ValueType>,
    ) -> Result<()> {
        for value_type in value_types {
            if !self.contains(value_type) {
                return Err(LimeError::UnregisteredAnimatorType {
                    type_name: value_type.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Creates an animator for `property` using the shared registry.
pub fn create_animator(
    property: impl Into<String>,
    value_type: &ValueType,
    animation_id: Option<&str>,
) -> Result<Animator> {
    let track = AnimatorRegistry::instance().read().create_track(value_type)?;
    let mut animator = Animator::new(property, track);
    animator.animation_id = animation_id.map(str::to_string);
    Ok(animator)
}
