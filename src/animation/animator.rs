use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};

use crate::animation::tracks::{KeyFunction, KeyframeCursor, KeyframeTrack};
use crate::animation::values::{Color4, EnumValue, Value, ValueType};
use crate::errors::{LimeError, Result};

/// Type-erased keyframe storage of an [`Animator`].
///
/// Key data sits behind an `Arc`; cloning a track shares the keys and
/// mutation goes through copy-on-write.
#[derive(Debug, Clone)]
pub enum AnimatorTrack {
    Float(Arc<KeyframeTrack<f32>>),
    Int(Arc<KeyframeTrack<i32>>),
    Bool(Arc<KeyframeTrack<bool>>),
    Vector2(Arc<KeyframeTrack<Vec2>>),
    Vector3(Arc<KeyframeTrack<Vec3>>),
    Quaternion(Arc<KeyframeTrack<Quat>>),
    Color(Arc<KeyframeTrack<Color4>>),
    String(Arc<KeyframeTrack<String>>),
    Enum {
        type_name: Arc<str>,
        track: Arc<KeyframeTrack<EnumValue>>,
    },
}

macro_rules! for_each_track {
    ($self:expr, $track:ident => $body:expr) => {
        match $self {
            AnimatorTrack::Float($track) => $body,
            AnimatorTrack::Int($track) => $body,
            AnimatorTrack::Bool($track) => $body,
            AnimatorTrack::Vector2($track) => $body,
            AnimatorTrack::Vector3($track) => $body,
            AnimatorTrack::Quaternion($track) => $body,
            AnimatorTrack::Color($track) => $body,
            AnimatorTrack::String($track) => $body,
            AnimatorTrack::Enum { track: $track, .. } => $body,
        }
    };
}

impl AnimatorTrack {
    #[must_use]
    pub fn new_float() -> Self {
        Self::Float(Arc::default())
    }

    #[must_use]
    pub fn new_int() -> Self {
        Self::Int(Arc::default())
    }

    #[must_use]
    pub fn new_bool() -> Self {
        Self::Bool(Arc::default())
    }

    #[must_use]
    pub fn new_vector2() -> Self {
        Self::Vector2(Arc::default())
    }

    #[must_use]
    pub fn new_vector3() -> Self {
        Self::Vector3(Arc::default())
    }

    #[must_use]
    pub fn new_quaternion() -> Self {
        Self::Quaternion(Arc::default())
    }

    #[must_use]
    pub fn new_color() -> Self {
        Self::Color(Arc::default())
    }

    #[must_use]
    pub fn new_string() -> Self {
        Self::String(Arc::default())
    }

    #[must_use]
    pub fn new_enum(type_name: &str) -> Self {
        Self::Enum {
            type_name: Arc::from(type_name),
            track: Arc::default(),
        }
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            AnimatorTrack::Float(_) => ValueType::Float,
            AnimatorTrack::Int(_) => ValueType::Int,
            AnimatorTrack::Bool(_) => ValueType::Bool,
            AnimatorTrack::Vector2(_) => ValueType::Vector2,
            AnimatorTrack::Vector3(_) => ValueType::Vector3,
            AnimatorTrack::Quaternion(_) => ValueType::Quaternion,
            AnimatorTrack::Color(_) => ValueType::Color4,
            AnimatorTrack::String(_) => ValueType::String,
            AnimatorTrack::Enum { type_name, .. } => ValueType::Enum(type_name.to_string()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        for_each_track!(self, t => t.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn frames(&self) -> &[i32] {
        for_each_track!(self, t => t.frames())
    }

    #[must_use]
    pub fn functions(&self) -> &[KeyFunction] {
        for_each_track!(self, t => t.functions())
    }

    /// Key values converted to [`Value`], in frame order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        match self {
            AnimatorTrack::Float(t) => t.values().iter().map(|v| Value::Float(*v)).collect(),
            AnimatorTrack::Int(t) => t.values().iter().map(|v| Value::Int(*v)).collect(),
            AnimatorTrack::Bool(t) => t.values().iter().map(|v| Value::Bool(*v)).collect(),
            AnimatorTrack::Vector2(t) => t.values().iter().map(|v| Value::Vector2(*v)).collect(),
            AnimatorTrack::Vector3(t) => t.values().iter().map(|v| Value::Vector3(*v)).collect(),
            AnimatorTrack::Quaternion(t) => {
                t.values().iter().map(|v| Value::Quaternion(*v)).collect()
            }
            AnimatorTrack::Color(t) => t.values().iter().map(|v| Value::Color(*v)).collect(),
            AnimatorTrack::String(t) => {
                t.values().iter().map(|v| Value::String(v.clone())).collect()
            }
            AnimatorTrack::Enum { track, .. } => {
                track.values().iter().map(|v| Value::Enum(*v)).collect()
            }
        }
    }

    /// True when both tracks point at the same key storage.
    #[must_use]
    pub fn shares_keys_with(&self, other: &AnimatorTrack) -> bool {
        match (self, other) {
            (AnimatorTrack::Float(a), AnimatorTrack::Float(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Int(a), AnimatorTrack::Int(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Bool(a), AnimatorTrack::Bool(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Vector2(a), AnimatorTrack::Vector2(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Vector3(a), AnimatorTrack::Vector3(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Quaternion(a), AnimatorTrack::Quaternion(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Color(a), AnimatorTrack::Color(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::String(a), AnimatorTrack::String(b)) => Arc::ptr_eq(a, b),
            (AnimatorTrack::Enum { track: a, .. }, AnimatorTrack::Enum { track: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }

    /// Copy of the track with its own key storage.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        match self {
            AnimatorTrack::Float(t) => AnimatorTrack::Float(Arc::new((**t).clone())),
            AnimatorTrack::Int(t) => AnimatorTrack::Int(Arc::new((**t).clone())),
            AnimatorTrack::Bool(t) => AnimatorTrack::Bool(Arc::new((**t).clone())),
            AnimatorTrack::Vector2(t) => AnimatorTrack::Vector2(Arc::new((**t).clone())),
            AnimatorTrack::Vector3(t) => AnimatorTrack::Vector3(Arc::new((**t).clone())),
            AnimatorTrack::Quaternion(t) => AnimatorTrack::Quaternion(Arc::new((**t).clone())),
            AnimatorTrack::Color(t) => AnimatorTrack::Color(Arc::new((**t).clone())),
            AnimatorTrack::String(t) => AnimatorTrack::String(Arc::new((**t).clone())),
            AnimatorTrack::Enum { type_name, track } => AnimatorTrack::Enum {
                type_name: type_name.clone(),
                track: Arc::new((**track).clone()),
            },
        }
    }

    /// Inserts or replaces a key. The value kind must match the track.
    pub fn insert(&mut self, frame: i32, value: Value, function: KeyFunction) -> Result<()> {
        let expected = self.value_type();
        match (self, value) {
            (AnimatorTrack::Float(t), Value::Float(v)) => Arc::make_mut(t).insert(frame, v, function),
            (AnimatorTrack::Int(t), Value::Int(v)) => Arc::make_mut(t).insert(frame, v, function),
            (AnimatorTrack::Bool(t), Value::Bool(v)) => Arc::make_mut(t).insert(frame, v, function),
            (AnimatorTrack::Vector2(t), Value::Vector2(v)) => {
                Arc::make_mut(t).insert(frame, v, function);
            }
            (AnimatorTrack::Vector3(t), Value::Vector3(v)) => {
                Arc::make_mut(t).insert(frame, v, function);
            }
            (AnimatorTrack::Quaternion(t), Value::Quaternion(v)) => {
                Arc::make_mut(t).insert(frame, v, function);
            }
            (AnimatorTrack::Color(t), Value::Color(v)) => Arc::make_mut(t).insert(frame, v, function),
            (AnimatorTrack::String(t), Value::String(v)) => {
                Arc::make_mut(t).insert(frame, v, function);
            }
            (AnimatorTrack::Enum { track, .. }, Value::Enum(v)) => {
                Arc::make_mut(track).insert(frame, v, function);
            }
            (_, other) => {
                return Err(LimeError::PropertyTypeMismatch {
                    property: format!("<key {frame}>"),
                    expected: static_kind_name(&expected),
                    found: other.kind_name(),
                });
            }
        }
        Ok(())
    }

    /// Removes the key at `frame`. Returns whether a key existed.
    pub fn remove(&mut self, frame: i32) -> bool {
        for_each_track!(self, t => Arc::make_mut(t).remove(frame).is_some())
    }

    pub fn clear(&mut self) {
        for_each_track!(self, t => Arc::make_mut(t).clear());
    }

    /// Samples the track at a fractional frame position.
    pub fn sample(&self, frame: f64, cursor: &mut KeyframeCursor) -> Option<Value> {
        Some(match self {
            AnimatorTrack::Float(t) => Value::Float(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::Int(t) => Value::Int(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::Bool(t) => Value::Bool(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::Vector2(t) => Value::Vector2(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::Vector3(t) => Value::Vector3(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::Quaternion(t) => {
                Value::Quaternion(t.sample_with_cursor(frame, cursor)?)
            }
            AnimatorTrack::Color(t) => Value::Color(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::String(t) => Value::String(t.sample_with_cursor(frame, cursor)?),
            AnimatorTrack::Enum { track, .. } => Value::Enum(track.sample_with_cursor(frame, cursor)?),
        })
    }

    /// String keys whose frame lies inside the window, for trigger dispatch.
    pub fn string_keys_in_range(
        &self,
        from: i32,
        to: i32,
        include_from: bool,
    ) -> impl Iterator<Item = (i32, &str)> + '_ {
        let keys = match self {
            AnimatorTrack::String(t) => Some(t.keys_in_range(from, to, include_from)),
            _ => None,
        };
        keys.into_iter().flatten().map(|(f, v)| (f, v.as_str()))
    }
}

fn static_kind_name(value_type: &ValueType) -> &'static str {
    match value_type {
        ValueType::Float => "Float",
        ValueType::Int => "Int",
        ValueType::Bool => "Bool",
        ValueType::Vector2 => "Vector2",
        ValueType::Vector3 => "Vector3",
        ValueType::Quaternion => "Quaternion",
        ValueType::Color4 => "Color4",
        ValueType::String => "String",
        ValueType::Enum(_) => "Enum",
        ValueType::Other(_) => "Other",
    }
}

/// Drives one property of a node from a keyframe track.
///
/// An animator with `animation_id == None` belongs to the legacy (default)
/// animation of its owner.
#[derive(Debug, Clone)]
pub struct Animator {
    pub target_property: String,
    pub animation_id: Option<String>,
    pub track: AnimatorTrack,
    cursor: KeyframeCursor,
}

impl Animator {
    #[must_use]
    pub fn new(target_property: impl Into<String>, track: AnimatorTrack) -> Self {
        Self {
            target_property: target_property.into(),
            animation_id: None,
            track,
            cursor: KeyframeCursor::default(),
        }
    }

    #[must_use]
    pub fn with_animation_id(mut self, animation_id: impl Into<String>) -> Self {
        self.animation_id = Some(animation_id.into());
        self
    }

    /// Adds a key and returns `self`, for building animators inline.
    pub fn key(mut self, frame: i32, value: Value, function: KeyFunction) -> Result<Self> {
        self.track.insert(frame, value, function)?;
        Ok(self)
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.track.value_type()
    }

    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.target_property == crate::scene::properties::TRIGGER
    }

    #[must_use]
    pub fn matches(&self, animation_id: Option<&str>) -> bool {
        self.animation_id.as_deref() == animation_id
    }

    /// Clone that shares the key storage with `self`.
    #[must_use]
    pub fn shared_clone(&self) -> Self {
        Self {
            target_property: self.target_property.clone(),
            animation_id: self.animation_id.clone(),
            track: self.track.clone(),
            cursor: KeyframeCursor::default(),
        }
    }

    /// Clone with independent key storage.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            target_property: self.target_property.clone(),
            animation_id: self.animation_id.clone(),
            track: self.track.deep_clone(),
            cursor: KeyframeCursor::default(),
        }
    }

    #[must_use]
    pub fn shares_keys_with(&self, other: &Animator) -> bool {
        self.track.shares_keys_with(&other.track)
    }

    /// Value of the animated property at a fractional frame position.
    pub fn sample(&mut self, frame: f64) -> Option<Value> {
        self.track.sample(frame, &mut self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_checks_value_kind() {
        let mut track = AnimatorTrack::new_float();
        assert!(track.insert(0, Value::Float(1.0), KeyFunction::Linear).is_ok());
        let err = track.insert(5, Value::Bool(true), KeyFunction::Linear);
        assert!(matches!(err, Err(LimeError::PropertyTypeMismatch { .. })));
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn mutation_after_shared_clone_detaches() {
        let mut a = AnimatorTrack::new_float();
        a.insert(0, Value::Float(1.0), KeyFunction::Linear).unwrap();
        let b = a.clone();
        assert!(a.shares_keys_with(&b));
        a.insert(10, Value::Float(2.0), KeyFunction::Linear).unwrap();
        assert!(!a.shares_keys_with(&b));
        assert_eq!(b.len(), 1);
        assert_eq!(a.len(), 2);
    }
}
