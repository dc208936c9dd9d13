use glam::{Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Values that can be blended between two keyframes.
///
/// Discrete kinds (strings, booleans, enum discriminants) set [`DISCRETE`](Self::DISCRETE)
/// and always hold the value of the left keyframe of a segment.
pub trait Interpolatable: Clone + PartialEq + Sized {
    const DISCRETE: bool = false;

    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;

    /// Catmull-Rom interpolation between `p1` and `p2`.
    ///
    /// Kinds without a meaningful spline fall back to linear blending.
    fn interpolate_spline(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f32) -> Self {
        let _ = (p0, p3);
        Self::interpolate_linear(p1, p2, t)
    }
}

#[inline]
fn catmull_rom(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_spline(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f32) -> Self {
        catmull_rom(t, *p0, *p1, *p2, *p3)
    }
}

impl Interpolatable for i32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        (*start as f32 + (*end - *start) as f32 * t).round() as i32
    }
}

impl Interpolatable for bool {
    const DISCRETE: bool = true;

    fn interpolate_linear(start: &Self, _end: &Self, _t: f32) -> Self {
        *start
    }
}

impl Interpolatable for String {
    const DISCRETE: bool = true;

    fn interpolate_linear(start: &Self, _end: &Self, _t: f32) -> Self {
        start.clone()
    }
}

impl Interpolatable for Vec2 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }

    fn interpolate_spline(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f32) -> Self {
        Vec2::new(
            catmull_rom(t, p0.x, p1.x, p2.x, p3.x),
            catmull_rom(t, p0.y, p1.y, p2.y, p3.y),
        )
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }

    fn interpolate_spline(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f32) -> Self {
        Vec3::new(
            catmull_rom(t, p0.x, p1.x, p2.x, p3.x),
            catmull_rom(t, p0.y, p1.y, p2.y, p3.y),
            catmull_rom(t, p0.z, p1.z, p2.z, p3.z),
        )
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.slerp(*end, t)
    }

    fn interpolate_spline(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f32) -> Self {
        let (a, b, c, d) = (
            Vec4::from(*p0),
            Vec4::from(*p1),
            Vec4::from(*p2),
            Vec4::from(*p3),
        );
        let v = Vec4::new(
            catmull_rom(t, a.x, b.x, c.x, d.x),
            catmull_rom(t, a.y, b.y, c.y, d.y),
            catmull_rom(t, a.z, b.z, c.z, d.z),
            catmull_rom(t, a.w, b.w, c.w, d.w),
        );
        Quat::from_vec4(v).normalize()
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color4 {
    pub const WHITE: Color4 = Color4::new(255, 255, 255, 255);
    pub const BLACK: Color4 = Color4::new(0, 0, 0, 255);
    pub const TRANSPARENT: Color4 = Color4::new(0, 0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color4 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Interpolatable for Color4 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        let channel = |a: u8, b: u8| -> u8 {
            (f32::from(a) + (f32::from(b) - f32::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Color4 {
            r: channel(start.r, end.r),
            g: channel(start.g, end.g),
            b: channel(start.b, end.b),
            a: channel(start.a, end.a),
        }
    }
}

/// Discriminant of a dynamically typed enum property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EnumValue(pub i32);

impl Interpolatable for EnumValue {
    const DISCRETE: bool = true;

    fn interpolate_linear(start: &Self, _end: &Self, _t: f32) -> Self {
        *start
    }
}

/// A property value stored on a node or produced by an animator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vector2(Vec2),
    Vector3(Vec3),
    Quaternion(Quat),
    Color(Color4),
    String(String),
    Enum(EnumValue),
}

impl Value {
    /// Short name of the value kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Float(_) => "Float",
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::Vector2(_) => "Vector2",
            Value::Vector3(_) => "Vector3",
            Value::Quaternion(_) => "Quaternion",
            Value::Color(_) => "Color4",
            Value::String(_) => "String",
            Value::Enum(_) => "Enum",
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vector2(&self) -> Option<Vec2> {
        match self {
            Value::Vector2(v) => Some(*v),
            _ => None,
        }
    }
}

/// Registry key describing the value type of an animated property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Float,
    Int,
    Bool,
    Vector2,
    Vector3,
    Quaternion,
    Color4,
    String,
    /// A named enum type; any enum is animatable through the generic enum animator.
    Enum(String),
    /// Any other named type. Only animatable once registered explicitly.
    Other(String),
}

impl ValueType {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ValueType::Float => "Float",
            ValueType::Int => "Int",
            ValueType::Bool => "Bool",
            ValueType::Vector2 => "Vector2",
            ValueType::Vector3 => "Vector3",
            ValueType::Quaternion => "Quaternion",
            ValueType::Color4 => "Color4",
            ValueType::String => "String",
            ValueType::Enum(name) | ValueType::Other(name) => name,
        }
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self, ValueType::Enum(_))
    }
}
