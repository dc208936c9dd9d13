//! Node animation: keyframed animators, marker-driven timelines and the
//! engines that play them.

pub mod animation;
pub mod animator;
pub mod animators;
pub mod collection;
pub mod data;
pub mod engine;
pub mod marker;
pub mod registry;
pub mod system;
pub mod tracks;
pub mod utils;
pub mod values;

pub use animation::{Animation, AnimationRef, AnimationSerial};
pub use animator::{Animator, AnimatorTrack};
pub use animators::AnimatorCollection;
pub use collection::AnimationCollection;
pub use data::AnimationData;
pub use engine::{AnimationEngine, EngineKind, CompatibilityAnimationEngine, DefaultAnimationEngine, TriggerWindow};
pub use marker::{Marker, MarkerAction, MarkerList};
pub use registry::{AnimatorRegistry, create_animator};
pub use tracks::{KeyFunction, KeyframeCursor, KeyframeTrack};
pub use values::{Color4, EnumValue, Interpolatable, Value, ValueType};
