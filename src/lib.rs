#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod editor;
pub mod engine;
pub mod errors;
pub mod scene;
pub mod settings;

pub use animation::{
    Animation, AnimationEngine, AnimationRef, Animator, AnimatorRegistry, AnimatorTrack, EngineKind, KeyFunction,
    Marker, MarkerAction, MarkerList, Value, ValueType,
};
pub use assets::{AssetBundle, MemoryBundle, NodeDescription, SceneLoader};
pub use editor::{AnimationPreview, FrameSetter};
pub use engine::{Engine, PreparedFrame};
pub use errors::{LimeError, Result};
pub use scene::{DirtyFlags, EditorFlags, Node, NodeHandle, NodeKind, Scene};
pub use settings::{EngineSettings, ScrubSettings};
