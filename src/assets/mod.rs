//! Scene assets.
//!
//! - [`AssetBundle`]: file access by bundle-relative path
//! - [`NodeDescription`]: serde form of a node subtree
//! - [`SceneLoader`]: scene resolution, external scene mounting and `.ant`
//!   animation data

pub mod bundle;
pub mod description;
pub mod loader;

pub use bundle::{AssetBundle, DirectoryBundle, MemoryBundle};
pub use description::{
    AnimationDataDescription, AnimationDescription, AnimatorDescription, KeyDescription, NodeDescription,
};
pub use loader::{SCENE_EXTENSIONS, SceneLoader};

use crate::animation::data::AnimationData;
use crate::errors::Result;

/// Provides the animators of animations stored outside their scene.
pub trait AnimationDataSource: Send + Sync {
    /// Loads the animation data stored for an animation `contents_path`.
    fn load_animation_data(&self, contents_path: &str) -> Result<AnimationData>;
}
