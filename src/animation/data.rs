use crate::animation::animator::Animator;

/// Animators of one animation, detached from the tree.
///
/// Each animator's `target_property` holds a path relative to the animation
/// owner: the slash-separated ids of the host node followed by the property
/// name, e.g. `"Body/Arm/Rotation"`.
#[derive(Debug, Clone, Default)]
pub struct AnimationData {
    pub animators: Vec<Animator>,
}

impl AnimationData {
    /// Bundle path of the serialized data for an animation contents path.
    #[must_use]
    pub fn bundle_path(contents_path: &str) -> String {
        format!("{}.ant", contents_path.replace('|', "_"))
    }
}

/// Splits a property path into the host node path and the property name.
#[must_use]
pub fn split_property_path(path: &str) -> (Option<&str>, &str) {
    match path.rfind('/') {
        Some(index) => (Some(&path[..index]), &path[index + 1..]),
        None => (None, path),
    }
}
