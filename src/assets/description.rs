//! Serialized form of node subtrees, animations and animators.
//!
//! A [`NodeDescription`] is plain data: it holds no handles and can be parsed
//! on any thread. [`Scene::instantiate`] turns it into live nodes;
//! [`Scene::describe_subtree`] produces it back from the tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::animation::animation::Animation;
use crate::animation::animator::Animator;
use crate::animation::data::AnimationData;
use crate::animation::engine::EngineKind;
use crate::animation::marker::MarkerList;
use crate::animation::registry::create_animator;
use crate::animation::tracks::KeyFunction;
use crate::animation::values::{Value, ValueType};
use crate::errors::{LimeError, Result};
use crate::scene::flags::EditorFlags;
use crate::scene::kind::NodeKind;
use crate::scene::node::Node;
use crate::scene::{NodeHandle, Scene};

fn default_speed() -> f32 {
    1.0
}

fn is_default_speed(speed: &f32) -> bool {
    (*speed - 1.0).abs() < f32::EPSILON
}

/// One node and its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// External scene mounted in place of this node's children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents_path: Option<String>,
    #[serde(default = "default_speed", skip_serializing_if = "is_default_speed")]
    pub animation_speed: f32,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub editor_flags: u32,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<AnimationDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animators: Vec<AnimatorDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDescription>,
}

impl Default for NodeDescription {
    fn default() -> Self {
        Self::new(NodeKind::Node)
    }
}

impl NodeDescription {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            tag: None,
            contents_path: None,
            animation_speed: 1.0,
            layer: 0,
            editor_flags: 0,
            properties: BTreeMap::new(),
            animations: Vec::new(),
            animators: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_contents_path(mut self, path: impl Into<String>) -> Self {
        self.contents_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: NodeDescription) -> Self {
        self.children.push(child);
        self
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Value types of every animator in the subtree.
    pub fn animator_value_types(&self) -> impl Iterator<Item = &ValueType> {
        let mut stack = vec![self];
        let mut types = Vec::new();
        while let Some(desc) = stack.pop() {
            types.extend(desc.animators.iter().map(|a| &a.value_type));
            stack.extend(desc.children.iter());
        }
        types.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_legacy: bool,
    /// Animators live in `<contents_path>.ant` instead of the scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents_path: Option<String>,
    #[serde(default)]
    pub markers: MarkerList,
    #[serde(default)]
    pub engine: EngineKind,
}

impl AnimationDescription {
    /// Builds the animation. A legacy animation can not carry an id.
    pub fn to_animation(&self) -> Result<Animation> {
        let animation = match (&self.id, self.is_legacy) {
            (Some(id), false) => Animation::new(id.clone()),
            (None, _) => Animation::legacy(),
            (Some(id), true) => {
                return Err(LimeError::InvalidDescription {
                    reason: format!("legacy animation can not have id '{id}'"),
                });
            }
        };
        let animation = animation
            .with_markers(self.markers.clone())
            .with_engine(self.engine.create());
        Ok(match &self.contents_path {
            Some(path) => animation.with_contents_path(path.clone()),
            None => animation,
        })
    }

    #[must_use]
    pub fn from_animation(animation: &Animation) -> Self {
        Self {
            id: animation.id.clone(),
            is_legacy: animation.is_legacy,
            contents_path: animation.contents_path.clone(),
            markers: animation.markers.clone(),
            engine: animation.engine.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDescription {
    pub frame: i32,
    pub value: Value,
    #[serde(default)]
    pub function: KeyFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatorDescription {
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_id: Option<String>,
    pub value_type: ValueType,
    #[serde(default)]
    pub keys: Vec<KeyDescription>,
}

impl AnimatorDescription {
    /// Builds the animator through the shared registry.
    pub fn to_animator(&self) -> Result<Animator> {
        let mut animator = create_animator(self.property.as_str(), &self.value_type, self.animation_id.as_deref())?;
        for key in &self.keys {
            animator.track.insert(key.frame, key.value.clone(), key.function)?;
        }
        Ok(animator)
    }

    #[must_use]
    pub fn from_animator(animator: &Animator) -> Self {
        let keys = animator
            .track
            .frames()
            .iter()
            .zip(animator.track.values())
            .zip(animator.track.functions())
            .map(|((frame, value), function)| KeyDescription {
                frame: *frame,
                value,
                function: *function,
            })
            .collect();
        Self {
            property: animator.target_property.clone(),
            animation_id: animator.animation_id.clone(),
            value_type: animator.value_type(),
            keys,
        }
    }
}

/// Contents of an `.ant` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationDataDescription {
    #[serde(default)]
    pub animators: Vec<AnimatorDescription>,
}

impl AnimationDataDescription {
    pub fn to_data(&self) -> Result<AnimationData> {
        let animators = self
            .animators
            .iter()
            .map(AnimatorDescription::to_animator)
            .collect::<Result<Vec<_>>>()?;
        Ok(AnimationData { animators })
    }

    #[must_use]
    pub fn from_data(data: &AnimationData) -> Self {
        Self {
            animators: data.animators.iter().map(AnimatorDescription::from_animator).collect(),
        }
    }
}

impl Scene {
    /// Creates a detached subtree from `description` and returns its root.
    ///
    /// Fails without leaving nodes behind when an animator can not be built.
    pub fn instantiate(&mut self, description: &NodeDescription) -> Result<NodeHandle> {
        let root = self.instantiate_node(description)?;
        if let Err(err) = self.instantiate_children(root, description) {
            self.dispose(root);
            return Err(err);
        }
        Ok(root)
    }

    fn instantiate_node(&mut self, description: &NodeDescription) -> Result<NodeHandle> {
        let mut node = Node::new(description.kind);
        node.id.clone_from(&description.id);
        node.tag.clone_from(&description.tag);
        node.contents_path.clone_from(&description.contents_path);
        node.animation_speed = description.animation_speed;
        node.layer = description.layer;
        node.editor_flags = EditorFlags::from_bits_truncate(description.editor_flags);
        for (name, value) in &description.properties {
            node.properties.set(name, value.clone());
        }
        for animator in &description.animators {
            node.animators.add(animator.to_animator()?);
        }
        for animation in &description.animations {
            node.animations.push(animation.to_animation()?);
        }
        node.running_animation_count = node.animations.running_count();
        Ok(self.insert_node(node))
    }

    fn instantiate_children(&mut self, parent: NodeHandle, description: &NodeDescription) -> Result<()> {
        for child in &description.children {
            let handle = self.instantiate_node(child)?;
            self.push_node(parent, handle)?;
            self.instantiate_children(handle, child)?;
        }
        Ok(())
    }

    /// Serializable snapshot of `node` and its subtree.
    ///
    /// Animators loaded from external animation data are included; call
    /// [`remove_animators_for_external_animations`](Self::remove_animators_for_external_animations)
    /// first to keep them out.
    pub fn describe_subtree(&self, node: NodeHandle) -> Result<NodeDescription> {
        let n = self.node_ref(node)?;
        let mut description = NodeDescription {
            kind: n.kind,
            id: n.id.clone(),
            tag: n.tag.clone(),
            contents_path: n.contents_path.clone(),
            animation_speed: n.animation_speed,
            layer: n.layer,
            editor_flags: n.editor_flags.bits(),
            properties: n
                .properties
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            animations: n.animations.iter().map(AnimationDescription::from_animation).collect(),
            animators: n.animators.iter().map(AnimatorDescription::from_animator).collect(),
            children: Vec::new(),
        };
        for child in self.children(node) {
            description.children.push(self.describe_subtree(child)?);
        }
        Ok(description)
    }
}
