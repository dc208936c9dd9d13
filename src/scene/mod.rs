//! Scene tree.
//!
//! - [`Scene`]: arena of nodes with intrusive parent/child/sibling links
//! - [`Node`]: identity, properties, animations, animators and attachments
//! - Dirty-flag propagation, lookup by id path and pre-order traversal
//! - Per-frame update, cloning, disposal and external content replacement
//! - Render chain collection through [`Presenter`](presenter::Presenter)s

pub mod behaviour;
pub mod component;
pub mod content;
pub mod find;
pub mod flags;
pub mod kind;
pub mod lifecycle;
pub mod node;
pub mod presenter;
pub mod properties;
pub mod render;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod traverse;
pub mod update;

pub use behaviour::{Task, TaskStatus, UpdateHandler};
pub use component::{AssetBundlePathComponent, NodeComponent, NodeComponentCollection};
pub use flags::{DirtyFlags, EditorFlags};
pub use kind::NodeKind;
pub use node::Node;
pub use presenter::{Presenter, RenderChain, RenderChainBuilder, RenderList, RenderObject};
pub use scene::{NodeBuilder, Scene};
pub use traverse::{DescendantCursor, Descendants};

use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked handle to a [`Node`] in a [`Scene`].
    pub struct NodeHandle;
}
