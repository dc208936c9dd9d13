use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime node type.
///
/// Forms a single-inheritance hierarchy rooted at [`NodeKind::Node`]; content
/// replacement uses [`NodeKind::is_a`] to decide whether loaded content may
/// stand in for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Node,
    Widget,
    Frame,
    Button,
    Image,
    SimpleText,
    Viewport3D,
    Node3D,
    Model3D,
    Camera3D,
    Audio,
}

impl NodeKind {
    /// Direct base kind.
    #[must_use]
    pub fn base(self) -> Option<NodeKind> {
        match self {
            NodeKind::Node => None,
            NodeKind::Widget | NodeKind::Node3D | NodeKind::Audio => Some(NodeKind::Node),
            NodeKind::Frame
            | NodeKind::Button
            | NodeKind::Image
            | NodeKind::SimpleText
            | NodeKind::Viewport3D => Some(NodeKind::Widget),
            NodeKind::Model3D | NodeKind::Camera3D => Some(NodeKind::Node3D),
        }
    }

    /// True when `self` equals `other` or derives from it.
    #[must_use]
    pub fn is_a(self, other: NodeKind) -> bool {
        let mut kind = Some(self);
        while let Some(k) = kind {
            if k == other {
                return true;
            }
            kind = k.base();
        }
        false
    }

    #[must_use]
    pub fn is_widget(self) -> bool {
        self.is_a(NodeKind::Widget)
    }

    #[must_use]
    pub fn is_node3d(self) -> bool {
        self.is_a(NodeKind::Node3D)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
