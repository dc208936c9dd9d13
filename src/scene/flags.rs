use bitflags::bitflags;

bitflags! {
    /// Cached state that must be recomputed before the next render.
    ///
    /// Set on a node and all its descendants through
    /// [`Scene::propagate_dirty_flags`](crate::scene::Scene::propagate_dirty_flags).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u32 {
        const VISIBLE                  = 1 << 0;
        const COLOR                    = 1 << 1;
        const SHADER                   = 1 << 2;
        const BLENDING                 = 1 << 3;
        const LAYOUT_MANAGER           = 1 << 4;
        const LOCAL_TRANSFORM          = 1 << 5;
        const GLOBAL_TRANSFORM         = 1 << 6;
        const GLOBAL_TRANSFORM_INVERSE = 1 << 7;
        const PARENT_BOUNDING_RECT     = 1 << 8;
        const ENABLED                  = 1 << 9;

        const TRANSFORM = Self::LOCAL_TRANSFORM.bits()
            | Self::GLOBAL_TRANSFORM.bits()
            | Self::GLOBAL_TRANSFORM_INVERSE.bits();
        const ALL = u32::MAX;
    }
}

bitflags! {
    /// Editor-only state bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EditorFlags: u32 {
        const HIDDEN               = 1 << 0;
        const LOCKED               = 1 << 1;
        const SHOWN                = 1 << 2;
        const PROPERTIES_EXPANDED  = 1 << 3;
        const CHILDREN_EXPANDED    = 1 << 4;
        const HIDDEN_ON_EXPOSITION = 1 << 5;
        /// Markers are not processed while advancing this node's animations.
        const IGNORE_MARKERS       = 1 << 6;
        const DISPLAY_CONTENT      = 1 << 7;
        /// Three bits of editor label color.
        const COLOR_BITS           = 0b111 << 8;
        const SCENE_NODE           = 1 << 11;
        /// Set on a subtree while the editor fast-forwards its timeline.
        const FAST_FORWARDING      = 1 << 12;
    }
}
