use crate::animation::values::Value;
use crate::errors::{LimeError, Result};
use crate::scene::component::AssetBundlePathComponent;
use crate::scene::flags::DirtyFlags;
use crate::scene::kind::NodeKind;
use crate::scene::{NodeHandle, Scene};

/// How the content's type relates to the host's.
enum ContentFit {
    /// Content is the host's type or derives from it.
    Compatible,
    /// A 3D scene wrapped in a viewport loaded into a 3D host.
    WrappedViewport,
    /// Legacy button skin stored as a frame.
    LegacyButtonFrame,
}

impl Scene {
    /// Makes `host` take over the loaded `content` root: its animations,
    /// presenters, locked properties, components and children. The host keeps
    /// its own animators; the content root only adds animators bound to the
    /// animations it hands over. The emptied content root is disposed.
    ///
    /// Content must be the host's kind or derive from it, with two legacy
    /// exceptions: a `Viewport3D` loaded into a 3D host contributes only its
    /// first child, and a `Frame` loaded into a `Button` only passes on its
    /// asset bundle path.
    pub fn replace_content(&mut self, host: NodeHandle, content: NodeHandle) -> Result<()> {
        let host_kind = self.node_ref(host)?.kind;
        let content_kind = self.node_ref(content)?.kind;
        let fit = if content_kind.is_a(host_kind) {
            ContentFit::Compatible
        } else if content_kind == NodeKind::Viewport3D && host_kind.is_node3d() {
            ContentFit::WrappedViewport
        } else if host_kind == NodeKind::Button && content_kind == NodeKind::Frame {
            ContentFit::LegacyButtonFrame
        } else {
            return Err(LimeError::ContentTypeMismatch {
                host: host_kind.to_string(),
                content: content_kind.to_string(),
            });
        };
        log::debug!("Replacing content of {} ({content_kind})", self.describe(host));

        if let Some(n) = self.nodes.get_mut(content) {
            for component in n.components.iter_mut() {
                component.on_before_owner_clone(content);
            }
        }

        // Animations, animators and presenters.
        let (animations, animators, presenter, post_presenter, builder) = {
            let c = self.node_mut(content)?;
            (
                c.animations.take_all(),
                std::mem::take(&mut c.animators),
                c.presenter.as_ref().map(|p| p.clone_presenter().unwrap_or_else(|| p.clone())),
                c.post_presenter.as_ref().map(|p| p.clone_presenter().unwrap_or_else(|| p.clone())),
                c.render_chain_builder
                    .as_ref()
                    .map(|b| b.clone_builder().unwrap_or_else(|| b.clone())),
            )
        };
        {
            let h = self.node_mut(host)?;
            for mut stale in h.animations.take_all() {
                if stale.is_running {
                    stale.is_running = false;
                    stale.raise_stopped();
                }
            }
            let mut owned_ids = Vec::new();
            for mut animation in animations {
                animation.set_owner(Some(host));
                animation.animators_are_propagated = false;
                if !animation.is_legacy {
                    owned_ids.extend(animation.id.clone());
                }
                h.animations.push(animation);
            }
            h.running_animation_count = h.animations.running_count();
            // The host's own animators belong to the enclosing scene. Only the
            // content root's animators for animations moved above come along.
            for animator in animators.iter() {
                let Some(id) = animator.animation_id.as_deref() else {
                    continue;
                };
                if owned_ids.iter().any(|owned| owned == id)
                    && h.animators.try_find(&animator.target_property, Some(id)).is_none()
                {
                    h.animators.add(animator.shared_clone());
                }
            }
            h.presenter = presenter;
            h.post_presenter = post_presenter;
            h.render_chain_builder = builder;
        }

        // Locked properties come from the content; the host keeps the rest.
        let locked: Vec<(&'static str, Value)> = {
            let c = self.node_ref(content)?;
            c.components
                .locked_properties()
                .filter_map(|name| c.properties.get(name).map(|v| (name, v.clone())))
                .collect()
        };
        for (name, value) in locked {
            let dirty = self.node_mut(host)?.store_property(name, value);
            if !dirty.is_empty() {
                self.propagate_dirty_flags(host, dirty);
            }
        }

        // Children.
        let old_children: Vec<NodeHandle> = self.children(host).collect();
        for child in old_children {
            self.dispose(child);
        }
        let moved: Vec<NodeHandle> = match fit {
            ContentFit::WrappedViewport => self.first_child(content).into_iter().collect(),
            _ => self.children(content).collect(),
        };
        for child in moved {
            self.unlink(child);
            self.push_node(host, child)?;
        }

        // Components.
        match fit {
            ContentFit::Compatible => {
                let cloned = self.node_ref(content)?.components.clone_all();
                self.node_mut(host)?.components = cloned;
            }
            ContentFit::WrappedViewport | ContentFit::LegacyButtonFrame => {
                let path = self
                    .node_ref(content)?
                    .components
                    .get::<AssetBundlePathComponent>()
                    .cloned();
                let h = self.node_mut(host)?;
                h.components.remove::<AssetBundlePathComponent>();
                if let Some(path) = path {
                    h.components.add(path);
                }
            }
        }
        if let Some(n) = self.nodes.get_mut(host) {
            for component in n.components.iter_mut() {
                component.on_after_owner_clone(content, host);
            }
        }

        self.dispose(content);
        self.propagate_dirty_flags(host, DirtyFlags::ALL);
        Ok(())
    }
}
