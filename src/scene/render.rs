use crate::scene::presenter::RenderChain;
use crate::scene::{NodeHandle, Scene};

impl Scene {
    /// Adds `node` and its visible subtree to `chain`.
    ///
    /// A node with a custom [`RenderChainBuilder`](crate::scene::presenter::RenderChainBuilder)
    /// delegates to it; otherwise hidden nodes are skipped entirely.
    pub fn add_to_render_chain(&self, node: NodeHandle, chain: &mut dyn RenderChain) {
        let Some(n) = self.get_node(node) else {
            return;
        };
        if let Some(builder) = &n.render_chain_builder {
            builder.add_to_render_chain(self, node, chain);
            return;
        }
        if n.is_visible() {
            self.add_self_and_children_to_render_chain(node, chain);
        }
    }

    /// Default contribution of a node: its post-presenter, its children from
    /// the last (topmost) to the first, then its own presenter, all on the
    /// node's layer when it sets one.
    pub fn add_self_and_children_to_render_chain(&self, node: NodeHandle, chain: &mut dyn RenderChain) {
        let Some(n) = self.get_node(node) else {
            return;
        };
        let saved_layer = chain.current_layer();
        if n.layer != 0 {
            chain.set_current_layer(n.layer);
        }
        if let Some(post) = &n.post_presenter {
            chain.add(node, post.clone());
        }
        let mut child = n.last_child;
        while let Some(c) = child {
            self.add_to_render_chain(c, chain);
            child = self.get_node(c).and_then(|cn| cn.prev_sibling);
        }
        if let Some(presenter) = &n.presenter {
            chain.add(node, presenter.clone());
        }
        chain.set_current_layer(saved_layer);
    }
}
