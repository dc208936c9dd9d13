use crate::animation::animator::Animator;

/// Animators attached to a single node, unique per `(property, animation_id)`.
#[derive(Debug, Clone, Default)]
pub struct AnimatorCollection {
    items: Vec<Animator>,
}

impl AnimatorCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Animator> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Animator> {
        self.items.iter_mut()
    }

    /// Adds an animator, replacing one that drives the same property for the
    /// same animation.
    pub fn add(&mut self, animator: Animator) {
        match self.position(&animator.target_property, animator.animation_id.as_deref()) {
            Some(index) => self.items[index] = animator,
            None => self.items.push(animator),
        }
    }

    #[must_use]
    pub fn try_find(&self, property: &str, animation_id: Option<&str>) -> Option<&Animator> {
        self.position(property, animation_id).map(|i| &self.items[i])
    }

    pub fn try_find_mut(
        &mut self,
        property: &str,
        animation_id: Option<&str>,
    ) -> Option<&mut Animator> {
        self.position(property, animation_id)
            .map(move |i| &mut self.items[i])
    }

    pub fn remove(&mut self, property: &str, animation_id: Option<&str>) -> Option<Animator> {
        self.position(property, animation_id)
            .map(|i| self.items.remove(i))
    }

    /// Removes every animator bound to `animation_id`, returning how many were removed.
    pub fn remove_for_animation(&mut self, animation_id: Option<&str>) -> usize {
        let before = self.items.len();
        self.items.retain(|a| !a.matches(animation_id));
        before - self.items.len()
    }

    /// Drops animators without keys.
    pub fn remove_empty(&mut self) {
        self.items.retain(|a| !a.track.is_empty());
    }

    #[must_use]
    pub fn has_animation(&self, animation_id: Option<&str>) -> bool {
        self.items.iter().any(|a| a.matches(animation_id))
    }

    pub fn for_animation<'a>(
        &'a self,
        animation_id: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Animator> + 'a {
        self.items.iter().filter(move |a| a.matches(animation_id))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Copy whose animators share key storage with this collection.
    #[must_use]
    pub fn shared_clone(&self) -> Self {
        Self {
            items: self.items.iter().map(Animator::shared_clone).collect(),
        }
    }

    fn position(&self, property: &str, animation_id: Option<&str>) -> Option<usize> {
        self.items
            .iter()
            .position(|a| a.target_property == property && a.matches(animation_id))
    }
}

impl<'a> IntoIterator for &'a AnimatorCollection {
    type Item = &'a Animator;
    type IntoIter = std::slice::Iter<'a, Animator>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
