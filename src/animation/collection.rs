use crate::animation::animation::{Animation, AnimationSerial};

/// Animations owned by one node.
///
/// Holds at most one legacy animation. Mutation that changes ownership goes
/// through the scene so the owner handle is always set.
#[derive(Debug, Clone, Default)]
pub struct AnimationCollection {
    items: Vec<Animation>,
}

impl AnimationCollection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Animation> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Animation> {
        self.items.iter_mut()
    }

    /// Fast path for the common single-animation node.
    #[must_use]
    pub fn first(&self) -> Option<&Animation> {
        self.items.first()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Animation> {
        self.items.get(index)
    }

    /// Finds an animation by id; `None` matches the legacy animation.
    #[must_use]
    pub fn try_find(&self, id: Option<&str>) -> Option<&Animation> {
        self.index_of(id).map(|i| &self.items[i])
    }

    pub fn try_find_mut(&mut self, id: Option<&str>) -> Option<&mut Animation> {
        self.index_of(id).map(move |i| &mut self.items[i])
    }

    #[must_use]
    pub fn index_of(&self, id: Option<&str>) -> Option<usize> {
        match id {
            None => self.items.iter().position(|a| a.is_legacy),
            Some(id) => self.items.iter().position(|a| a.id() == Some(id)),
        }
    }

    #[must_use]
    pub fn by_serial(&self, serial: AnimationSerial) -> Option<&Animation> {
        self.items.iter().find(|a| a.serial() == serial)
    }

    pub fn by_serial_mut(&mut self, serial: AnimationSerial) -> Option<&mut Animation> {
        self.items.iter_mut().find(|a| a.serial() == serial)
    }

    #[must_use]
    pub fn legacy(&self) -> Option<&Animation> {
        self.items.iter().find(|a| a.is_legacy)
    }

    #[must_use]
    pub fn running_count(&self) -> usize {
        self.items.iter().filter(|a| a.is_running()).count()
    }

    pub fn serials(&self) -> impl Iterator<Item = AnimationSerial> + '_ {
        self.items.iter().map(Animation::serial)
    }

    pub(crate) fn push(&mut self, animation: Animation) {
        if animation.is_legacy
            && let Some(index) = self.items.iter().position(|a| a.is_legacy)
        {
            log::debug!("Legacy animation replaced");
            self.items[index] = animation;
            return;
        }
        self.items.push(animation);
    }

    pub(crate) fn remove_by_serial(&mut self, serial: AnimationSerial) -> Option<Animation> {
        let index = self.items.iter().position(|a| a.serial() == serial)?;
        Some(self.items.remove(index))
    }

    pub(crate) fn take_all(&mut self) -> Vec<Animation> {
        std::mem::take(&mut self.items)
    }
}

impl<'a> IntoIterator for &'a AnimationCollection {
    type Item = &'a Animation;
    type IntoIter = std::slice::Iter<'a, Animation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
