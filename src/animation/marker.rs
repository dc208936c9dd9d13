use serde::{Deserialize, Serialize};

use crate::animation::utils::frames_to_seconds;

/// What happens when playback reaches a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerAction {
    #[default]
    Play,
    Stop,
    /// Continue from the marker named by [`Marker::jump_to`].
    Jump,
    /// Stop, then unlink and dispose the animation owner.
    Destroy,
}

/// Named position on an animation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: Option<String>,
    pub frame: i32,
    #[serde(default)]
    pub action: MarkerAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_to: Option<String>,
}

impl Marker {
    #[must_use]
    pub fn new(id: impl Into<String>, frame: i32, action: MarkerAction) -> Self {
        Self {
            id: Some(id.into()),
            frame,
            action,
            jump_to: None,
        }
    }

    #[must_use]
    pub fn jump(id: impl Into<String>, frame: i32, jump_to: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            frame,
            action: MarkerAction::Jump,
            jump_to: Some(jump_to.into()),
        }
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        frames_to_seconds(self.frame)
    }
}

/// Markers of one animation, ordered by frame. At most one marker per frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Marker>", from = "Vec<Marker>")]
pub struct MarkerList {
    items: Vec<Marker>,
}

impl From<Vec<Marker>> for MarkerList {
    fn from(markers: Vec<Marker>) -> Self {
        markers.into_iter().collect()
    }
}

impl From<MarkerList> for Vec<Marker> {
    fn from(list: MarkerList) -> Self {
        list.items
    }
}

impl FromIterator<Marker> for MarkerList {
    fn from_iter<I: IntoIterator<Item = Marker>>(iter: I) -> Self {
        let mut list = Self::new();
        for marker in iter {
            list.add(marker);
        }
        list
    }
}

impl MarkerList {
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

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.items.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.items.get(index)
    }

    /// Inserts keeping frame order. A marker already on that frame is replaced.
    pub fn add(&mut self, marker: Marker) {
        match self.items.binary_search_by_key(&marker.frame, |m| m.frame) {
            Ok(index) => self.items[index] = marker,
            Err(index) => self.items.insert(index, marker),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Marker> {
        let index = self.items.iter().position(|m| m.id.as_deref() == Some(id))?;
        Some(self.items.remove(index))
    }

    #[must_use]
    pub fn try_find(&self, id: &str) -> Option<&Marker> {
        self.items.iter().find(|m| m.id.as_deref() == Some(id))
    }

    #[must_use]
    pub fn get_by_frame(&self, frame: i32) -> Option<&Marker> {
        self.items
            .binary_search_by_key(&frame, |m| m.frame)
            .ok()
            .map(|i| &self.items[i])
    }

    /// First marker strictly after `frame`.
    #[must_use]
    pub fn first_after_frame(&self, frame: i32) -> Option<&Marker> {
        let index = self.items.partition_point(|m| m.frame <= frame);
        self.items.get(index)
    }

    /// First marker with an action other than `Play` whose frame lies in
    /// `(from, to]`.
    #[must_use]
    pub fn first_action_in_frames(&self, from: i32, to: i32) -> Option<&Marker> {
        let start = self.items.partition_point(|m| m.frame <= from);
        self.items[start..]
            .iter()
            .take_while(|m| m.frame <= to)
            .find(|m| m.action != MarkerAction::Play)
    }

    /// Time-based variant of [`first_action_in_frames`](Self::first_action_in_frames):
    /// markers whose time lies in `(from, to]`.
    #[must_use]
    pub fn first_action_in_time(&self, from: f64, to: f64) -> Option<&Marker> {
        const EPS: f64 = 1e-9;
        self.items
            .iter()
            .skip_while(|m| m.time() <= from + EPS)
            .take_while(|m| m.time() <= to + EPS)
            .find(|m| m.action != MarkerAction::Play)
    }
}

impl<'a> IntoIterator for &'a MarkerList {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_stay_ordered_and_unique_per_frame() {
        let mut markers = MarkerList::new();
        markers.add(Marker::new("b", 20, MarkerAction::Play));
        markers.add(Marker::new("a", 10, MarkerAction::Stop));
        markers.add(Marker::new("c", 20, MarkerAction::Stop));
        let frames: Vec<i32> = markers.iter().map(|m| m.frame).collect();
        assert_eq!(frames, vec![10, 20]);
        assert!(markers.try_find("b").is_none());
        assert_eq!(markers.first_after_frame(10).and_then(|m| m.id.as_deref()), Some("c"));
    }

    #[test]
    fn play_markers_do_not_interrupt() {
        let mut markers = MarkerList::new();
        markers.add(Marker::new("p", 5, MarkerAction::Play));
        markers.add(Marker::new("s", 8, MarkerAction::Stop));
        let hit = markers.first_action_in_frames(0, 10).unwrap();
        assert_eq!(hit.id.as_deref(), Some("s"));
        assert!(markers.first_action_in_frames(8, 10).is_none());
    }

    #[test]
    fn deserialized_markers_are_sorted() {
        let json = r#"[
            { "id": "c", "frame": 30 },
            { "id": "a", "frame": 10, "action": "Stop" },
            { "id": "b", "frame": 20 },
            { "id": "a2", "frame": 10 }
        ]"#;
        let markers: MarkerList = serde_json::from_str(json).unwrap();
        let frames: Vec<i32> = markers.iter().map(|m| m.frame).collect();
        assert_eq!(frames, vec![10, 20, 30]);
        assert_eq!(markers.get_by_frame(10).and_then(|m| m.id.as_deref()), Some("a2"));
        assert_eq!(markers.first_after_frame(5).map(|m| m.frame), Some(10));
    }
}
