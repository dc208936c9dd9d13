use serde::{Deserialize, Serialize};

use crate::animation::values::Interpolatable;

/// Interpolation applied on the segment that starts at a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyFunction {
    /// Hold the key value until the next key.
    Steep,
    #[default]
    Linear,
    /// Catmull-Rom through the neighbouring keys, clamped at the ends.
    Spline,
    /// Catmull-Rom whose neighbours wrap around the first and last keys.
    ClosedSpline,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Per-consumer sampling position, so sequential playback stays O(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Keys sorted by frame, stored as parallel arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack<T: Interpolatable> {
    frames: Vec<i32>,
    values: Vec<T>,
    functions: Vec<KeyFunction>,
}

impl<T: Interpolatable> Default for KeyframeTrack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            values: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Builds a track from `(frame, value, function)` triples in any order.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = (i32, T, KeyFunction)>) -> Self {
        let mut track = Self::new();
        for (frame, value, function) in keys {
            track.insert(frame, value, function);
        }
        track
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn frames(&self) -> &[i32] {
        &self.frames
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[must_use]
    pub fn functions(&self) -> &[KeyFunction] {
        &self.functions
    }

    /// Iterates keys in frame order.
    pub fn keys(&self) -> impl Iterator<Item = (i32, &T, KeyFunction)> + '_ {
        self.frames
            .iter()
            .zip(self.values.iter())
            .zip(self.functions.iter())
            .map(|((f, v), k)| (*f, v, *k))
    }

    /// Inserts a key, replacing an existing key at the same frame.
    pub fn insert(&mut self, frame: i32, value: T, function: KeyFunction) {
        match self.frames.binary_search(&frame) {
            Ok(index) => {
                self.values[index] = value;
                self.functions[index] = function;
            }
            Err(index) => {
                self.frames.insert(index, frame);
                self.values.insert(index, value);
                self.functions.insert(index, function);
            }
        }
    }

    /// Removes the key at `frame`, returning its value.
    pub fn remove(&mut self, frame: i32) -> Option<T> {
        let index = self.frames.binary_search(&frame).ok()?;
        self.frames.remove(index);
        self.functions.remove(index);
        Some(self.values.remove(index))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.values.clear();
        self.functions.clear();
    }

    /// Keys whose frame lies in `(from, to]`, or `[from, to]` when `include_from` is set.
    pub fn keys_in_range(
        &self,
        from: i32,
        to: i32,
        include_from: bool,
    ) -> impl Iterator<Item = (i32, &T)> + '_ {
        let start = if include_from {
            self.frames.partition_point(|&f| f < from)
        } else {
            self.frames.partition_point(|&f| f <= from)
        };
        let end = self.frames.partition_point(|&f| f <= to).max(start);
        self.frames[start..end]
            .iter()
            .zip(self.values[start..end].iter())
            .map(|(f, v)| (*f, v))
    }

    /// Samples the track at a fractional frame. Out-of-range positions clamp
    /// to the first or last key.
    #[must_use]
    pub fn sample(&self, frame: f64) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let next_idx = self.frames.partition_point(|&f| f64::from(f) <= frame);
        Some(self.sample_segment(next_idx.saturating_sub(1), frame))
    }

    /// Like [`sample`](Self::sample) but starts the segment search at the
    /// cursor, falling back to a binary search on large jumps.
    pub fn sample_with_cursor(&self, frame: f64, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.frames.len();
        if len == 0 {
            return None;
        }
        if len == 1 {
            return Some(self.values[0].clone());
        }

        let i = cursor.last_index.min(len - 1);
        let at = |idx: usize| f64::from(self.frames[idx]);

        let found = if frame >= at(i) {
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if frame >= at(len - 1) {
                        res = Some(len - 1);
                    }
                    break;
                }
                if frame < at(idx + 1) {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            let mut res = None;
            for offset in 1..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if frame >= at(idx) {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let index = found.unwrap_or_else(|| {
            let next_idx = self.frames.partition_point(|&f| f64::from(f) <= frame);
            next_idx.saturating_sub(1)
        });
        cursor.last_index = index;
        Some(self.sample_segment(index, frame))
    }

    fn sample_segment(&self, index: usize, frame: f64) -> T {
        let len = self.frames.len();
        if index >= len - 1 || frame <= f64::from(self.frames[index]) {
            return self.values[index.min(len - 1)].clone();
        }

        let next = index + 1;
        let f0 = f64::from(self.frames[index]);
        let f1 = f64::from(self.frames[next]);
        let t = (((frame - f0) / (f1 - f0)) as f32).clamp(0.0, 1.0);

        if T::DISCRETE {
            return self.values[index].clone();
        }

        match self.functions[index] {
            KeyFunction::Steep => self.values[index].clone(),
            KeyFunction::Linear => {
                T::interpolate_linear(&self.values[index], &self.values[next], t)
            }
            KeyFunction::Spline => {
                let p0 = &self.values[index.saturating_sub(1)];
                let p3 = &self.values[(next + 1).min(len - 1)];
                T::interpolate_spline(p0, &self.values[index], &self.values[next], p3, t)
            }
            KeyFunction::ClosedSpline => {
                let p0 = &self.values[if index == 0 { len - 1 } else { index - 1 }];
                let p3 = &self.values[if next + 1 >= len { 0 } else { next + 1 }];
                T::interpolate_spline(p0, &self.values[index], &self.values[next], p3, t)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> KeyframeTrack<f32> {
        KeyframeTrack::from_keys([
            (0, 0.0, KeyFunction::Linear),
            (10, 10.0, KeyFunction::Steep),
            (20, 30.0, KeyFunction::Linear),
        ])
    }

    #[test]
    fn cursor_matches_binary_search() {
        let track = ramp();
        let mut cursor = KeyframeCursor::default();
        for step in 0..50 {
            let frame = f64::from(step) * 0.5;
            let a = track.sample(frame).unwrap();
            let b = track.sample_with_cursor(frame, &mut cursor).unwrap();
            assert!((a - b).abs() < 1e-5, "frame {frame}: {a} vs {b}");
        }
        let a = track.sample(3.0).unwrap();
        let b = track.sample_with_cursor(3.0, &mut cursor).unwrap();
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn keys_in_range_respects_bounds() {
        let track = ramp();
        let open: Vec<i32> = track.keys_in_range(0, 10, false).map(|(f, _)| f).collect();
        assert_eq!(open, vec![10]);
        let closed: Vec<i32> = track.keys_in_range(0, 10, true).map(|(f, _)| f).collect();
        assert_eq!(closed, vec![0, 10]);
        assert_eq!(track.keys_in_range(11, 19, false).count(), 0);
    }
}
