//! Frame/second conversions shared by the animation runtime.

pub const FRAMES_PER_SECOND: i32 = 30;
pub const SECONDS_PER_FRAME: f64 = 1.0 / FRAMES_PER_SECOND as f64;

/// Tolerance added before flooring so that `frames_to_seconds(n)` maps back to `n`.
pub const FRAME_EPSILON: f64 = 1e-5;

#[inline]
#[must_use]
pub fn frames_to_seconds(frame: i32) -> f64 {
    f64::from(frame) * SECONDS_PER_FRAME
}

#[inline]
#[must_use]
pub fn seconds_to_frames(seconds: f64) -> i32 {
    (seconds * f64::from(FRAMES_PER_SECOND) + FRAME_EPSILON).floor() as i32
}

/// Fractional frame position used for keyframe sampling.
#[inline]
#[must_use]
pub fn seconds_to_frame_position(seconds: f64) -> f64 {
    seconds * f64::from(FRAMES_PER_SECOND)
}
