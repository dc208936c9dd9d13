//! Editor-side timeline tools: scrubbing with a state cache, preview playback
//! and the audio switch they mute while seeking.

pub mod audio;
pub mod frame_setter;
pub mod preview;

pub use audio::{AtomicAudioSwitch, AudioSwitch};
pub use frame_setter::{AnimationState, FrameSetter};
pub use preview::AnimationPreview;
