use std::sync::atomic::{AtomicBool, Ordering};

/// Global audio toggle the editor mutes while it seeks the timeline.
pub trait AudioSwitch: Send + Sync {
    fn globally_enabled(&self) -> bool;

    fn set_globally_enabled(&self, enabled: bool);

    /// Stops every playing sound.
    fn stop_all(&self) {}
}

/// [`AudioSwitch`] backed by a single flag, for hosts without an audio backend.
#[derive(Debug)]
pub struct AtomicAudioSwitch {
    enabled: AtomicBool,
}

impl Default for AtomicAudioSwitch {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl AudioSwitch for AtomicAudioSwitch {
    fn globally_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn set_globally_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Disables audio until dropped, then restores the previous state.
pub(crate) struct MuteGuard<'a> {
    audio: &'a dyn AudioSwitch,
    was_enabled: bool,
}

impl<'a> MuteGuard<'a> {
    pub(crate) fn new(audio: &'a dyn AudioSwitch) -> Self {
        let was_enabled = audio.globally_enabled();
        audio.set_globally_enabled(false);
        Self { audio, was_enabled }
    }
}

impl Drop for MuteGuard<'_> {
    fn drop(&mut self) {
        self.audio.set_globally_enabled(self.was_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_previous_state() {
        let audio = AtomicAudioSwitch::default();
        {
            let _mute = MuteGuard::new(&audio);
            assert!(!audio.globally_enabled());
        }
        assert!(audio.globally_enabled());

        audio.set_globally_enabled(false);
        {
            let _mute = MuteGuard::new(&audio);
        }
        assert!(!audio.globally_enabled());
    }
}
