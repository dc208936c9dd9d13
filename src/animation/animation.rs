use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::animation::engine::{AnimationEngine, DefaultAnimationEngine};
use crate::animation::marker::MarkerList;
use crate::animation::utils::{frames_to_seconds, seconds_to_frames};
use crate::scene::NodeHandle;

/// Process-unique identity of an [`Animation`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationSerial(u64);

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

impl AnimationSerial {
    fn next() -> Self {
        Self(NEXT_SERIAL.fetch_add(1, Ordering::Relaxed))
    }
}

/// Weak reference to an animation: owning node plus serial.
///
/// Resolves to nothing once the node is disposed or the animation removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationRef {
    pub node: NodeHandle,
    pub serial: AnimationSerial,
}

/// Handler kept across stops until the animation is run again.
pub type StoppedHandler = Box<dyn FnMut() + Send>;
/// Handler fired exactly once, on the next stop.
pub type AssuredStoppedHandler = Box<dyn FnOnce() + Send>;

/// A named timeline owned by a node.
///
/// Playback state changes go through [`Scene`](crate::scene::Scene) so that
/// animators, markers and the owner's running counter stay consistent.
pub struct Animation {
    pub id: Option<String>,
    pub is_legacy: bool,
    pub contents_path: Option<String>,
    pub markers: MarkerList,
    pub engine: Arc<dyn AnimationEngine>,
    pub(crate) time: f64,
    pub(crate) is_running: bool,
    pub(crate) running_marker_id: Option<String>,
    pub(crate) animators_are_propagated: bool,
    pub(crate) owner: Option<NodeHandle>,
    serial: AnimationSerial,
    pub(crate) stopped: Vec<StoppedHandler>,
    pub(crate) assured_stopped: Vec<AssuredStoppedHandler>,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("id", &self.id)
            .field("is_legacy", &self.is_legacy)
            .field("time", &self.time)
            .field("is_running", &self.is_running)
            .field("markers", &self.markers.len())
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            id: None,
            is_legacy: false,
            contents_path: None,
            markers: MarkerList::new(),
            engine: Arc::new(DefaultAnimationEngine),
            time: 0.0,
            is_running: false,
            running_marker_id: None,
            animators_are_propagated: false,
            owner: None,
            serial: AnimationSerial::next(),
            stopped: Vec::new(),
            assured_stopped: Vec::new(),
        }
    }
}

impl Clone for Animation {
    /// Detached copy with a fresh serial and no subscribers.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            is_legacy: self.is_legacy,
            contents_path: self.contents_path.clone(),
            markers: self.markers.clone(),
            engine: self.engine.clone(),
            time: self.time,
            is_running: self.is_running,
            running_marker_id: self.running_marker_id.clone(),
            animators_are_propagated: false,
            owner: None,
            serial: AnimationSerial::next(),
            stopped: Vec::new(),
            assured_stopped: Vec::new(),
        }
    }
}

impl Animation {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The default animation driven by `Trigger` values without an animation id.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            is_legacy: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn AnimationEngine>) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn with_markers(mut self, markers: MarkerList) -> Self {
        self.markers = markers;
        self
    }

    #[must_use]
    pub fn with_contents_path(mut self, path: impl Into<String>) -> Self {
        self.contents_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn serial(&self) -> AnimationSerial {
        self.serial
    }

    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    /// Reference usable after the borrow ends. `None` while detached.
    #[must_use]
    pub fn as_ref(&self) -> Option<AnimationRef> {
        self.owner.map(|node| AnimationRef {
            node,
            serial: self.serial,
        })
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub fn frame(&self) -> i32 {
        seconds_to_frames(self.time)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    #[must_use]
    pub fn running_marker_id(&self) -> Option<&str> {
        self.running_marker_id.as_deref()
    }

    #[must_use]
    pub fn animators_are_propagated(&self) -> bool {
        self.animators_are_propagated
    }

    /// Time of the first marker after the current frame.
    #[must_use]
    pub fn next_marker_time(&self) -> Option<f64> {
        self.markers
            .first_after_frame(self.frame())
            .map(|m| frames_to_seconds(m.frame))
    }

    /// Subscribes to stops of the current run. Cleared when the animation is run again.
    pub fn on_stopped(&mut self, handler: impl FnMut() + Send + 'static) {
        self.stopped.push(Box::new(handler));
    }

    /// Subscribes to the next stop. Fires immediately when not running.
    pub fn on_assured_stopped(&mut self, handler: impl FnOnce() + Send + 'static) {
        if self.is_running {
            self.assured_stopped.push(Box::new(handler));
        } else {
            handler();
        }
    }

    pub(crate) fn set_owner(&mut self, owner: Option<NodeHandle>) {
        self.owner = owner;
    }

    pub(crate) fn raise_stopped(&mut self) {
        for handler in &mut self.stopped {
            handler();
        }
        for handler in std::mem::take(&mut self.assured_stopped) {
            handler();
        }
    }
}
