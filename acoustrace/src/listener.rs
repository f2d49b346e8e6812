//! Listener tracking.

use crate::math::{Pose, Vec3};
use crate::zone::ZoneId;
use std::collections::BTreeMap;
use std::time::Duration;

/// Point of view from which source parameters are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerState {
    pub location: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// Units per second, derived from consecutive updates
    pub velocity: Vec3,
    pub index: usize,
    /// Zone resolved on the last zone update, if any
    pub current_zone: Option<ZoneId>,
}

impl ListenerState {
    fn new(index: usize, pose: &Pose) -> Self {
        Self {
            location: pose.position,
            forward: pose.forward(),
            right: pose.right(),
            up: pose.up(),
            velocity: Vec3::ZERO,
            index,
            current_zone: None,
        }
    }
}

#[derive(Debug)]
struct TrackedListener {
    state: ListenerState,
    last_update: Duration,
}

/// Holds every active listener by index.
///
/// Listener 0 is the primary listener used for ranking, occlusion and
/// reflections.
#[derive(Debug, Default)]
pub struct ListenerTracker {
    listeners: BTreeMap<usize, TrackedListener>,
}

impl ListenerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or moves a listener. `now` is a monotonic clock sample used to
    /// derive velocity.
    pub fn update(&mut self, index: usize, pose: &Pose, now: Duration) {
        if let Some(tracked) = self.listeners.get_mut(&index) {
            let elapsed = now.saturating_sub(tracked.last_update).as_secs_f32();
            let previous = tracked.state.location;
            let zone = tracked.state.current_zone;
            tracked.state = ListenerState::new(index, pose);
            tracked.state.current_zone = zone;
            if elapsed > 0.0 {
                tracked.state.velocity = (pose.position - previous) / elapsed;
            }
            tracked.last_update = now;
        } else {
            log::debug!("Listener {} activated at {:?}", index, pose.position);
            self.listeners.insert(
                index,
                TrackedListener {
                    state: ListenerState::new(index, pose),
                    last_update: now,
                },
            );
        }
    }

    /// Deactivates a listener. Other indices are unaffected.
    pub fn remove(&mut self, index: usize) -> Option<ListenerState> {
        self.listeners.remove(&index).map(|t| t.state)
    }

    pub fn get(&self, index: usize) -> Option<&ListenerState> {
        self.listeners.get(&index).map(|t| &t.state)
    }

    pub(crate) fn set_zone(&mut self, index: usize, zone: Option<ZoneId>) {
        if let Some(tracked) = self.listeners.get_mut(&index) {
            tracked.state.current_zone = zone;
        }
    }

    /// The listener that drives ranking and tracing.
    pub fn primary(&self) -> Option<&ListenerState> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListenerState> {
        self.listeners.values().map(|t| &t.state)
    }

    /// Number of active listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
