//! Registered sources and their per-frame scheduling state.

use super::params::SourceParams;
use crate::config::{DetailLevel, SourceSettings};
use crate::math::Vec3;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// A sound emitter in the host scene.
///
/// The engine only keeps a weak reference. Once the last `Arc` is dropped
/// the source is skipped and pruned at the end of the next tick.
pub trait AcousticSource: Send + Sync {
    /// World position of the emitter.
    fn location(&self) -> Vec3;

    /// Scheduling settings, read once per tick.
    fn settings(&self) -> SourceSettings {
        SourceSettings::default()
    }

    /// Receives the params published for this source at the end of a tick.
    fn on_params_updated(&self, _params: &SourceParams) {}
}

/// Stable handle returned when registering a source.
///
/// Handles are assigned monotonically and never reused, so their order is
/// registration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceHandle(pub(crate) u64);

impl SourceHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceHandle({})", self.0)
    }
}

/// Scheduler bookkeeping for one registered source.
#[derive(Clone)]
pub struct SourceEntry {
    pub handle: SourceHandle,
    pub(crate) source: Weak<dyn AcousticSource>,
    pub current_params: SourceParams,
    pub previous_params: SourceParams,
    pub priority_score: f32,
    pub effective_level: DetailLevel,
    /// Clock sample of the last occlusion trace
    pub last_occlusion_update: Option<Duration>,
    /// Clock sample of the last reflection trace
    pub last_reflection_update: Option<Duration>,
    pub is_audible: bool,
}

impl SourceEntry {
    pub(crate) fn new(handle: SourceHandle, source: Weak<dyn AcousticSource>) -> Self {
        Self {
            handle,
            source,
            current_params: SourceParams::default(),
            previous_params: SourceParams::default(),
            priority_score: 0.0,
            effective_level: DetailLevel::Off,
            last_occlusion_update: None,
            last_reflection_update: None,
            is_audible: false,
        }
    }

    /// Upgrades the back-reference. `None` once the host dropped the source.
    pub fn source(&self) -> Option<Arc<dyn AcousticSource>> {
        self.source.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.source.strong_count() > 0
    }

    /// Clears cache timestamps so the next cadence tick retraces the source.
    pub fn invalidate(&mut self) {
        self.last_occlusion_update = None;
        self.last_reflection_update = None;
    }
}

impl std::fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEntry")
            .field("handle", &self.handle)
            .field("alive", &self.is_alive())
            .field("priority_score", &self.priority_score)
            .field("effective_level", &self.effective_level)
            .field("is_audible", &self.is_audible)
            .field("current_params", &self.current_params)
            .finish()
    }
}

/// Handle-keyed store of source entries.
///
/// Iteration order is handle order, which is registration order.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: BTreeMap<SourceHandle, SourceEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry with reset params. Returns false if the handle is taken.
    pub fn insert(&mut self, handle: SourceHandle, source: &Arc<dyn AcousticSource>) -> bool {
        if self.entries.contains_key(&handle) {
            return false;
        }
        self.entries
            .insert(handle, SourceEntry::new(handle, Arc::downgrade(source)));
        true
    }

    pub fn remove(&mut self, handle: SourceHandle) -> Option<SourceEntry> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: SourceHandle) -> Option<&SourceEntry> {
        self.entries.get(&handle)
    }

    pub fn get_mut(&mut self, handle: SourceHandle) -> Option<&mut SourceEntry> {
        self.entries.get_mut(&handle)
    }

    pub fn contains(&self, handle: SourceHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = SourceHandle> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SourceEntry> {
        self.entries.values_mut()
    }

    pub fn audible_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_audible).count()
    }

    /// Drops entries whose source has been released. Returns their handles.
    pub fn prune_dead(&mut self) -> Vec<SourceHandle> {
        let dead: Vec<SourceHandle> = self
            .entries
            .values()
            .filter(|e| !e.is_alive())
            .map(|e| e.handle)
            .collect();
        for handle in &dead {
            self.entries.remove(handle);
        }
        dead
    }
}
