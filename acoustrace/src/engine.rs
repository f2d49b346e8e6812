//! The frame orchestrator tying every stage together.

use crate::clock::{Clock, MonotonicClock};
use crate::command::{EngineCommand, EngineHandle};
use crate::config::AcousticEngineDesc;
use crate::error::{AcousticError, Result};
use crate::events::AcousticEvent;
use crate::listener::{ListenerState, ListenerTracker};
use crate::math::{Pose, Vec3};
use crate::scene::{MaterialTable, RayTracer};
use crate::scheduler::{
    self, RankedSource, RayBudget, StageReport, TraceContext, finalize_params,
};
use crate::source::{AcousticSource, SourceEntry, SourceHandle, SourceParams, SourceRegistry};
use crate::zone::{
    Portal, PortalDesc, PortalId, ReverbPreset, Zone, ZoneDesc, ZoneId, ZoneResolver,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What the last tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Tick counter, starting at 1 for the first tick
    pub frame: u64,
    pub budget: RayBudget,
    pub occlusion_updated: usize,
    pub reflection_updated: usize,
    pub deferred_occlusion: usize,
    pub deferred_reflection: usize,
    /// Live sources ranked this tick
    pub ranked: usize,
    /// Sources with an effective level above Off
    pub audible: usize,
    /// Notifications lost to a full event queue since the previous tick
    pub dropped_events: usize,
}

/// Computes per-source acoustic parameters under a fixed ray budget.
///
/// `AcousticEngine` owns the source registry, the listeners, the zone and
/// portal resolver and the host's [`RayTracer`]. Call [`tick`](Self::tick)
/// once per simulation frame.
///
/// # Tick pipeline
///
/// 1. Apply commands queued through [`EngineHandle`]s
/// 2. Reset the ray budget and advance the cadence accumulators
/// 3. Rank every source against listener 0 and assign detail levels
/// 4. Re-resolve listener zones (zone cadence)
/// 5. Trace occlusion (occlusion cadence)
/// 6. Sample reflections (reflection cadence)
/// 7. Publish valid params to sources and as [`AcousticEvent::ParamsUpdated`]
///
/// With no listener registered, steps 3 to 6 do nothing.
pub struct AcousticEngine {
    desc: AcousticEngineDesc,
    clock: Box<dyn Clock>,
    tracer: Box<dyn RayTracer>,
    materials: MaterialTable,
    registry: SourceRegistry,
    listeners: ListenerTracker,
    zones: ZoneResolver,
    budget: RayBudget,
    occlusion_accumulator: f32,
    reflection_accumulator: f32,
    zone_accumulator: f32,
    frame: u64,
    last_stats: FrameStats,
    dropped_events: usize,
    next_handle: Arc<AtomicU64>,
    command_sender: Sender<EngineCommand>,
    command_receiver: Receiver<EngineCommand>,
    event_sender: Sender<AcousticEvent>,
    event_receiver: Receiver<AcousticEvent>,
}

impl AcousticEngine {
    /// Creates an engine using the wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if `desc` fails validation.
    pub fn new(
        desc: AcousticEngineDesc,
        tracer: impl RayTracer + 'static,
        materials: MaterialTable,
    ) -> Result<Self> {
        desc.validate()?;

        let (command_sender, command_receiver) = crossbeam_channel::unbounded();
        let (event_sender, event_receiver) = crossbeam_channel::bounded(desc.event_capacity.max(1));

        log::info!(
            "Acoustic engine created: {} rays/frame, {}/{}/{} Hz occlusion/reflection/zone",
            desc.max_rays_per_frame,
            desc.occlusion_update_rate_hz,
            desc.reflection_update_rate_hz,
            desc.zone_update_rate_hz
        );

        Ok(Self {
            budget: RayBudget::new(desc.max_rays_per_frame),
            desc,
            clock: Box::new(MonotonicClock::new()),
            tracer: Box::new(tracer),
            materials,
            registry: SourceRegistry::new(),
            listeners: ListenerTracker::new(),
            zones: ZoneResolver::new(),
            occlusion_accumulator: 0.0,
            reflection_accumulator: 0.0,
            zone_accumulator: 0.0,
            frame: 0,
            last_stats: FrameStats::default(),
            dropped_events: 0,
            next_handle: Arc::new(AtomicU64::new(0)),
            command_sender,
            command_receiver,
            event_sender,
            event_receiver,
        })
    }

    /// Replaces the clock used for cache ages and listener velocity.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn desc(&self) -> &AcousticEngineDesc {
        &self.desc
    }

    /// Swaps the configuration. Takes effect on the next tick.
    ///
    /// # Errors
    ///
    /// Returns an error if `desc` fails validation; the old configuration is kept.
    pub fn set_desc(&mut self, desc: AcousticEngineDesc) -> Result<()> {
        desc.validate()?;
        if desc.event_capacity != self.desc.event_capacity {
            log::warn!("event_capacity only applies when the engine is created");
        }
        self.desc = desc;
        Ok(())
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialTable {
        &mut self.materials
    }

    /// A cloneable handle for queuing work from other threads.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.command_sender.clone(), Arc::clone(&self.next_handle))
    }

    // ---- sources ----

    /// Registers a source. The engine keeps only a weak reference.
    pub fn register(&mut self, source: Arc<dyn AcousticSource>) -> SourceHandle {
        let handle = SourceHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.insert_source(handle, source);
        handle
    }

    fn insert_source(&mut self, handle: SourceHandle, source: Arc<dyn AcousticSource>) {
        if self.registry.insert(handle, &source) {
            log::debug!("Registered source {}", handle);
            self.emit(AcousticEvent::SourceRegistered { handle });
        } else {
            log::warn!("Source {} is already registered", handle);
        }
    }

    /// Removes a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not registered.
    pub fn unregister(&mut self, handle: SourceHandle) -> Result<()> {
        self.registry
            .remove(handle)
            .ok_or(AcousticError::UnknownSource(handle))?;
        log::debug!("Unregistered source {}", handle);
        self.emit(AcousticEvent::SourceUnregistered { handle });
        Ok(())
    }

    /// The latest params of a registered source.
    pub fn get_params(&self, handle: SourceHandle) -> Option<SourceParams> {
        self.registry.get(handle).map(|e| e.current_params)
    }

    /// Forces a retrace on the next occlusion and reflection cadence ticks,
    /// ignoring cached results.
    pub fn force_refresh(&mut self, handle: SourceHandle) -> Result<()> {
        self.registry
            .get_mut(handle)
            .ok_or(AcousticError::UnknownSource(handle))?
            .invalidate();
        Ok(())
    }

    pub fn entry(&self, handle: SourceHandle) -> Option<&SourceEntry> {
        self.registry.get(handle)
    }

    pub fn num_registered_sources(&self) -> usize {
        self.registry.len()
    }

    /// Sources whose effective detail level is above Off.
    pub fn num_active_sources(&self) -> usize {
        self.registry.audible_count()
    }

    // ---- listeners ----

    pub fn update_listener(&mut self, index: usize, pose: Pose) {
        let now = self.clock.now();
        self.listeners.update(index, &pose, now);
    }

    /// Deactivates a listener and forgets its resolved zone.
    pub fn remove_listener(&mut self, index: usize) -> Option<ListenerState> {
        self.zones.remove_listener(index);
        self.listeners.remove(index)
    }

    pub fn get_listener(&self, index: usize) -> Option<ListenerState> {
        self.listeners.get(index).copied()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ---- zones and portals ----

    pub fn register_zone(&mut self, desc: ZoneDesc) -> ZoneId {
        self.zones.register_zone(desc)
    }

    pub fn unregister_zone(&mut self, id: ZoneId) -> Result<()> {
        self.zones.unregister_zone(id).map(|_| ())
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.zone(id)
    }

    pub fn zone_at(&self, point: Vec3) -> Option<ZoneId> {
        self.zones.zone_at(point)
    }

    /// The blended reverb preset for a listener.
    pub fn current_zone_preset(&self, listener_index: usize) -> ReverbPreset {
        self.zones.current_preset(listener_index)
    }

    pub fn register_portal(&mut self, desc: PortalDesc) -> PortalId {
        self.zones.register_portal(desc)
    }

    pub fn unregister_portal(&mut self, id: PortalId) -> Result<()> {
        self.zones.unregister_portal(id).map(|_| ())
    }

    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.zones.portal(id)
    }

    pub fn set_portal_open(&mut self, id: PortalId, open: bool) -> Result<()> {
        self.zones.set_portal_open(id, open)
    }

    pub fn set_portal_openness(&mut self, id: PortalId, openness: f32) -> Result<()> {
        self.zones.set_portal_openness(id, openness)
    }

    // ---- events ----

    /// Drains every pending notification.
    pub fn poll_events(&mut self) -> Vec<AcousticEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Queues a notification. A full queue drops it; drops are reported once
    /// per tick.
    fn emit(&mut self, event: AcousticEvent) {
        if let Err(TrySendError::Full(_)) = self.event_sender.try_send(event) {
            self.dropped_events += 1;
        }
    }

    pub fn last_frame_stats(&self) -> &FrameStats {
        &self.last_stats
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ---- tick ----

    /// Runs one frame of the pipeline. `dt` is the simulation delta in seconds.
    pub fn tick(&mut self, dt: f32) {
        self.apply_commands();

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.frame += 1;
        self.budget.reset(self.desc.max_rays_per_frame);
        self.tracer.begin_frame();
        let now = self.clock.now();

        self.occlusion_accumulator += dt;
        self.reflection_accumulator += dt;
        self.zone_accumulator += dt;

        for portal in self.zones.advance(dt) {
            let openness = self.zones.portal(portal).map_or(0.0, Portal::openness);
            log::debug!("Portal {} settled at {}", portal, openness);
            self.emit(AcousticEvent::PortalSettled { portal, openness });
        }

        let primary = self.listeners.primary().copied();
        let ranked = match &primary {
            Some(listener) => {
                scheduler::rank_sources(&mut self.registry, listener.location, &self.desc)
            }
            None => Vec::new(),
        };

        if self.zone_accumulator >= self.desc.zone_interval() {
            self.update_listener_zones();
            self.zone_accumulator = 0.0;
        }

        let mut occlusion = StageReport::default();
        if self.occlusion_accumulator >= self.desc.occlusion_interval() {
            if let Some(listener) = &primary {
                occlusion = self.run_stage(listener, &ranked, now, scheduler::run_occlusion);
            }
            self.occlusion_accumulator = 0.0;
        }

        let mut reflections = StageReport::default();
        if self.reflection_accumulator >= self.desc.reflection_interval() {
            if let Some(listener) = &primary {
                reflections = self.run_stage(listener, &ranked, now, scheduler::run_reflections);
            }
            self.reflection_accumulator = 0.0;
        }

        self.publish();
        self.tracer.end_frame();

        for handle in self.registry.prune_dead() {
            log::debug!("Pruned released source {}", handle);
            self.emit(AcousticEvent::SourcePruned { handle });
        }

        let dropped_events = std::mem::take(&mut self.dropped_events);
        if dropped_events > 0 {
            log::warn!(
                "Event queue full, dropped {} events (capacity {}); drain it with poll_events()",
                dropped_events,
                self.desc.event_capacity
            );
        }

        self.last_stats = FrameStats {
            frame: self.frame,
            budget: self.budget,
            occlusion_updated: occlusion.updated,
            reflection_updated: reflections.updated,
            deferred_occlusion: occlusion.deferred,
            deferred_reflection: reflections.deferred,
            ranked: ranked.len(),
            audible: self.registry.audible_count(),
            dropped_events,
        };
        log::trace!("Frame {}: {:?}", self.frame, self.last_stats);
    }

    fn run_stage(
        &mut self,
        listener: &ListenerState,
        ranked: &[RankedSource],
        now: std::time::Duration,
        stage: fn(
            &TraceContext<'_>,
            &[RankedSource],
            &mut SourceRegistry,
            &mut RayBudget,
        ) -> StageReport,
    ) -> StageReport {
        let ctx = TraceContext {
            tracer: &*self.tracer,
            materials: &self.materials,
            zones: &self.zones,
            desc: &self.desc,
            listener,
            now,
        };
        stage(&ctx, ranked, &mut self.registry, &mut self.budget)
    }

    fn update_listener_zones(&mut self) {
        let locations: Vec<(usize, Vec3)> =
            self.listeners.iter().map(|l| (l.index, l.location)).collect();

        for (index, location) in locations {
            if let Some(change) = self.zones.update_listener(index, location) {
                self.listeners.set_zone(index, change.new_zone);
                log::debug!(
                    "Listener {} changed zone from {:?} to {:?}",
                    index,
                    change.old_zone,
                    change.new_zone
                );
                self.emit(AcousticEvent::ZoneChanged {
                    listener_index: change.listener_index,
                    old_zone: change.old_zone,
                    new_zone: change.new_zone,
                });
            }
        }
    }

    fn publish(&mut self) {
        let mut published = Vec::new();
        for entry in self.registry.iter_mut() {
            if !entry.current_params.valid {
                continue;
            }
            let Some(source) = entry.source() else {
                continue;
            };
            finalize_params(&mut entry.current_params, &source.settings(), &self.desc, self.frame);
            source.on_params_updated(&entry.current_params);
            published.push((entry.handle, entry.current_params));
        }

        for (handle, params) in published {
            self.emit(AcousticEvent::ParamsUpdated { handle, params });
        }
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.command_receiver.try_recv() {
            log::trace!("Applying {:?}", command);
            let result = match command {
                EngineCommand::Register(handle, source) => {
                    self.insert_source(handle, source);
                    Ok(())
                }
                EngineCommand::Unregister(handle) => self.unregister(handle),
                EngineCommand::ForceRefresh(handle) => self.force_refresh(handle),
                EngineCommand::UpdateListener(index, pose) => {
                    self.update_listener(index, pose);
                    Ok(())
                }
                EngineCommand::SetPortalOpen(id, open) => self.set_portal_open(id, open),
                EngineCommand::SetPortalOpenness(id, openness) => {
                    self.set_portal_openness(id, openness)
                }
            };
            if let Err(e) = result {
                log::warn!("Queued command failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for AcousticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcousticEngine")
            .field("desc", &self.desc)
            .field("frame", &self.frame)
            .field("sources", &self.registry.len())
            .field("listeners", &self.listeners.len())
            .field("zones", &self.zones.zone_count())
            .finish()
    }
}
