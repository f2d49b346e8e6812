//! Zone containment queries, per-listener zone tracking and portal animation.

use super::portal::{Portal, PortalDesc, PortalId};
use super::preset::ReverbPreset;
use super::volume::{Zone, ZoneDesc, ZoneId};
use crate::error::{AcousticError, Result};
use crate::math::Vec3;
use std::collections::BTreeMap;

/// Distance sampled on each side of a portal to find its adjacent zones.
const PORTAL_SIDE_DISTANCE: f32 = 100.0;
/// Blend time used when a listener leaves every zone.
const DEFAULT_BLEND_TIME: f32 = 0.5;

/// Crossfade between two reverb presets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBlend {
    from: ReverbPreset,
    to: ReverbPreset,
    elapsed: f32,
    duration: f32,
}

impl ZoneBlend {
    pub fn settled(preset: ReverbPreset) -> Self {
        Self {
            from: preset,
            to: preset,
            elapsed: 0.0,
            duration: 0.0,
        }
    }

    /// Blends from `from` to `to` over `duration` seconds.
    pub fn new(from: ReverbPreset, to: ReverbPreset, duration: f32) -> Self {
        if duration <= 0.0 {
            return Self::settled(to);
        }
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.is_complete() {
            self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn target(&self) -> &ReverbPreset {
        &self.to
    }

    /// The effective preset at the current progress.
    pub fn current(&self) -> ReverbPreset {
        if self.is_complete() {
            self.to
        } else {
            self.from.lerp(&self.to, self.progress())
        }
    }
}

impl Default for ZoneBlend {
    fn default() -> Self {
        Self::settled(ReverbPreset::DEFAULT)
    }
}

/// A listener moving from one zone to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneChange {
    pub listener_index: usize,
    pub old_zone: Option<ZoneId>,
    pub new_zone: Option<ZoneId>,
}

#[derive(Debug, Clone, Default)]
struct ListenerZone {
    zone: Option<ZoneId>,
    blend: ZoneBlend,
}

/// Owns every zone and portal and tracks which zone each listener is in.
#[derive(Debug, Default)]
pub struct ZoneResolver {
    zones: BTreeMap<ZoneId, Zone>,
    portals: BTreeMap<PortalId, Portal>,
    listeners: BTreeMap<usize, ListenerZone>,
    next_zone_id: u32,
    next_portal_id: u32,
}

impl ZoneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_zone(&mut self, desc: ZoneDesc) -> ZoneId {
        let id = ZoneId(self.next_zone_id);
        self.next_zone_id += 1;
        log::info!(
            "Registered zone {} '{}' ({:?}, priority {})",
            id,
            desc.name,
            desc.zone_type,
            desc.priority
        );
        self.zones.insert(id, Zone::new(id, desc));
        id
    }

    /// Removes a zone. Portals referencing it lose that side.
    pub fn unregister_zone(&mut self, id: ZoneId) -> Result<Zone> {
        let zone = self
            .zones
            .remove(&id)
            .ok_or(AcousticError::UnknownZone(id))?;

        for portal in self.portals.values_mut() {
            let a = portal.zone_a().filter(|z| *z != id);
            let b = portal.zone_b().filter(|z| *z != id);
            portal.set_zones(a, b);
        }
        log::info!("Unregistered zone {} '{}'", id, zone.name());
        Ok(zone)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Highest priority zone containing `point`. Equal priorities resolve to
    /// the smallest zone id.
    pub fn zone_at(&self, point: Vec3) -> Option<ZoneId> {
        let mut best: Option<&Zone> = None;
        // ascending id order, so only a strictly higher priority replaces
        for zone in self.zones.values().filter(|z| z.contains(point)) {
            if best.map_or(true, |b| zone.priority() > b.priority()) {
                best = Some(zone);
            }
        }
        best.map(Zone::id)
    }

    /// Registers a portal, sampling both sides of its plane for unset zones.
    pub fn register_portal(&mut self, desc: PortalDesc) -> PortalId {
        let id = PortalId(self.next_portal_id);
        self.next_portal_id += 1;

        let offset = desc.normal * PORTAL_SIDE_DISTANCE;
        let zone_a = desc.zone_a.or_else(|| self.zone_at(desc.center - offset));
        let zone_b = desc.zone_b.or_else(|| self.zone_at(desc.center + offset));

        let mut portal = Portal::new(id, desc);
        portal.set_zones(zone_a, zone_b);
        log::info!(
            "Registered portal {} '{}' between {:?} and {:?}",
            id,
            portal.name(),
            zone_a,
            zone_b
        );
        self.portals.insert(id, portal);
        id
    }

    pub fn unregister_portal(&mut self, id: PortalId) -> Result<Portal> {
        self.portals
            .remove(&id)
            .ok_or(AcousticError::UnknownPortal(id))
    }

    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(&id)
    }

    pub fn portals(&self) -> impl Iterator<Item = &Portal> {
        self.portals.values()
    }

    pub fn set_portal_open(&mut self, id: PortalId, open: bool) -> Result<()> {
        let portal = self
            .portals
            .get_mut(&id)
            .ok_or(AcousticError::UnknownPortal(id))?;
        portal.set_open(open);
        Ok(())
    }

    pub fn set_portal_openness(&mut self, id: PortalId, openness: f32) -> Result<()> {
        let portal = self
            .portals
            .get_mut(&id)
            .ok_or(AcousticError::UnknownPortal(id))?;
        portal.set_openness(openness);
        Ok(())
    }

    /// Portals whose opening lies on the straight path between two points.
    pub fn portals_on_path(&self, from: Vec3, to: Vec3) -> impl Iterator<Item = &Portal> {
        self.portals
            .values()
            .filter(move |p| p.is_on_sound_path(from, to))
    }

    /// Advances portal transitions and zone blends. Returns the portals that
    /// settled during this call.
    pub fn advance(&mut self, dt: f32) -> Vec<PortalId> {
        for listener in self.listeners.values_mut() {
            listener.blend.advance(dt);
        }

        self.portals
            .values_mut()
            .filter_map(|p| p.update(dt).then(|| p.id()))
            .collect()
    }

    /// Re-resolves a listener's zone. Returns the change when it moved.
    pub fn update_listener(&mut self, listener_index: usize, location: Vec3) -> Option<ZoneChange> {
        let new_zone = self.zone_at(location);

        let (target, blend_time) = match new_zone.and_then(|id| self.zones.get(&id)) {
            Some(zone) => (*zone.preset(), zone.desc().blend_time),
            None => (ReverbPreset::DEFAULT, DEFAULT_BLEND_TIME),
        };

        let state = self.listeners.entry(listener_index).or_default();
        if state.zone == new_zone {
            return None;
        }

        let old_zone = state.zone;
        state.blend = ZoneBlend::new(state.blend.current(), target, blend_time);
        state.zone = new_zone;
        Some(ZoneChange {
            listener_index,
            old_zone,
            new_zone,
        })
    }

    /// Forgets a listener's zone and blend, so it resolves from scratch when
    /// it comes back.
    pub fn remove_listener(&mut self, listener_index: usize) {
        self.listeners.remove(&listener_index);
    }

    /// The zone a listener was last resolved into.
    pub fn listener_zone(&self, listener_index: usize) -> Option<ZoneId> {
        self.listeners.get(&listener_index).and_then(|l| l.zone)
    }

    /// The blended preset for a listener, or the default preset.
    pub fn current_preset(&self, listener_index: usize) -> ReverbPreset {
        self.listeners
            .get(&listener_index)
            .map(|l| l.blend.current())
            .unwrap_or(ReverbPreset::DEFAULT)
    }

    /// `(trace_distance_mod, reflection_density_mod)` of a listener's zone.
    pub fn reflection_modifiers(&self, listener_index: usize) -> (f32, f32) {
        self.listener_zone(listener_index)
            .and_then(|id| self.zones.get(&id))
            .map(|z| (z.desc().trace_distance_mod, z.desc().reflection_density_mod))
            .unwrap_or((1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{ZoneShape, ZoneType};

    fn room(name: &str, zone_type: ZoneType, center: Vec3, priority: i32) -> ZoneDesc {
        ZoneDesc::new(name, zone_type, ZoneShape::aabb(center, Vec3::splat(500.0)))
            .with_priority(priority)
    }

    #[test]
    fn test_zone_at_prefers_priority() {
        let mut resolver = ZoneResolver::new();
        let hall = resolver.register_zone(room("hall", ZoneType::LargeRoom, Vec3::ZERO, 1));
        let booth = resolver.register_zone(room(
            "booth",
            ZoneType::SmallRoom,
            Vec3::new(400.0, 0.0, 0.0),
            5,
        ));

        assert_eq!(resolver.zone_at(Vec3::new(-400.0, 0.0, 0.0)), Some(hall));
        assert_eq!(resolver.zone_at(Vec3::new(200.0, 0.0, 0.0)), Some(booth));
        assert_eq!(resolver.zone_at(Vec3::splat(5000.0)), None);
    }

    #[test]
    fn test_zone_at_tie_picks_smallest_id() {
        let mut resolver = ZoneResolver::new();
        let first = resolver.register_zone(room("a", ZoneType::Cave, Vec3::ZERO, 2));
        let _second = resolver.register_zone(room("b", ZoneType::Hallway, Vec3::ZERO, 2));
        assert_eq!(resolver.zone_at(Vec3::ZERO), Some(first));

        resolver.unregister_zone(first).unwrap();
        assert_ne!(resolver.zone_at(Vec3::ZERO), Some(first));
    }

    #[test]
    fn test_listener_zone_change_reported_once() {
        let mut resolver = ZoneResolver::new();
        let a = resolver.register_zone(room("a", ZoneType::LargeRoom, Vec3::ZERO, 1));
        let b = resolver.register_zone(room("b", ZoneType::Cave, Vec3::new(600.0, 0.0, 0.0), 5));

        let first = resolver.update_listener(0, Vec3::new(-300.0, 0.0, 0.0));
        assert_eq!(first.and_then(|c| c.new_zone), Some(a));

        let change = resolver.update_listener(0, Vec3::new(300.0, 0.0, 0.0));
        assert_eq!(
            change,
            Some(ZoneChange {
                listener_index: 0,
                old_zone: Some(a),
                new_zone: Some(b),
            })
        );
        assert!(resolver.update_listener(0, Vec3::new(310.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_blend_reaches_target() {
        let mut resolver = ZoneResolver::new();
        resolver.register_zone(
            room("cathedral", ZoneType::Cathedral, Vec3::ZERO, 0).with_blend_time(1.0),
        );
        resolver.update_listener(0, Vec3::ZERO);

        let start = resolver.current_preset(0);
        assert_eq!(start.rt60, ReverbPreset::DEFAULT.rt60);

        resolver.advance(0.5);
        let mid = resolver.current_preset(0);
        assert!((mid.rt60 - 2.5).abs() < 1e-4);
        assert_eq!(
            *resolver.listeners[&0].blend.target(),
            ReverbPreset::for_zone_type(ZoneType::Cathedral)
        );

        resolver.advance(0.6);
        assert_eq!(
            resolver.current_preset(0),
            ReverbPreset::for_zone_type(ZoneType::Cathedral)
        );
    }

    #[test]
    fn test_removed_listener_resolves_again() {
        let mut resolver = ZoneResolver::new();
        let hall = resolver.register_zone(room("hall", ZoneType::LargeRoom, Vec3::ZERO, 0));
        assert!(resolver.update_listener(1, Vec3::ZERO).is_some());

        resolver.remove_listener(1);
        assert_eq!(resolver.listener_zone(1), None);
        assert_eq!(resolver.current_preset(1), ReverbPreset::DEFAULT);

        let change = resolver.update_listener(1, Vec3::ZERO);
        assert_eq!(
            change,
            Some(ZoneChange {
                listener_index: 1,
                old_zone: None,
                new_zone: Some(hall),
            })
        );
    }

    #[test]
    fn test_huge_listener_index() {
        let mut resolver = ZoneResolver::new();
        resolver.register_zone(room("hall", ZoneType::LargeRoom, Vec3::ZERO, 0));
        assert!(resolver.update_listener(usize::MAX, Vec3::ZERO).is_some());
        assert!(resolver.listener_zone(usize::MAX).is_some());
    }

    #[test]
    fn test_instant_blend() {
        let blend = ZoneBlend::new(
            ReverbPreset::DEFAULT,
            ReverbPreset::for_zone_type(ZoneType::Forest),
            0.0,
        );
        assert!(blend.is_complete());
        assert_eq!(blend.current().zone_type, ZoneType::Forest);
    }

    #[test]
    fn test_portal_auto_detects_zones() {
        let mut resolver = ZoneResolver::new();
        let west_center = Vec3::new(-500.0, 0.0, 0.0);
        let east_center = Vec3::new(500.0, 0.0, 0.0);
        let west = resolver.register_zone(room("west", ZoneType::SmallRoom, west_center, 0));
        let east = resolver.register_zone(room("east", ZoneType::LargeRoom, east_center, 0));

        let door = resolver.register_portal(PortalDesc::new(
            "door",
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(0.0, 100.0, 50.0),
        ));
        let portal = resolver.portal(door).unwrap();
        assert_eq!(portal.zone_a(), Some(west));
        assert_eq!(portal.zone_b(), Some(east));

        resolver.unregister_zone(east).unwrap();
        assert_eq!(resolver.portal(door).unwrap().zone_b(), None);
    }

    #[test]
    fn test_portal_settles_through_advance() {
        let mut resolver = ZoneResolver::new();
        let door = resolver.register_portal(PortalDesc::new(
            "door",
            Vec3::ZERO,
            Vec3::X,
            Vec3::ONE,
        ));
        resolver.set_portal_open(door, false).unwrap();

        let mut settled = Vec::new();
        for _ in 0..5 {
            settled.extend(resolver.advance(0.1));
        }
        assert_eq!(settled, vec![door]);
        assert!(resolver.set_portal_open(PortalId(99), true).is_err());
    }
}
