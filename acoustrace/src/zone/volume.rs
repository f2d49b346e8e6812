//! Reverberant zone volumes.

use super::preset::{ReverbPreset, ZoneType};
use crate::math::Vec3;

/// Stable identifier assigned to a zone when it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u32);

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZoneId({})", self.0)
    }
}

/// Spatial containment test of a zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneShape {
    /// Axis-aligned box, inclusive on every face
    Aabb { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl ZoneShape {
    pub fn aabb(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self::Aabb {
            min: center - half,
            max: center + half,
        }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::Sphere {
            center,
            radius: radius.abs(),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Self::Aabb { min, max } => point.cmpge(min).all() && point.cmple(max).all(),
            Self::Sphere { center, radius } => point.distance_squared(center) <= radius * radius,
        }
    }

    pub fn center(&self) -> Vec3 {
        match *self {
            Self::Aabb { min, max } => (min + max) * 0.5,
            Self::Sphere { center, .. } => center,
        }
    }
}

/// Description of a zone before registration.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDesc {
    pub name: String,
    pub zone_type: ZoneType,
    /// Higher priority wins where zones overlap
    pub priority: i32,
    pub preset: ReverbPreset,
    pub shape: ZoneShape,
    /// Seconds to crossfade into this zone's preset
    pub blend_time: f32,
    /// Scales the reflection density measured inside the zone (0.0 - 2.0)
    pub reflection_density_mod: f32,
    /// Scales the reflection trace distance inside the zone (0.1 - 3.0)
    pub trace_distance_mod: f32,
}

impl ZoneDesc {
    /// A zone using the catalog preset for `zone_type`.
    pub fn new(name: impl Into<String>, zone_type: ZoneType, shape: ZoneShape) -> Self {
        Self {
            name: name.into(),
            zone_type,
            priority: 0,
            preset: ReverbPreset::for_zone_type(zone_type),
            shape,
            blend_time: 0.5,
            reflection_density_mod: 1.0,
            trace_distance_mod: 1.0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Overrides the catalog preset. The zone type is kept.
    pub fn with_preset(mut self, preset: ReverbPreset) -> Self {
        self.preset = ReverbPreset {
            zone_type: self.zone_type,
            ..preset
        };
        self
    }

    pub fn with_blend_time(mut self, seconds: f32) -> Self {
        self.blend_time = seconds;
        self
    }

    pub fn with_reflection_density_mod(mut self, modifier: f32) -> Self {
        self.reflection_density_mod = modifier.clamp(0.0, 2.0);
        self
    }

    pub fn with_trace_distance_mod(mut self, modifier: f32) -> Self {
        self.trace_distance_mod = modifier.clamp(0.1, 3.0);
        self
    }
}

/// A registered zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: ZoneId,
    desc: ZoneDesc,
}

impl Zone {
    pub(crate) fn new(id: ZoneId, desc: ZoneDesc) -> Self {
        Self { id, desc }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn zone_type(&self) -> ZoneType {
        self.desc.zone_type
    }

    pub fn priority(&self) -> i32 {
        self.desc.priority
    }

    pub fn preset(&self) -> &ReverbPreset {
        &self.desc.preset
    }

    pub fn shape(&self) -> &ZoneShape {
        &self.desc.shape
    }

    pub fn desc(&self) -> &ZoneDesc {
        &self.desc
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.desc.shape.contains(point)
    }
}
