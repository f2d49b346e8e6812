//! A tiny procedural scene: two rooms joined by a doorway.
//!
//! ```text
//!  z
//!  ^   +-----------+-----------+
//!  |   |  kitchen  |   hall    |
//!  |   |        door           |
//!  |   +-----------+-----------+
//!  +---------------------------> x
//! ```

use acoustrace::{
    MaterialKind, PortalDesc, RayHit, RayQuery, RayTracer, Vec3, ZoneDesc, ZoneShape, ZoneType,
};

/// Half size of each room in centimetres.
pub const ROOM_HALF: Vec3 = Vec3::new(600.0, 300.0, 600.0);
pub const KITCHEN_CENTER: Vec3 = Vec3::new(-600.0, 0.0, 0.0);
pub const HALL_CENTER: Vec3 = Vec3::new(600.0, 0.0, 0.0);
/// Half size of the doorway in the dividing wall at x = 0.
pub const DOOR_HALF: Vec3 = Vec3::new(10.0, 110.0, 60.0);

struct Slab {
    min: Vec3,
    max: Vec3,
    material: MaterialKind,
}

impl Slab {
    fn new(center: Vec3, half: Vec3, material: MaterialKind) -> Self {
        Self {
            min: center - half,
            max: center + half,
            material,
        }
    }

    /// Entry distance and face normal of a segment against this box.
    fn intersect(&self, origin: Vec3, dir: Vec3, length: f32) -> Option<(f32, Vec3)> {
        let mut t_min = 0.0_f32;
        let mut t_max = length;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let d = dir[axis];
            if d.abs() < 1e-6 {
                if origin[axis] < self.min[axis] || origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let mut t0 = (self.min[axis] - origin[axis]) / d;
            let mut t1 = (self.max[axis] - origin[axis]) / d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_min {
                t_min = t0;
                normal = Vec3::ZERO;
                normal[axis] = -d.signum();
            }
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some((t_min, normal))
    }
}

/// Brute-force tracer over a handful of wall slabs.
pub struct HouseTracer {
    slabs: Vec<Slab>,
}

impl HouseTracer {
    pub fn new() -> Self {
        let outer = Vec3::new(1200.0, 300.0, 600.0);
        let thickness = 10.0;
        let mut slabs = vec![
            // floor and ceiling
            Slab::new(
                Vec3::new(0.0, -outer.y - thickness, 0.0),
                Vec3::new(outer.x, thickness, outer.z),
                MaterialKind::Wood,
            ),
            Slab::new(
                Vec3::new(0.0, outer.y + thickness, 0.0),
                Vec3::new(outer.x, thickness, outer.z),
                MaterialKind::Concrete,
            ),
            // outer walls
            Slab::new(
                Vec3::new(-outer.x - thickness, 0.0, 0.0),
                Vec3::new(thickness, outer.y, outer.z),
                MaterialKind::Concrete,
            ),
            Slab::new(
                Vec3::new(outer.x + thickness, 0.0, 0.0),
                Vec3::new(thickness, outer.y, outer.z),
                MaterialKind::Concrete,
            ),
            Slab::new(
                Vec3::new(0.0, 0.0, -outer.z - thickness),
                Vec3::new(outer.x, outer.y, thickness),
                MaterialKind::Glass,
            ),
            Slab::new(
                Vec3::new(0.0, 0.0, outer.z + thickness),
                Vec3::new(outer.x, outer.y, thickness),
                MaterialKind::Concrete,
            ),
        ];

        // dividing wall with a doorway cut out around the origin
        let wall_below_z = (outer.z - DOOR_HALF.z) * 0.5;
        slabs.push(Slab::new(
            Vec3::new(0.0, 0.0, -DOOR_HALF.z - wall_below_z),
            Vec3::new(DOOR_HALF.x, outer.y, wall_below_z),
            MaterialKind::Wood,
        ));
        slabs.push(Slab::new(
            Vec3::new(0.0, 0.0, DOOR_HALF.z + wall_below_z),
            Vec3::new(DOOR_HALF.x, outer.y, wall_below_z),
            MaterialKind::Wood,
        ));
        let lintel_half = (outer.y - DOOR_HALF.y) * 0.5;
        slabs.push(Slab::new(
            Vec3::new(0.0, DOOR_HALF.y + lintel_half, 0.0),
            Vec3::new(DOOR_HALF.x, lintel_half, DOOR_HALF.z),
            MaterialKind::Wood,
        ));

        Self { slabs }
    }
}

impl RayTracer for HouseTracer {
    fn cast_ray(&self, query: &RayQuery) -> Option<RayHit> {
        let dir = query.direction();
        let length = query.length();
        self.slabs
            .iter()
            .filter_map(|slab| {
                slab.intersect(query.origin, dir, length)
                    .map(|(t, normal)| (t, normal, slab.material))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal, material)| {
                RayHit::new(query.origin + dir * t, normal, t, material.id())
            })
    }
}

pub fn kitchen() -> ZoneDesc {
    ZoneDesc::new(
        "kitchen",
        ZoneType::SmallRoom,
        ZoneShape::aabb(KITCHEN_CENTER, ROOM_HALF),
    )
    .with_priority(1)
    .with_blend_time(0.4)
}

pub fn hall() -> ZoneDesc {
    ZoneDesc::new("hall", ZoneType::LargeRoom, ZoneShape::aabb(HALL_CENTER, ROOM_HALF))
        .with_priority(1)
        .with_blend_time(0.8)
        .with_trace_distance_mod(1.5)
}

/// The door in the dividing wall. Zones are left unset so they are detected from the rooms.
pub fn door() -> PortalDesc {
    PortalDesc::new("door", Vec3::ZERO, Vec3::X, DOOR_HALF).with_transition_time(0.5)
}

impl Default for HouseTracer {
    fn default() -> Self {
        Self::new()
    }
}
