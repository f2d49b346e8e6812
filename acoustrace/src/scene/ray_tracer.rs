//! Ray casting interface the engine uses to query scene geometry.

use super::material::MaterialId;
use crate::math::Vec3;

/// Collision channel a query runs against. Hosts map these onto their own
/// physics layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraceChannel {
    #[default]
    Occlusion,
    Portal,
    Custom(u8),
}

/// A single segment query from `origin` to `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQuery {
    pub origin: Vec3,
    pub target: Vec3,
    pub channel: TraceChannel,
    /// Trace against per-triangle geometry instead of simplified collision
    pub use_complex_geometry: bool,
}

impl RayQuery {
    pub fn new(origin: Vec3, target: Vec3) -> Self {
        Self {
            origin,
            target,
            channel: TraceChannel::Occlusion,
            use_complex_geometry: false,
        }
    }

    pub fn with_channel(mut self, channel: TraceChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_complex_geometry(mut self, complex: bool) -> Self {
        self.use_complex_geometry = complex;
        self
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.origin).normalize_or_zero()
    }

    pub fn length(&self) -> f32 {
        self.origin.distance(self.target)
    }
}

/// Closest intersection along a [`RayQuery`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space impact point
    pub location: Vec3,

    /// Surface normal at the hit point, pointing away from the surface
    pub normal: Vec3,

    /// Distance from the query origin to `location`
    pub distance: f32,

    /// Surface id, resolved through the engine's [`MaterialTable`](super::MaterialTable)
    pub material: MaterialId,
}

impl RayHit {
    pub fn new(location: Vec3, normal: Vec3, distance: f32, material: MaterialId) -> Self {
        Self {
            location,
            normal,
            distance,
            material,
        }
    }
}

/// Trait for providing scene ray casts to the acoustic engine.
///
/// Implement this on top of an existing physics or BVH layer. Every call is
/// synchronous and the engine treats the result as final for the tick.
///
/// # Performance
///
/// The engine casts at most `max_rays_per_frame` rays per tick, split between
/// one direct ray per source and a hemisphere of reflection rays for sources
/// at Advanced or Hero detail.
///
/// # Example
///
/// ```
/// use acoustrace::math::Vec3;
/// use acoustrace::scene::{MaterialId, RayHit, RayQuery, RayTracer};
///
/// /// A single infinite floor at y = 0.
/// struct FloorTracer;
///
/// impl RayTracer for FloorTracer {
///     fn cast_ray(&self, query: &RayQuery) -> Option<RayHit> {
///         let (a, b) = (query.origin, query.target);
///         if (a.y > 0.0) == (b.y > 0.0) {
///             return None;
///         }
///         let t = a.y / (a.y - b.y);
///         let location = a + (b - a) * t;
///         Some(RayHit::new(location, Vec3::Y, a.distance(location), MaterialId(0)))
///     }
/// }
///
/// let hit = FloorTracer.cast_ray(&RayQuery::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0)));
/// assert!(hit.is_some());
/// ```
pub trait RayTracer: Send + Sync {
    /// Returns the closest hit between `query.origin` and `query.target`, or
    /// `None` when the segment is clear.
    fn cast_ray(&self, query: &RayQuery) -> Option<RayHit>;

    /// Called once per tick before any ray casts.
    ///
    /// Default implementation does nothing.
    fn begin_frame(&mut self) {}

    /// Called once per tick after all ray casts.
    ///
    /// Default implementation does nothing.
    fn end_frame(&mut self) {}
}

impl<F> RayTracer for F
where
    F: Fn(&RayQuery) -> Option<RayHit> + Send + Sync,
{
    fn cast_ray(&self, query: &RayQuery) -> Option<RayHit> {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTracer;

    impl RayTracer for NoopTracer {
        fn cast_ray(&self, _query: &RayQuery) -> Option<RayHit> {
            None
        }
    }

    #[test]
    fn test_noop_tracer() {
        let query = RayQuery::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0));
        assert!(NoopTracer.cast_ray(&query).is_none());
    }

    #[test]
    fn test_closure_tracer() {
        let tracer = |query: &RayQuery| {
            Some(RayHit::new(
                query.target,
                Vec3::Y,
                query.length(),
                MaterialId(3),
            ))
        };
        let query = RayQuery::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 50.0));
        let hit = tracer.cast_ray(&query).unwrap();
        assert_eq!(hit.distance, 50.0);
        assert_eq!(hit.material, MaterialId(3));
    }

    #[test]
    fn test_query_builder() {
        let query = RayQuery::new(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0))
            .with_channel(TraceChannel::Portal)
            .with_complex_geometry(true);
        assert_eq!(query.channel, TraceChannel::Portal);
        assert!(query.use_complex_geometry);
        assert!((query.length() - 5.0).abs() < 1e-6);
        assert!((query.direction().length() - 1.0).abs() < 1e-6);
    }
}
