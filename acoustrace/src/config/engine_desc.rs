use crate::error::{AcousticError, Result};
use crate::scene::TraceChannel;
use std::time::Duration;

/// Configuration descriptor for an [`AcousticEngine`](crate::AcousticEngine).
///
/// Distances are in world units. The defaults assume centimetres, so
/// `reference_distance` is one metre and `speed_of_sound` is 343 m/s.
#[derive(Debug, Clone)]
pub struct AcousticEngineDesc {
    /// Maximum ray casts per tick across all sources and stages
    pub max_rays_per_frame: u32,
    /// Hemisphere rays cast for a source at Advanced detail
    pub advanced_reflection_rays: u32,
    /// Hemisphere rays cast for a source at Hero detail
    pub hero_reflection_rays: u32,
    /// Length of each reflection ray
    pub max_trace_distance: f32,

    pub occlusion_update_rate_hz: f32,
    pub reflection_update_rate_hz: f32,
    pub zone_update_rate_hz: f32,

    /// Frames (at `cache_reference_rate_hz`) an occlusion result stays fresh
    pub occlusion_cache_frames: u32,
    /// Frames (at `cache_reference_rate_hz`) a reflection result stays fresh
    pub reflection_cache_frames: u32,
    pub cache_reference_rate_hz: f32,

    /// Beyond this distance anything above Basic is downgraded to Basic
    pub basic_lod_distance: f32,
    /// Beyond this distance a source is switched Off
    pub off_lod_distance: f32,
    /// Concurrent sources allowed at Advanced
    pub max_advanced_sources: usize,
    /// Concurrent sources allowed at Hero
    pub max_hero_sources: usize,

    /// 0 = game-friendly occlusion, 1 = fully physical occlusion
    pub realism_factor: f32,
    /// Dry gain never drops below this level
    pub minimum_audibility_db: f32,

    /// World units per second
    pub speed_of_sound: f32,
    /// World units treated as one normalised distance step
    pub reference_distance: f32,

    pub occlusion_channel: TraceChannel,
    pub use_complex_collision: bool,

    /// Capacity of the notification channel
    pub event_capacity: usize,
}

impl Default for AcousticEngineDesc {
    fn default() -> Self {
        Self {
            max_rays_per_frame: 200,
            advanced_reflection_rays: 24,
            hero_reflection_rays: 32,
            max_trace_distance: 10_000.0,
            occlusion_update_rate_hz: 30.0,
            reflection_update_rate_hz: 15.0,
            zone_update_rate_hz: 20.0,
            occlusion_cache_frames: 5,
            reflection_cache_frames: 0,
            cache_reference_rate_hz: 60.0,
            basic_lod_distance: 3_000.0,
            off_lod_distance: 8_000.0,
            max_advanced_sources: 8,
            max_hero_sources: 2,
            realism_factor: 0.7,
            minimum_audibility_db: -50.0,
            speed_of_sound: 34_300.0,
            reference_distance: 100.0,
            occlusion_channel: TraceChannel::Occlusion,
            use_complex_collision: false,
            event_capacity: 1024,
        }
    }
}

impl AcousticEngineDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_rays_per_frame(mut self, rays: u32) -> Self {
        self.max_rays_per_frame = rays;
        self
    }

    pub fn reflection_rays(mut self, advanced: u32, hero: u32) -> Self {
        self.advanced_reflection_rays = advanced;
        self.hero_reflection_rays = hero;
        self
    }

    pub fn update_rates(mut self, occlusion_hz: f32, reflection_hz: f32, zone_hz: f32) -> Self {
        self.occlusion_update_rate_hz = occlusion_hz;
        self.reflection_update_rate_hz = reflection_hz;
        self.zone_update_rate_hz = zone_hz;
        self
    }

    pub fn lod_distances(mut self, basic: f32, off: f32) -> Self {
        self.basic_lod_distance = basic;
        self.off_lod_distance = off;
        self
    }

    pub fn source_caps(mut self, max_advanced: usize, max_hero: usize) -> Self {
        self.max_advanced_sources = max_advanced;
        self.max_hero_sources = max_hero;
        self
    }

    pub fn occlusion_cache_frames(mut self, frames: u32) -> Self {
        self.occlusion_cache_frames = frames;
        self
    }

    pub fn reflection_cache_frames(mut self, frames: u32) -> Self {
        self.reflection_cache_frames = frames;
        self
    }

    pub fn realism_factor(mut self, factor: f32) -> Self {
        self.realism_factor = factor;
        self
    }

    pub fn minimum_audibility_db(mut self, db: f32) -> Self {
        self.minimum_audibility_db = db;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn occlusion_interval(&self) -> f32 {
        interval(self.occlusion_update_rate_hz)
    }

    pub fn reflection_interval(&self) -> f32 {
        interval(self.reflection_update_rate_hz)
    }

    pub fn zone_interval(&self) -> f32 {
        interval(self.zone_update_rate_hz)
    }

    /// How long an occlusion result is reused before it is traced again.
    pub fn occlusion_cache_duration(&self) -> Duration {
        self.cache_duration(self.occlusion_cache_frames)
    }

    /// How long a reflection result is reused before it is traced again.
    pub fn reflection_cache_duration(&self) -> Duration {
        self.cache_duration(self.reflection_cache_frames)
    }

    fn cache_duration(&self, frames: u32) -> Duration {
        Duration::from_secs_f32(frames as f32 / crate::math::positive(self.cache_reference_rate_hz))
    }

    /// Checks that every field is within a usable range.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("occlusion_update_rate_hz", self.occlusion_update_rate_hz),
            ("reflection_update_rate_hz", self.reflection_update_rate_hz),
            ("zone_update_rate_hz", self.zone_update_rate_hz),
            ("cache_reference_rate_hz", self.cache_reference_rate_hz),
        ];
        for (name, rate) in rates {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(AcousticError::Configuration(format!(
                    "{} must be a positive rate, got {}",
                    name, rate
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.realism_factor) {
            return Err(AcousticError::Configuration(format!(
                "realism_factor must be between 0.0 and 1.0, got {}",
                self.realism_factor
            )));
        }

        if self.basic_lod_distance < 0.0 || self.off_lod_distance < self.basic_lod_distance {
            return Err(AcousticError::Configuration(format!(
                "LOD distances must satisfy 0 <= basic ({}) <= off ({})",
                self.basic_lod_distance, self.off_lod_distance
            )));
        }

        if !(self.speed_of_sound > 0.0 && self.reference_distance > 0.0) {
            return Err(AcousticError::Configuration(
                "speed_of_sound and reference_distance must be positive".into(),
            ));
        }

        if !(self.max_trace_distance > 0.0) {
            return Err(AcousticError::Configuration(
                "max_trace_distance must be positive".into(),
            ));
        }

        if self.event_capacity == 0 {
            return Err(AcousticError::Configuration(
                "event_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

fn interval(rate_hz: f32) -> f32 {
    1.0 / crate::math::positive(rate_hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AcousticEngineDesc::default().validate().is_ok());
    }

    #[test]
    fn test_cache_duration_from_frames() {
        let desc = AcousticEngineDesc::default();
        let cache = desc.occlusion_cache_duration().as_secs_f32();
        assert!((cache - 5.0 / 60.0).abs() < 1e-5);
        assert_eq!(desc.reflection_cache_duration(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_descs_rejected() {
        let desc = AcousticEngineDesc::default().update_rates(0.0, 15.0, 20.0);
        assert!(desc.validate().is_err());

        let desc = AcousticEngineDesc::default().realism_factor(1.5);
        assert!(desc.validate().is_err());

        let desc = AcousticEngineDesc::default().lod_distances(500.0, 100.0);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_builder_chain() {
        let desc = AcousticEngineDesc::new()
            .max_rays_per_frame(5)
            .source_caps(4, 1)
            .reflection_rays(8, 12);
        assert_eq!(desc.max_rays_per_frame, 5);
        assert_eq!(desc.max_advanced_sources, 4);
        assert_eq!(desc.max_hero_sources, 1);
        assert_eq!(desc.hero_reflection_rays, 12);
        assert!((desc.occlusion_interval() - 1.0 / 30.0).abs() < 1e-6);
    }
}
