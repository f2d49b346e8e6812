//! Priority ranking and detail-level admission.

use crate::config::{AcousticEngineDesc, DetailLevel, Importance, SourceFlags, SourceSettings};
use crate::math::{Vec3, positive};
use crate::source::{AcousticSource, SourceHandle, SourceRegistry};
use std::sync::Arc;

/// Distances are clamped to at least this many units before scoring.
pub const MIN_DISTANCE: f32 = 1.0;
/// Score multiplier for sources flagged [`SourceFlags::HERO`].
pub const HERO_PRIORITY_MULTIPLIER: f32 = 100.0;

/// Audibility priority of a source at `distance` from the listener.
///
/// An explicit override wins. Otherwise the score is loudness over distance
/// normalised by `reference_distance`, scaled by the importance tier. Hero
/// sources are boosted and critical sources always rank first.
pub fn priority_score(settings: &SourceSettings, distance: f32, reference_distance: f32) -> f32 {
    if let Some(score) = settings.effective_priority_override() {
        return score;
    }

    let normalized = positive(distance.max(MIN_DISTANCE) / positive(reference_distance));
    let mut score = settings.base_loudness * (1.0 / normalized) * settings.importance.multiplier();

    if settings.has_flag(SourceFlags::HERO) {
        score *= HERO_PRIORITY_MULTIPLIER;
    }

    if settings.importance == Importance::Critical {
        score = f32::MAX;
    }

    if score.is_nan() { 0.0 } else { score }
}

/// Greedy, priority-ordered admission into the capped detail tiers.
///
/// Feed sources highest priority first. Each call decides one source's
/// effective level from its requested level, its distance and how many
/// higher-priority sources already hold the Hero and Advanced slots.
#[derive(Debug, Clone)]
pub struct DetailAdmission {
    basic_distance: f32,
    off_distance: f32,
    max_hero: usize,
    max_advanced: usize,
    hero: usize,
    advanced: usize,
}

impl DetailAdmission {
    pub fn new(desc: &AcousticEngineDesc) -> Self {
        Self {
            basic_distance: desc.basic_lod_distance,
            off_distance: desc.off_lod_distance,
            max_hero: desc.max_hero_sources,
            max_advanced: desc.max_advanced_sources,
            hero: 0,
            advanced: 0,
        }
    }

    pub fn admit(&mut self, requested: DetailLevel, distance: f32) -> DetailLevel {
        let mut level = requested;

        if distance > self.off_distance {
            level = DetailLevel::Off;
        } else if distance > self.basic_distance && level > DetailLevel::Basic {
            level = DetailLevel::Basic;
        }

        if level == DetailLevel::Hero {
            if self.hero >= self.max_hero {
                level = DetailLevel::Advanced;
            } else {
                self.hero += 1;
            }
        }

        // a Hero request that lost its slot competes for Advanced
        if level == DetailLevel::Advanced {
            if self.advanced >= self.max_advanced {
                level = DetailLevel::Basic;
            } else {
                self.advanced += 1;
            }
        }

        level
    }

    pub fn hero_count(&self) -> usize {
        self.hero
    }

    pub fn advanced_count(&self) -> usize {
        self.advanced
    }
}

/// A live source in ranked order, with the inputs read this tick.
#[derive(Clone)]
pub struct RankedSource {
    pub handle: SourceHandle,
    pub source: Arc<dyn AcousticSource>,
    pub location: Vec3,
    pub settings: SourceSettings,
    pub score: f32,
}

impl std::fmt::Debug for RankedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankedSource")
            .field("handle", &self.handle)
            .field("location", &self.location)
            .field("score", &self.score)
            .finish()
    }
}

/// Scores every live source against the listener, sorts them by score
/// (stable, so equal scores keep registration order) and assigns effective
/// detail levels.
///
/// Writes `priority_score`, `effective_level`, `is_audible` and
/// `current_params.distance` on each entry. Entries whose source is gone are
/// marked inaudible and left out of the result.
pub fn rank_sources(
    registry: &mut SourceRegistry,
    listener: Vec3,
    desc: &AcousticEngineDesc,
) -> Vec<RankedSource> {
    let mut ranked = Vec::with_capacity(registry.len());

    for entry in registry.iter_mut() {
        let Some(source) = entry.source() else {
            entry.is_audible = false;
            entry.effective_level = DetailLevel::Off;
            continue;
        };

        let location = source.location();
        let settings = source.settings();
        let distance = location.distance(listener).max(MIN_DISTANCE);
        let score = priority_score(&settings, distance, desc.reference_distance);

        entry.current_params.distance = distance;
        entry.priority_score = score;

        ranked.push(RankedSource {
            handle: entry.handle,
            source,
            location,
            settings,
            score,
        });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut admission = DetailAdmission::new(desc);
    for source in &ranked {
        if let Some(entry) = registry.get_mut(source.handle) {
            let requested = source.settings.detail_level;
            let mut level = admission.admit(requested, entry.current_params.distance);
            // always-audible sources keep publishing past the off distance
            if level == DetailLevel::Off
                && requested > DetailLevel::Off
                && source.settings.has_flag(SourceFlags::ALWAYS_AUDIBLE)
            {
                level = DetailLevel::Basic;
            }
            entry.effective_level = level;
            entry.is_audible = level != DetailLevel::Off;
        }
    }

    log::trace!(
        "Ranked {} sources ({} hero, {} advanced)",
        ranked.len(),
        admission.hero_count(),
        admission.advanced_count()
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Emitter {
        location: Vec3,
        settings: SourceSettings,
    }

    impl AcousticSource for Emitter {
        fn location(&self) -> Vec3 {
            self.location
        }

        fn settings(&self) -> SourceSettings {
            self.settings.clone()
        }
    }

    fn add(
        registry: &mut SourceRegistry,
        keep: &mut Vec<Arc<dyn AcousticSource>>,
        location: Vec3,
        settings: SourceSettings,
    ) -> SourceHandle {
        let handle = SourceHandle(keep.len() as u64);
        let source: Arc<dyn AcousticSource> = Arc::new(Emitter { location, settings });
        registry.insert(handle, &source);
        keep.push(source);
        handle
    }

    #[test]
    fn test_score_formula() {
        let settings = SourceSettings::default().with_base_loudness(2.0);
        // 2 / (200 / 100) * 1
        assert!((priority_score(&settings, 200.0, 100.0) - 1.0).abs() < 1e-6);

        let important = settings.clone().with_importance(Importance::Important);
        assert!((priority_score(&important, 200.0, 100.0) - 2.0).abs() < 1e-6);

        let hero = settings.clone().with_flags(SourceFlags::HERO);
        assert!((priority_score(&hero, 200.0, 100.0) - 100.0).abs() < 1e-3);

        let critical = settings.clone().with_importance(Importance::Critical);
        assert_eq!(priority_score(&critical, 1.0e6, 100.0), f32::MAX);

        let overridden = settings.with_priority_override(42.0);
        assert_eq!(priority_score(&overridden, 10.0, 100.0), 42.0);
    }

    #[test]
    fn test_negative_override_is_ignored() {
        let settings = SourceSettings::default().with_priority_override(-1.0);
        assert!((priority_score(&settings, 100.0, 100.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_distance_clamp() {
        let settings = SourceSettings::default();
        assert_eq!(
            priority_score(&settings, 0.0, 100.0),
            priority_score(&settings, MIN_DISTANCE, 100.0)
        );
    }

    #[test]
    fn test_hero_cap_keeps_highest_priority() {
        let desc = AcousticEngineDesc::default().source_caps(8, 2);
        let mut registry = SourceRegistry::new();
        let mut keep = Vec::new();
        let handles: Vec<SourceHandle> = (0..10)
            .map(|i| {
                let settings = SourceSettings::default()
                    .with_detail_level(DetailLevel::Hero)
                    .with_priority_override(i as f32);
                add(&mut registry, &mut keep, Vec3::new(100.0, 0.0, 0.0), settings)
            })
            .collect();

        let ranked = rank_sources(&mut registry, Vec3::ZERO, &desc);
        assert_eq!(ranked[0].handle, handles[9]);
        assert_eq!(ranked[1].handle, handles[8]);

        for (i, handle) in handles.iter().enumerate() {
            let level = registry.get(*handle).unwrap().effective_level;
            if i >= 8 {
                assert_eq!(level, DetailLevel::Hero);
            } else {
                assert_eq!(level, DetailLevel::Advanced);
            }
        }
    }

    #[test]
    fn test_caps_never_exceeded() {
        let desc = AcousticEngineDesc::default().source_caps(3, 1);
        let mut registry = SourceRegistry::new();
        let mut keep = Vec::new();
        let levels = [DetailLevel::Hero, DetailLevel::Advanced, DetailLevel::Basic];
        for i in 0..12 {
            let settings = SourceSettings::default().with_detail_level(levels[i % 3]);
            add(
                &mut registry,
                &mut keep,
                Vec3::new(50.0 * (i + 1) as f32, 0.0, 0.0),
                settings,
            );
        }
        rank_sources(&mut registry, Vec3::ZERO, &desc);

        let count = |level| registry.iter().filter(|e| e.effective_level == level).count();
        assert_eq!(count(DetailLevel::Hero), 1);
        assert_eq!(count(DetailLevel::Advanced), 3);
        for (i, entry) in registry.iter().enumerate() {
            assert!(entry.effective_level <= levels[i % 3]);
        }
    }

    #[test]
    fn test_always_audible_survives_off_distance() {
        let desc = AcousticEngineDesc::default();
        let mut registry = SourceRegistry::new();
        let mut keep = Vec::new();
        let far = Vec3::new(desc.off_lod_distance * 2.0, 0.0, 0.0);
        let siren = add(
            &mut registry,
            &mut keep,
            far,
            SourceSettings::default()
                .with_detail_level(DetailLevel::Hero)
                .with_flags(SourceFlags::ALWAYS_AUDIBLE),
        );
        let hum = add(&mut registry, &mut keep, far, SourceSettings::default());
        let muted = add(
            &mut registry,
            &mut keep,
            far,
            SourceSettings::default()
                .with_detail_level(DetailLevel::Off)
                .with_flags(SourceFlags::ALWAYS_AUDIBLE),
        );

        rank_sources(&mut registry, Vec3::ZERO, &desc);

        let siren = registry.get(siren).unwrap();
        assert_eq!(siren.effective_level, DetailLevel::Basic);
        assert!(siren.is_audible);
        assert_eq!(registry.get(hum).unwrap().effective_level, DetailLevel::Off);
        assert_eq!(registry.get(muted).unwrap().effective_level, DetailLevel::Off);
    }

    #[test]
    fn test_distance_downgrades() {
        let desc = AcousticEngineDesc::default().lod_distances(1000.0, 2000.0);
        let mut admission = DetailAdmission::new(&desc);
        assert_eq!(admission.admit(DetailLevel::Hero, 500.0), DetailLevel::Hero);
        assert_eq!(admission.admit(DetailLevel::Hero, 1500.0), DetailLevel::Basic);
        assert_eq!(admission.admit(DetailLevel::Basic, 1500.0), DetailLevel::Basic);
        assert_eq!(admission.admit(DetailLevel::Advanced, 2500.0), DetailLevel::Off);
    }

    #[test]
    fn test_moving_past_basic_never_raises_level() {
        let desc = AcousticEngineDesc::default();
        for requested in [
            DetailLevel::Off,
            DetailLevel::Basic,
            DetailLevel::Advanced,
            DetailLevel::Hero,
        ] {
            let near = DetailAdmission::new(&desc).admit(requested, desc.basic_lod_distance - 1.0);
            let far = DetailAdmission::new(&desc).admit(requested, desc.basic_lod_distance + 1.0);
            assert!(far <= near);
            assert!(far <= DetailLevel::Basic);
        }
    }

    #[test]
    fn test_equal_scores_keep_registration_order() {
        let desc = AcousticEngineDesc::default();
        let mut registry = SourceRegistry::new();
        let mut keep = Vec::new();
        let handles: Vec<SourceHandle> = (0..6)
            .map(|_| {
                add(
                    &mut registry,
                    &mut keep,
                    Vec3::new(0.0, 0.0, -300.0),
                    SourceSettings::default(),
                )
            })
            .collect();

        for _ in 0..3 {
            let order: Vec<SourceHandle> = rank_sources(&mut registry, Vec3::ZERO, &desc)
                .iter()
                .map(|r| r.handle)
                .collect();
            assert_eq!(order, handles);
        }
    }

    #[test]
    fn test_dead_sources_are_skipped() {
        let desc = AcousticEngineDesc::default();
        let mut registry = SourceRegistry::new();
        let mut keep = Vec::new();
        let alive = add(&mut registry, &mut keep, Vec3::X, SourceSettings::default());
        let dead = add(&mut registry, &mut keep, Vec3::Y, SourceSettings::default());
        keep.pop();

        let ranked = rank_sources(&mut registry, Vec3::ZERO, &desc);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].handle, alive);
        assert!(!registry.get(dead).unwrap().is_audible);
    }
}
