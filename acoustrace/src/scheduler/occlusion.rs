//! Direct-path occlusion between the listener and each source.

use super::budget::RayBudget;
use super::priority::RankedSource;
use super::{StageReport, TraceContext};
use crate::config::DetailLevel;
use crate::math::log_lerp;
use crate::scene::{AcousticMaterial, RayQuery};
use crate::source::SourceRegistry;
use crate::source::params::MAX_LPF_CUTOFF;

/// Cutoff approached as occlusion reaches 1, before material adjustment.
pub const OCCLUDED_LPF_CUTOFF: f32 = 500.0;

/// Direct-path values derived from one occlusion ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionSample {
    pub occlusion: f32,
    pub low_pass_cutoff: f32,
    pub transmission_gain: f32,
}

impl OcclusionSample {
    pub const CLEAR: Self = Self {
        occlusion: 0.0,
        low_pass_cutoff: MAX_LPF_CUTOFF,
        transmission_gain: 1.0,
    };

    /// Values for a ray blocked by `material`.
    pub fn blocked(material: &AcousticMaterial, realism_factor: f32) -> Self {
        let occlusion = ((1.0 - material.transmission) * realism_factor).clamp(0.0, 1.0);
        let occluded_cutoff = OCCLUDED_LPF_CUTOFF * (1.0 - material.high_absorption() * 0.5);
        Self {
            occlusion,
            low_pass_cutoff: log_lerp(MAX_LPF_CUTOFF, occluded_cutoff, occlusion),
            transmission_gain: (1.0 - occlusion) + occlusion * material.transmission,
        }
    }
}

/// Traces one ray per eligible source, highest priority first.
///
/// Sources at `Off` are skipped, as are sources whose last trace is younger
/// than the cache duration. The stage stops at the first source it cannot
/// pay for, so lower priority sources keep their previous params.
pub fn run_occlusion(
    ctx: &TraceContext<'_>,
    ranked: &[RankedSource],
    registry: &mut SourceRegistry,
    budget: &mut RayBudget,
) -> StageReport {
    let mut report = StageReport::default();
    let cache_duration = ctx.desc.occlusion_cache_duration();
    let listener = ctx.listener.location;

    for (position, ranked_source) in ranked.iter().enumerate() {
        let Some(entry) = registry.get_mut(ranked_source.handle) else {
            continue;
        };
        if entry.effective_level == DetailLevel::Off {
            continue;
        }

        if budget.is_exhausted() {
            report.deferred = ranked[position..]
                .iter()
                .filter(|r| {
                    registry
                        .get(r.handle)
                        .is_some_and(|e| e.effective_level != DetailLevel::Off)
                })
                .count();
            break;
        }

        let cached = entry
            .last_occlusion_update
            .is_some_and(|last| ctx.now.saturating_sub(last) < cache_duration);
        if cached && entry.current_params.valid {
            report.cached += 1;
            continue;
        }

        let query = RayQuery::new(listener, ranked_source.location)
            .with_channel(ctx.desc.occlusion_channel)
            .with_complex_geometry(ctx.desc.use_complex_collision);
        let mut sample = match ctx.tracer.cast_ray(&query) {
            Some(hit) => OcclusionSample::blocked(
                &ctx.materials.resolve(hit.material),
                ctx.desc.realism_factor,
            ),
            None => OcclusionSample::CLEAR,
        };

        for portal in ctx.zones.portals_on_path(listener, ranked_source.location) {
            sample.transmission_gain *= portal.transmission();
            sample.low_pass_cutoff = sample.low_pass_cutoff.min(portal.lpf_cutoff());
        }

        entry.previous_params = entry.current_params;
        let params = &mut entry.current_params;
        params.occlusion = sample.occlusion;
        params.low_pass_cutoff = sample.low_pass_cutoff;
        params.transmission_gain = sample.transmission_gain;
        params.valid = true;
        params.clamp();

        entry.last_occlusion_update = Some(ctx.now);
        budget.try_spend_occlusion(1);
        report.updated += 1;
    }

    log::trace!(
        "Occlusion: {} updated, {} cached, {} deferred",
        report.updated,
        report.cached,
        report.deferred
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::scene::{MaterialKind, TraceChannel};
    use crate::scheduler::test_support::*;
    use crate::zone::PortalDesc;
    use std::time::Duration;

    #[test]
    fn test_blocked_by_opaque_material() {
        // transmission 0 with realism 0.7
        let sample = OcclusionSample::blocked(&AcousticMaterial::DEFAULT, 0.7);
        assert!((sample.occlusion - 0.7).abs() < 1e-5);
        assert!((sample.transmission_gain - 0.3).abs() < 1e-5);

        let high_cut = 500.0 * (1.0 - AcousticMaterial::DEFAULT.high_absorption() * 0.5);
        let expected = log_lerp(20000.0, high_cut, 0.7);
        assert!((sample.low_pass_cutoff - expected).abs() < 1e-2);
        assert!(sample.low_pass_cutoff < 20000.0 && sample.low_pass_cutoff > high_cut);
    }

    #[test]
    fn test_transmissive_material_occludes_less() {
        let glass = OcclusionSample::blocked(&MaterialKind::Glass.material(), 0.7);
        let concrete = OcclusionSample::blocked(&MaterialKind::Concrete.material(), 0.7);
        assert!(glass.occlusion <= concrete.occlusion);
        assert!(glass.transmission_gain >= concrete.transmission_gain);
    }

    #[test]
    fn test_scenario_opaque_wall_at_fifty_units() {
        let mut fixture = Fixture::new(HitTracer::opaque(MaterialKind::Default.id()));
        let handle = fixture.add_source(Vec3::new(50.0, 0.0, 0.0), Default::default());
        let ranked = fixture.rank();

        let report = fixture.occlusion(&ranked, Duration::ZERO);
        assert_eq!(report.updated, 1);

        let params = fixture.registry.get(handle).unwrap().current_params;
        assert!(params.valid);
        assert!((params.occlusion - 0.7).abs() < 1e-5);
        assert!((params.transmission_gain - 0.3).abs() < 1e-5);
        assert_eq!(fixture.budget.occlusion_rays, 1);
        assert_eq!(fixture.tracer.queries()[0].channel, TraceChannel::Occlusion);
    }

    #[test]
    fn test_clear_path() {
        let mut fixture = Fixture::new(HitTracer::miss());
        let handle = fixture.add_source(Vec3::new(0.0, 0.0, -400.0), Default::default());
        let ranked = fixture.rank();
        fixture.occlusion(&ranked, Duration::ZERO);

        let params = fixture.registry.get(handle).unwrap().current_params;
        assert_eq!(params.occlusion, 0.0);
        assert_eq!(params.low_pass_cutoff, 20000.0);
        assert_eq!(params.transmission_gain, 1.0);
    }

    #[test]
    fn test_budget_stops_in_priority_order() {
        let mut fixture = Fixture::new(HitTracer::opaque(MaterialKind::Default.id()));
        fixture.desc.max_rays_per_frame = 5;
        let handles: Vec<_> = (0..6)
            .map(|_| fixture.add_source(Vec3::new(300.0, 0.0, 0.0), Default::default()))
            .collect();
        let ranked = fixture.rank();
        fixture.budget.reset(5);

        let report = fixture.occlusion(&ranked, Duration::ZERO);
        assert_eq!(report.updated, 5);
        assert_eq!(report.deferred, 1);
        assert_eq!(fixture.budget.total_used, 5);
        for handle in &handles[..5] {
            assert!(fixture.registry.get(*handle).unwrap().current_params.valid);
        }
        let last = fixture.registry.get(handles[5]).unwrap();
        assert!(!last.current_params.valid);
        assert!(last.last_occlusion_update.is_none());
    }

    #[test]
    fn test_cached_result_is_reused() {
        let mut fixture = Fixture::new(HitTracer::opaque(MaterialKind::Default.id()));
        let handle = fixture.add_source(Vec3::new(200.0, 0.0, 0.0), Default::default());
        let ranked = fixture.rank();

        fixture.occlusion(&ranked, Duration::from_millis(10));
        let first = fixture.registry.get(handle).unwrap().current_params;

        fixture.budget.reset(200);
        let report = fixture.occlusion(&ranked, Duration::from_millis(10));
        assert_eq!(report.updated, 0);
        assert_eq!(report.cached, 1);
        assert_eq!(fixture.registry.get(handle).unwrap().current_params, first);
        assert_eq!(fixture.tracer.count(), 1);

        // 5 frames at 60 Hz
        let report = fixture.occlusion(&ranked, Duration::from_millis(100));
        assert_eq!(report.updated, 1);
        assert_eq!(fixture.tracer.count(), 2);
    }

    #[test]
    fn test_closed_portal_on_path_attenuates() {
        let mut fixture = Fixture::new(HitTracer::miss());
        let door = fixture.zones.register_portal(
            PortalDesc::new(
                "door",
                Vec3::new(100.0, 0.0, 0.0),
                Vec3::X,
                Vec3::new(0.0, 100.0, 100.0),
            )
            .with_transition_time(0.0),
        );
        fixture.zones.set_portal_open(door, false).unwrap();
        let behind = fixture.add_source(Vec3::new(300.0, 0.0, 0.0), Default::default());
        let beside = fixture.add_source(Vec3::new(0.0, 0.0, 300.0), Default::default());
        let ranked = fixture.rank();
        fixture.occlusion(&ranked, Duration::ZERO);

        let params = fixture.registry.get(behind).unwrap().current_params;
        assert!((params.transmission_gain - 0.1).abs() < 1e-5);
        assert!((params.low_pass_cutoff - 800.0).abs() < 1e-2);
        assert_eq!(fixture.registry.get(beside).unwrap().current_params.transmission_gain, 1.0);
    }
}
