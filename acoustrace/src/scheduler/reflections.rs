//! Early reflection sampling around the listener and tap clustering.

use super::budget::RayBudget;
use super::priority::RankedSource;
use super::{StageReport, TraceContext};
use crate::config::DetailLevel;
use crate::listener::ListenerState;
use crate::math::{Quat, Vec3, direction_angles, lerp};
use crate::scene::{AcousticMaterial, RayQuery};
use crate::source::params::MAX_LPF_CUTOFF;
use crate::source::{MAX_REFLECTION_TAPS, ReflectionTap, ReflectionTaps, SourceRegistry};

/// pi * (3 - sqrt(5))
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;
/// Hit count at which reflection density saturates.
pub const DENSITY_SATURATION_HITS: f32 = 20.0;
/// Tap cutoff reached on a fully high-absorbing surface.
pub const ABSORBED_TAP_LPF_CUTOFF: f32 = 3000.0;
/// Reverb send multiplier reached at full reflection density.
pub const DENSE_REVERB_SEND_SCALE: f32 = 1.5;

/// A reflection ray that struck geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionHit {
    pub location: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub material: AcousticMaterial,
}

/// `count` unit directions spread over the hemisphere around `forward`.
///
/// Inclination follows `acos(1 - i / count)` and azimuth advances by the
/// golden angle, so the set is deterministic and evenly spread.
pub fn hemisphere_directions(forward: Vec3, count: usize) -> Vec<Vec3> {
    let pole = forward.try_normalize().unwrap_or(Vec3::NEG_Z);
    let rotation = Quat::from_rotation_arc(Vec3::Z, pole);

    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let inclination = (1.0 - t).clamp(-1.0, 1.0).acos();
            let azimuth = GOLDEN_ANGLE * i as f32;
            let local = Vec3::new(
                inclination.sin() * azimuth.cos(),
                inclination.sin() * azimuth.sin(),
                inclination.cos(),
            );
            rotation * local
        })
        .collect()
}

/// Reduces raw hits to at most [`MAX_REFLECTION_TAPS`] taps, nearest first.
///
/// `density_scale` is the zone's reflection density modifier.
pub fn cluster_reflections(
    hits: &mut [ReflectionHit],
    listener: &ListenerState,
    speed_of_sound: f32,
    density_scale: f32,
) -> ReflectionTaps {
    let mut taps = ReflectionTaps::EMPTY;
    if hits.is_empty() {
        return taps;
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    taps.reflection_density =
        (hits.len() as f32 / DENSITY_SATURATION_HITS * density_scale).clamp(0.0, 1.0);

    let speed = crate::math::positive(speed_of_sound);
    let mut total_delay = 0.0;
    for hit in hits.iter().take(MAX_REFLECTION_TAPS) {
        let distance_attenuation = 1.0 / (hit.distance / 100.0).max(1.0);
        let material_attenuation = 1.0 - hit.material.average_absorption();
        let (azimuth, elevation) = direction_angles(
            hit.location - listener.location,
            listener.forward,
            listener.right,
            listener.up,
        );
        let tap = ReflectionTap {
            delay_ms: hit.distance.max(0.0) / speed * 1000.0,
            gain: (distance_attenuation * material_attenuation * 0.5).clamp(0.0, 1.0),
            lpf_cutoff: lerp(
                MAX_LPF_CUTOFF,
                ABSORBED_TAP_LPF_CUTOFF,
                hit.material.high_absorption(),
            ),
            azimuth,
            elevation,
            valid: true,
        };
        total_delay += tap.delay_ms;
        taps.push(tap);
    }

    if taps.valid_tap_count > 0 {
        taps.average_delay_ms = total_delay / taps.valid_tap_count as f32;
    }
    taps
}

/// Samples reflections for Advanced and Hero sources, highest priority first.
///
/// Basic sources fall back to the zone's default reverb send with no taps.
/// A source whose ray count does not fit in the remaining budget is skipped
/// so a cheaper one further down can still be served. Once the budget is
/// empty no further rays are cast this tick.
pub fn run_reflections(
    ctx: &TraceContext<'_>,
    ranked: &[RankedSource],
    registry: &mut SourceRegistry,
    budget: &mut RayBudget,
) -> StageReport {
    let mut report = StageReport::default();
    let preset = ctx.zones.current_preset(ctx.listener.index);
    let (trace_scale, density_scale) = ctx.zones.reflection_modifiers(ctx.listener.index);
    let trace_distance = ctx.desc.max_trace_distance * trace_scale;
    let cache_duration = ctx.desc.reflection_cache_duration();
    let default_send = preset.default_reverb_send;

    for ranked_source in ranked {
        let Some(entry) = registry.get_mut(ranked_source.handle) else {
            continue;
        };

        let rays = match entry.effective_level {
            DetailLevel::Off => continue,
            DetailLevel::Basic => {
                entry.current_params.reverb_send = default_send;
                entry.current_params.early_reflections.reset();
                continue;
            }
            DetailLevel::Advanced => ctx.desc.advanced_reflection_rays,
            DetailLevel::Hero => ctx.desc.hero_reflection_rays,
        };

        let cached = entry
            .last_reflection_update
            .is_some_and(|last| ctx.now.saturating_sub(last) < cache_duration);
        if cached {
            report.cached += 1;
            continue;
        }

        if budget.is_exhausted() || !budget.can_afford(rays) {
            report.deferred += 1;
            continue;
        }

        let origin = ctx.listener.location;
        let directions = hemisphere_directions(ctx.listener.forward, rays as usize);
        let mut hits: Vec<ReflectionHit> = directions
            .into_iter()
            .filter_map(|direction| {
                let query = RayQuery::new(origin, origin + direction * trace_distance)
                    .with_channel(ctx.desc.occlusion_channel)
                    .with_complex_geometry(ctx.desc.use_complex_collision);
                ctx.tracer.cast_ray(&query).map(|hit| ReflectionHit {
                    location: hit.location,
                    normal: hit.normal,
                    distance: hit.distance,
                    material: ctx.materials.resolve(hit.material),
                })
            })
            .collect();
        budget.try_spend_reflection(rays);

        let taps =
            cluster_reflections(&mut hits, ctx.listener, ctx.desc.speed_of_sound, density_scale);
        let params = &mut entry.current_params;
        params.reverb_send = lerp(
            default_send,
            default_send * DENSE_REVERB_SEND_SCALE,
            taps.reflection_density,
        );
        params.early_reflections = taps;
        params.clamp();

        entry.last_reflection_update = Some(ctx.now);
        report.updated += 1;
    }

    log::trace!(
        "Reflections: {} updated, {} cached, {} deferred",
        report.updated,
        report.cached,
        report.deferred
    );
    report
}
