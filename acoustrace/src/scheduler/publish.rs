//! Final shaping of source params before they are handed to the renderer.

use crate::config::{AcousticEngineDesc, SourceFlags, SourceSettings};
use crate::math::{db_to_linear, lerp};
use crate::source::SourceParams;
use crate::source::params::MAX_LPF_CUTOFF;

/// Transmission gain below which perceived distance stops growing.
pub const PERCEIVED_GAIN_FLOOR: f32 = 0.1;
/// Width given to sources flagged [`SourceFlags::LARGE_SOURCE`] at minimum.
pub const LARGE_SOURCE_MIN_WIDTH: f32 = 0.5;

/// Applies per-source settings to freshly traced params and stamps the frame.
pub fn finalize_params(
    params: &mut SourceParams,
    settings: &SourceSettings,
    desc: &AcousticEngineDesc,
    frame: u64,
) {
    if settings.has_flag(SourceFlags::NEVER_OCCLUDE) {
        params.occlusion = 0.0;
        params.low_pass_cutoff = MAX_LPF_CUTOFF;
        params.transmission_gain = 1.0;
    }

    params.dry_gain = params
        .transmission_gain
        .max(db_to_linear(desc.minimum_audibility_db));

    let mut width = settings.base_spatial_width;
    if settings.has_flag(SourceFlags::LARGE_SOURCE) {
        width = width.max(LARGE_SOURCE_MIN_WIDTH);
    }
    // occluded sound arrives from the obstruction edge, so it narrows
    let narrowing = ((params.occlusion - 0.5) / 0.5).clamp(0.0, 1.0);
    params.spatial_width = lerp(width, 0.0, narrowing);

    if let Some(send) = settings.reverb_send_override {
        params.reverb_send = send;
    }

    params.perceived_distance = (params.distance
        / params.transmission_gain.max(PERCEIVED_GAIN_FLOOR))
    .min(desc.off_lod_distance.max(params.distance));

    params.last_update_frame = frame;
    params.clamp();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occluded(occlusion: f32, gain: f32) -> SourceParams {
        SourceParams {
            occlusion,
            low_pass_cutoff: 900.0,
            transmission_gain: gain,
            distance: 400.0,
            valid: true,
            ..SourceParams::default()
        }
    }

    #[test]
    fn test_never_occlude_clears_occlusion() {
        let mut params = occluded(0.7, 0.3);
        let settings = SourceSettings::default().with_flags(SourceFlags::NEVER_OCCLUDE);
        finalize_params(&mut params, &settings, &AcousticEngineDesc::default(), 9);

        assert_eq!(params.occlusion, 0.0);
        assert_eq!(params.low_pass_cutoff, 20000.0);
        assert_eq!(params.dry_gain, 1.0);
        assert_eq!(params.perceived_distance, 400.0);
        assert_eq!(params.last_update_frame, 9);
    }

    #[test]
    fn test_dry_gain_floor() {
        let mut params = occluded(1.0, 0.0);
        let desc = AcousticEngineDesc::default().minimum_audibility_db(-20.0);
        finalize_params(&mut params, &SourceSettings::default(), &desc, 1);
        assert!((params.dry_gain - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_width_narrows_when_occluded() {
        let settings = SourceSettings::default().with_flags(SourceFlags::LARGE_SOURCE);
        let desc = AcousticEngineDesc::default();

        let mut open = occluded(0.2, 0.8);
        finalize_params(&mut open, &settings, &desc, 1);
        assert_eq!(open.spatial_width, 0.5);

        let mut half = occluded(0.75, 0.25);
        finalize_params(&mut half, &settings, &desc, 1);
        assert!((half.spatial_width - 0.25).abs() < 1e-6);

        let mut blocked = occluded(1.0, 0.0);
        finalize_params(&mut blocked, &settings, &desc, 1);
        assert_eq!(blocked.spatial_width, 0.0);
    }

    #[test]
    fn test_reverb_override_and_perceived_distance() {
        let settings = SourceSettings::default().with_reverb_send_override(0.8);
        let mut params = occluded(0.5, 0.5);
        finalize_params(&mut params, &settings, &AcousticEngineDesc::default(), 1);
        assert_eq!(params.reverb_send, 0.8);
        assert!((params.perceived_distance - 800.0).abs() < 1e-3);
    }
}
