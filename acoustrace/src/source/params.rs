//! Per-source acoustic parameters handed to the audio renderer.

pub const MIN_LPF_CUTOFF: f32 = 200.0;
pub const MAX_LPF_CUTOFF: f32 = 20000.0;
pub const MIN_HPF_CUTOFF: f32 = 20.0;
pub const MAX_HPF_CUTOFF: f32 = 2000.0;
/// Capacity of [`ReflectionTaps`]
pub const MAX_REFLECTION_TAPS: usize = 8;

/// One discrete early reflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionTap {
    /// Delay in milliseconds (>= 0)
    pub delay_ms: f32,
    /// Gain [0, 1]
    pub gain: f32,
    /// Low-pass cutoff in Hz
    pub lpf_cutoff: f32,
    /// Degrees, positive to the listener's right
    pub azimuth: f32,
    /// Degrees, positive above the listener
    pub elevation: f32,
    pub valid: bool,
}

impl ReflectionTap {
    pub const EMPTY: Self = Self {
        delay_ms: 0.0,
        gain: 0.0,
        lpf_cutoff: MAX_LPF_CUTOFF,
        azimuth: 0.0,
        elevation: 0.0,
        valid: false,
    };

    fn clamp(&mut self) {
        self.delay_ms = self.delay_ms.max(0.0);
        self.gain = self.gain.clamp(0.0, 1.0);
        self.lpf_cutoff = self.lpf_cutoff.clamp(MIN_LPF_CUTOFF, MAX_LPF_CUTOFF);
        self.azimuth = self.azimuth.clamp(-180.0, 180.0);
        self.elevation = self.elevation.clamp(-90.0, 90.0);
    }
}

impl Default for ReflectionTap {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fixed-capacity set of early reflection taps ordered by delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionTaps {
    pub taps: [ReflectionTap; MAX_REFLECTION_TAPS],
    pub valid_tap_count: usize,
    pub average_delay_ms: f32,
    /// 0 = dry surroundings, 1 = dense reflective environment
    pub reflection_density: f32,
}

impl ReflectionTaps {
    pub const EMPTY: Self = Self {
        taps: [ReflectionTap::EMPTY; MAX_REFLECTION_TAPS],
        valid_tap_count: 0,
        average_delay_ms: 0.0,
        reflection_density: 0.0,
    };

    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    /// The valid taps.
    pub fn active(&self) -> &[ReflectionTap] {
        &self.taps[..self.valid_tap_count.min(MAX_REFLECTION_TAPS)]
    }

    /// Appends a tap. Returns false when full.
    pub fn push(&mut self, mut tap: ReflectionTap) -> bool {
        if self.valid_tap_count >= MAX_REFLECTION_TAPS {
            return false;
        }
        tap.valid = true;
        tap.clamp();
        self.taps[self.valid_tap_count] = tap;
        self.valid_tap_count += 1;
        true
    }

    fn clamp(&mut self) {
        self.valid_tap_count = self.valid_tap_count.min(MAX_REFLECTION_TAPS);
        for tap in &mut self.taps[self.valid_tap_count..] {
            *tap = ReflectionTap::EMPTY;
        }
        self.average_delay_ms = self.average_delay_ms.max(0.0);
        self.reflection_density = self.reflection_density.clamp(0.0, 1.0);
    }
}

impl Default for ReflectionTaps {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Acoustic parameters computed for one source from the listener's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    /// 0 = clear line of sight, 1 = fully blocked
    pub occlusion: f32,
    pub low_pass_cutoff: f32,
    pub high_pass_cutoff: f32,
    pub transmission_gain: f32,
    pub reverb_send: f32,
    pub dry_gain: f32,
    pub spatial_width: f32,
    pub early_reflections: ReflectionTaps,
    /// Distance to the listener in world units
    pub distance: f32,
    /// Distance as heard after occlusion losses
    pub perceived_distance: f32,
    pub last_update_frame: u64,
    pub valid: bool,
}

impl SourceParams {
    pub const DEFAULT: Self = Self {
        occlusion: 0.0,
        low_pass_cutoff: MAX_LPF_CUTOFF,
        high_pass_cutoff: MIN_HPF_CUTOFF,
        transmission_gain: 1.0,
        reverb_send: 0.3,
        dry_gain: 1.0,
        spatial_width: 0.0,
        early_reflections: ReflectionTaps::EMPTY,
        distance: 0.0,
        perceived_distance: 0.0,
        last_update_frame: 0,
        valid: false,
    };

    pub fn reset(&mut self) {
        *self = Self::DEFAULT;
    }

    /// Forces every bounded field back into range.
    pub fn clamp(&mut self) {
        self.occlusion = self.occlusion.clamp(0.0, 1.0);
        self.low_pass_cutoff = self.low_pass_cutoff.clamp(MIN_LPF_CUTOFF, MAX_LPF_CUTOFF);
        self.high_pass_cutoff = self.high_pass_cutoff.clamp(MIN_HPF_CUTOFF, MAX_HPF_CUTOFF);
        self.transmission_gain = self.transmission_gain.clamp(0.0, 1.0);
        self.reverb_send = self.reverb_send.clamp(0.0, 1.0);
        self.dry_gain = self.dry_gain.clamp(0.0, 1.0);
        self.spatial_width = self.spatial_width.clamp(0.0, 1.0);
        self.distance = self.distance.max(0.0);
        self.perceived_distance = self.perceived_distance.max(0.0);
        self.early_reflections.clamp();
    }
}

impl Default for SourceParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds_fields() {
        let mut params = SourceParams {
            occlusion: 1.7,
            low_pass_cutoff: 50.0,
            high_pass_cutoff: 9000.0,
            transmission_gain: -0.2,
            reverb_send: 3.0,
            dry_gain: 2.0,
            spatial_width: -1.0,
            ..SourceParams::default()
        };
        params.early_reflections.valid_tap_count = 12;
        params.early_reflections.reflection_density = 4.0;
        params.clamp();

        assert_eq!(params.occlusion, 1.0);
        assert_eq!(params.low_pass_cutoff, MIN_LPF_CUTOFF);
        assert_eq!(params.high_pass_cutoff, MAX_HPF_CUTOFF);
        assert_eq!(params.transmission_gain, 0.0);
        assert_eq!(params.reverb_send, 1.0);
        assert_eq!(params.dry_gain, 1.0);
        assert_eq!(params.spatial_width, 0.0);
        assert_eq!(params.early_reflections.valid_tap_count, MAX_REFLECTION_TAPS);
        assert_eq!(params.early_reflections.reflection_density, 1.0);
    }

    #[test]
    fn test_taps_push_until_full() {
        let mut taps = ReflectionTaps::default();
        for i in 0..10 {
            let pushed = taps.push(ReflectionTap {
                delay_ms: i as f32,
                gain: 0.5,
                ..ReflectionTap::default()
            });
            assert_eq!(pushed, i < MAX_REFLECTION_TAPS);
        }
        assert_eq!(taps.active().len(), MAX_REFLECTION_TAPS);
        assert!(taps.active().iter().all(|t| t.valid));

        taps.reset();
        assert_eq!(taps.valid_tap_count, 0);
        assert!(taps.active().is_empty());
    }
}
