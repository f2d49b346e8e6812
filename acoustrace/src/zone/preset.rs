//! Reverb presets for each zone type.

use crate::math::lerp;

/// Zone type hint selecting a reverb character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZoneType {
    #[default]
    Default,
    SmallRoom,
    LargeRoom,
    Hallway,
    Cave,
    Cathedral,
    Forest,
    OpenAir,
    Underwater,
    /// Uses the default preset until fields are edited by hand
    Custom,
}

/// Late reverb parameters a zone hands to the reverb router.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbPreset {
    pub zone_type: ZoneType,
    /// Decay time in seconds
    pub rt60: f32,
    /// High-frequency decay multiplier
    pub hf_decay: f32,
    /// Low-frequency decay multiplier
    pub lf_decay: f32,
    /// 0 = sparse, 1 = dense
    pub density: f32,
    /// 0 = discrete echoes, 1 = smooth tail
    pub diffusion: f32,
    pub early_reflection_level: f32,
    pub late_reverb_level: f32,
    pub pre_delay_ms: f32,
    pub room_size: f32,
    /// Reverb send for sources without reflection data
    pub default_reverb_send: f32,
}

impl ReverbPreset {
    pub const DEFAULT: Self = Self {
        zone_type: ZoneType::Default,
        rt60: 1.0,
        hf_decay: 1.0,
        lf_decay: 1.0,
        density: 0.5,
        diffusion: 0.5,
        early_reflection_level: 1.0,
        late_reverb_level: 1.0,
        pre_delay_ms: 10.0,
        room_size: 1.0,
        default_reverb_send: 0.3,
    };

    pub const fn for_zone_type(zone_type: ZoneType) -> Self {
        let (rt60, hf_decay, lf_decay, density, diffusion, early, late, pre_delay, room, send) =
            match zone_type {
                ZoneType::SmallRoom => (0.3, 0.9, 1.0, 0.7, 0.6, 1.2, 0.8, 5.0, 0.3, 0.25),
                ZoneType::LargeRoom => (0.8, 0.8, 1.0, 0.5, 0.5, 1.0, 1.0, 15.0, 1.0, 0.35),
                ZoneType::Hallway => (1.2, 0.7, 1.1, 0.3, 0.3, 1.5, 0.7, 8.0, 0.6, 0.4),
                ZoneType::Cave => (3.0, 0.6, 1.2, 0.8, 0.7, 1.3, 1.2, 25.0, 2.0, 0.5),
                ZoneType::Cathedral => (4.0, 0.5, 1.0, 0.6, 0.8, 0.8, 1.5, 40.0, 5.0, 0.6),
                ZoneType::Forest => (0.2, 1.0, 0.8, 0.2, 0.9, 0.5, 0.3, 3.0, 0.5, 0.15),
                ZoneType::OpenAir => (0.1, 1.0, 1.0, 0.1, 0.5, 0.2, 0.1, 0.0, 0.1, 0.05),
                ZoneType::Underwater => (0.5, 0.3, 1.5, 0.9, 0.9, 0.8, 1.0, 10.0, 1.0, 0.7),
                ZoneType::Default | ZoneType::Custom => {
                    (1.0, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 10.0, 1.0, 0.3)
                }
            };

        Self {
            zone_type,
            rt60,
            hf_decay,
            lf_decay,
            density,
            diffusion,
            early_reflection_level: early,
            late_reverb_level: late,
            pre_delay_ms: pre_delay,
            room_size: room,
            default_reverb_send: send,
        }
    }

    /// Field-wise blend from `self` (t = 0) to `other` (t = 1). The zone type
    /// switches to `other`'s at the halfway point.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            zone_type: if t < 0.5 { self.zone_type } else { other.zone_type },
            rt60: lerp(self.rt60, other.rt60, t),
            hf_decay: lerp(self.hf_decay, other.hf_decay, t),
            lf_decay: lerp(self.lf_decay, other.lf_decay, t),
            density: lerp(self.density, other.density, t),
            diffusion: lerp(self.diffusion, other.diffusion, t),
            early_reflection_level: lerp(
                self.early_reflection_level,
                other.early_reflection_level,
                t,
            ),
            late_reverb_level: lerp(self.late_reverb_level, other.late_reverb_level, t),
            pre_delay_ms: lerp(self.pre_delay_ms, other.pre_delay_ms, t),
            room_size: lerp(self.room_size, other.room_size, t),
            default_reverb_send: lerp(self.default_reverb_send, other.default_reverb_send, t),
        }
    }
}

impl Default for ReverbPreset {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<ZoneType> for ReverbPreset {
    fn from(zone_type: ZoneType) -> Self {
        Self::for_zone_type(zone_type)
    }
}
