/// Processing tier of a source, cheapest first.
///
/// The ordering is meaningful: budget and distance rules only ever move a
/// source towards `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DetailLevel {
    /// Distance attenuation only, no ray work
    Off,
    /// Direct occlusion ray plus zone reverb
    Basic,
    /// Direct ray plus hemisphere reflections
    #[default]
    Advanced,
    /// Full quality, more reflection rays
    Hero,
}

/// Coarse importance tier used when ranking sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Importance {
    Background,
    #[default]
    Normal,
    Important,
    /// Always ranked first
    Critical,
}

impl Importance {
    /// Score multiplier for this tier.
    pub const fn multiplier(self) -> f32 {
        match self {
            Self::Background => 0.25,
            Self::Normal => 1.0,
            Self::Important => 2.0,
            Self::Critical => 10.0,
        }
    }
}

bitflags::bitflags! {
    /// Per-source behaviour switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SourceFlags: u8 {
        /// Multiplies the priority score so the source nearly always ranks first
        const HERO = 1 << 0;
        /// Held at Basic instead of Off beyond the off distance
        const ALWAYS_AUDIBLE = 1 << 1;
        /// Published params ignore occlusion entirely
        const NEVER_OCCLUDE = 1 << 2;
        /// Spatial width never drops below 0.5 before occlusion narrowing
        const LARGE_SOURCE = 1 << 3;
    }
}

/// Settings a source reports to the engine every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    /// Requested detail level; the effective level may be lower
    pub detail_level: DetailLevel,
    pub importance: Importance,
    pub flags: SourceFlags,
    /// Loudness weight used in the priority score
    pub base_loudness: f32,
    /// Replaces the computed priority score when set to a value >= 0
    pub priority_override: Option<f32>,
    /// 0 = point source, 1 = fully diffuse
    pub base_spatial_width: f32,
    /// Replaces the computed reverb send when set
    pub reverb_send_override: Option<f32>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::Advanced,
            importance: Importance::Normal,
            flags: SourceFlags::empty(),
            base_loudness: 1.0,
            priority_override: None,
            base_spatial_width: 0.0,
            reverb_send_override: None,
        }
    }
}

impl SourceSettings {
    pub fn with_detail_level(mut self, level: DetailLevel) -> Self {
        self.detail_level = level;
        self
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_flags(mut self, flags: SourceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_base_loudness(mut self, loudness: f32) -> Self {
        self.base_loudness = loudness;
        self
    }

    pub fn with_priority_override(mut self, priority: f32) -> Self {
        self.priority_override = Some(priority);
        self
    }

    pub fn with_spatial_width(mut self, width: f32) -> Self {
        self.base_spatial_width = width;
        self
    }

    pub fn with_reverb_send_override(mut self, send: f32) -> Self {
        self.reverb_send_override = Some(send);
        self
    }

    pub fn has_flag(&self, flag: SourceFlags) -> bool {
        self.flags.contains(flag)
    }

    /// The override if it is set and non-negative.
    pub fn effective_priority_override(&self) -> Option<f32> {
        self.priority_override.filter(|p| *p >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_level_ordering() {
        assert!(DetailLevel::Off < DetailLevel::Basic);
        assert!(DetailLevel::Basic < DetailLevel::Advanced);
        assert!(DetailLevel::Advanced < DetailLevel::Hero);
    }

    #[test]
    fn test_negative_override_ignored() {
        let settings = SourceSettings::default().with_priority_override(-1.0);
        assert_eq!(settings.effective_priority_override(), None);

        let settings = SourceSettings::default().with_priority_override(0.0);
        assert_eq!(settings.effective_priority_override(), Some(0.0));
    }

    #[test]
    fn test_flags() {
        let settings =
            SourceSettings::default().with_flags(SourceFlags::HERO | SourceFlags::NEVER_OCCLUDE);
        assert!(settings.has_flag(SourceFlags::HERO));
        assert!(!settings.has_flag(SourceFlags::LARGE_SOURCE));
    }
}
