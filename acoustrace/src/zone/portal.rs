//! Openable acoustic connections between zones.

use super::volume::ZoneId;
use crate::math::{EPSILON, Vec3, lerp};

const OPEN_LPF_CUTOFF: f32 = 20000.0;
/// Transition rate used when `transition_time` is not positive
const INSTANT_RATE: f32 = 100.0;
const SETTLE_TOLERANCE: f32 = 0.001;

/// Stable identifier assigned to a portal when it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub u32);

impl std::fmt::Display for PortalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PortalId({})", self.0)
    }
}

/// Description of a portal before registration.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalDesc {
    pub name: String,
    pub is_open: bool,
    /// Seconds for a full open/close transition
    pub transition_time: f32,
    /// Transmission when fully closed
    pub closed_transmission: f32,
    /// Low-pass cutoff in Hz when fully closed
    pub closed_lpf_cutoff: f32,
    /// Zone on the negative side of the plane
    pub zone_a: Option<ZoneId>,
    /// Zone on the positive side of the plane
    pub zone_b: Option<ZoneId>,
    pub center: Vec3,
    pub normal: Vec3,
    /// Half size of the opening, used for segment crossing tests
    pub half_extents: Vec3,
}

impl PortalDesc {
    pub fn new(name: impl Into<String>, center: Vec3, normal: Vec3, half_extents: Vec3) -> Self {
        Self {
            name: name.into(),
            is_open: true,
            transition_time: 0.3,
            closed_transmission: 0.1,
            closed_lpf_cutoff: 800.0,
            zone_a: None,
            zone_b: None,
            center,
            normal: normal.normalize_or_zero(),
            half_extents: half_extents.abs(),
        }
    }

    pub fn closed(mut self) -> Self {
        self.is_open = false;
        self
    }

    pub fn with_transition_time(mut self, seconds: f32) -> Self {
        self.transition_time = seconds;
        self
    }

    pub fn with_closed_response(mut self, transmission: f32, lpf_cutoff: f32) -> Self {
        self.closed_transmission = transmission.clamp(0.0, 1.0);
        self.closed_lpf_cutoff = lpf_cutoff.clamp(20.0, OPEN_LPF_CUTOFF);
        self
    }

    /// Connects two zones explicitly. Unset zones are detected on registration.
    pub fn connecting(mut self, zone_a: Option<ZoneId>, zone_b: Option<ZoneId>) -> Self {
        self.zone_a = zone_a;
        self.zone_b = zone_b;
        self
    }
}

/// A registered portal with its live openness state.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    id: PortalId,
    desc: PortalDesc,
    openness: f32,
    target_openness: f32,
    active: bool,
}

impl Portal {
    pub(crate) fn new(id: PortalId, desc: PortalDesc) -> Self {
        let openness = if desc.is_open { 1.0 } else { 0.0 };
        Self {
            id,
            desc,
            openness,
            target_openness: openness,
            active: false,
        }
    }

    pub fn id(&self) -> PortalId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &PortalDesc {
        &self.desc
    }

    pub fn zone_a(&self) -> Option<ZoneId> {
        self.desc.zone_a
    }

    pub fn zone_b(&self) -> Option<ZoneId> {
        self.desc.zone_b
    }

    pub(crate) fn set_zones(&mut self, zone_a: Option<ZoneId>, zone_b: Option<ZoneId>) {
        self.desc.zone_a = zone_a;
        self.desc.zone_b = zone_b;
    }

    pub fn is_open(&self) -> bool {
        self.desc.is_open
    }

    /// Current openness, 0 = closed, 1 = open.
    pub fn openness(&self) -> f32 {
        self.openness
    }

    pub fn target_openness(&self) -> f32 {
        self.target_openness
    }

    /// True while the portal is moving toward its target openness.
    pub fn is_transitioning(&self) -> bool {
        self.active
    }

    /// Starts a transition toward fully open or fully closed.
    pub fn set_open(&mut self, open: bool) {
        self.desc.is_open = open;
        self.target_openness = if open { 1.0 } else { 0.0 };
        if self.desc.transition_time <= 0.0 {
            self.openness = self.target_openness;
            self.active = false;
        } else {
            self.active = (self.openness - self.target_openness).abs() > SETTLE_TOLERANCE;
        }
    }

    /// Jumps to an exact openness without a transition.
    pub fn set_openness(&mut self, openness: f32) {
        self.openness = openness.clamp(0.0, 1.0);
        self.target_openness = self.openness;
        self.desc.is_open = self.openness > 0.5;
        self.active = false;
    }

    /// Advances the transition. Returns true on the tick the portal settles.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }

        let rate = if self.desc.transition_time > 0.0 {
            1.0 / self.desc.transition_time
        } else {
            INSTANT_RATE
        };
        let step = rate * dt.max(0.0);
        let delta = self.target_openness - self.openness;
        if delta.abs() <= step {
            self.openness = self.target_openness;
        } else {
            self.openness += step.copysign(delta);
        }

        if (self.openness - self.target_openness).abs() <= SETTLE_TOLERANCE {
            self.openness = self.target_openness;
            self.active = false;
            return true;
        }
        false
    }

    /// Fraction of energy passing through at the current openness.
    pub fn transmission(&self) -> f32 {
        lerp(self.desc.closed_transmission, 1.0, self.openness)
    }

    /// Low-pass cutoff in Hz at the current openness.
    pub fn lpf_cutoff(&self) -> f32 {
        lerp(self.desc.closed_lpf_cutoff, OPEN_LPF_CUTOFF, self.openness)
    }

    /// Signed distance of `point` from the portal plane.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.desc.center).dot(self.desc.normal)
    }

    /// Whether the segment `from -> to` passes through the portal opening.
    pub fn is_on_sound_path(&self, from: Vec3, to: Vec3) -> bool {
        let d_from = self.signed_distance(from);
        let d_to = self.signed_distance(to);
        if d_from * d_to > 0.0 || (d_from - d_to).abs() < EPSILON {
            return false;
        }

        let t = d_from / (d_from - d_to);
        let crossing = from + (to - from) * t;
        let local = (crossing - self.desc.center).abs();
        local.cmple(self.desc.half_extents + Vec3::splat(EPSILON)).all()
    }
}
