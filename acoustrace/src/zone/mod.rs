//! Reverberant zones and the portals connecting them.
//!
//! Zones are spatial regions carrying a [`ReverbPreset`]. The [`ZoneResolver`]
//! answers point-containment queries, tracks which zone each listener is in
//! and crossfades the effective preset when a listener moves between zones.
//! Portals do not gate zone resolution. They expose transmission and filter
//! values that the occlusion stage applies when a portal lies on the direct
//! path between a source and the listener.

pub mod portal;
pub mod preset;
pub mod resolver;
pub mod volume;

pub use portal::{Portal, PortalDesc, PortalId};
pub use preset::{ReverbPreset, ZoneType};
pub use resolver::{ZoneBlend, ZoneChange, ZoneResolver};
pub use volume::{Zone, ZoneDesc, ZoneId, ZoneShape};
