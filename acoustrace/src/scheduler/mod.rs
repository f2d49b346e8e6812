//! The per-frame work stages driven by [`AcousticEngine`](crate::AcousticEngine).
//!
//! Each tick ranks every source, then runs the cadence-gated occlusion and
//! reflection stages over the ranked list while they share one [`RayBudget`].
//! Stages never fail. A source that cannot be served keeps its previous
//! parameters until a later tick.

pub mod budget;
pub mod occlusion;
pub mod priority;
pub mod publish;
pub mod reflections;

pub use budget::RayBudget;
pub use occlusion::{OcclusionSample, run_occlusion};
pub use priority::{DetailAdmission, RankedSource, priority_score, rank_sources};
pub use publish::finalize_params;
pub use reflections::{ReflectionHit, cluster_reflections, hemisphere_directions, run_reflections};

use crate::config::AcousticEngineDesc;
use crate::listener::ListenerState;
use crate::scene::{MaterialTable, RayTracer};
use crate::zone::ZoneResolver;
use std::time::Duration;

/// Read-only inputs shared by the tracing stages for one tick.
pub struct TraceContext<'a> {
    pub tracer: &'a dyn RayTracer,
    pub materials: &'a MaterialTable,
    pub zones: &'a ZoneResolver,
    pub desc: &'a AcousticEngineDesc,
    /// Primary listener
    pub listener: &'a ListenerState,
    /// Clock sample taken at the start of the tick
    pub now: Duration,
}

/// Outcome of one stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageReport {
    /// Sources traced this run
    pub updated: usize,
    /// Sources skipped because their cached result was still fresh
    pub cached: usize,
    /// Sources left for a later tick because the budget ran out
    pub deferred: usize,
}
