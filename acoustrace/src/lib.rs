//! # AcousTrace
//!
//! Budgeted acoustic parameter scheduling for games and simulations.
//!
//! Every frame AcousTrace works out how each sound source should be heard
//! from the listener's point of view: how much geometry blocks the direct
//! path, which early reflections arrive and when, how much signal to send to
//! the zone's reverb, and how wide the source should sound. It does this
//! under a hard ceiling on ray casts per frame, spending them on the sources
//! that matter most.
//!
//! AcousTrace renders no audio. It produces [`SourceParams`] for an external
//! renderer and asks the host for ray casts through the [`RayTracer`] trait.
//!
//! ## Quick Start
//!
//! ```
//! use acoustrace::*;
//! use std::sync::Arc;
//!
//! struct Radio;
//!
//! impl AcousticSource for Radio {
//!     fn location(&self) -> Vec3 {
//!         Vec3::new(0.0, 0.0, -250.0)
//!     }
//! }
//!
//! // No geometry: every ray misses
//! let tracer = |_: &RayQuery| -> Option<RayHit> { None };
//!
//! let mut engine = AcousticEngine::new(
//!     AcousticEngineDesc::default(),
//!     tracer,
//!     MaterialTable::with_presets(),
//! )?;
//!
//! let radio: Arc<dyn AcousticSource> = Arc::new(Radio);
//! let handle = engine.register(radio.clone());
//!
//! engine.register_zone(ZoneDesc::new(
//!     "kitchen",
//!     ZoneType::SmallRoom,
//!     ZoneShape::aabb(Vec3::ZERO, Vec3::splat(500.0)),
//! ));
//! engine.update_listener(0, Pose::identity());
//!
//! engine.tick(1.0 / 30.0);
//!
//! let params = engine.get_params(handle).unwrap();
//! assert!(params.valid);
//! assert_eq!(params.occlusion, 0.0);
//!
//! for event in engine.poll_events() {
//!     if let AcousticEvent::ZoneChanged { new_zone, .. } = event {
//!         println!("listener entered {:?}", new_zone);
//!     }
//! }
//! # Ok::<(), AcousticError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`AcousticEngine`]**: Owns every source, listener and zone and runs the frame pipeline
//! - **[`AcousticSource`]**: Trait the host implements for anything that emits sound
//! - **[`RayTracer`]**: Trait wrapping the host's collision queries
//! - **[`AcousticEngineDesc`]**: Budget, cadence and quality configuration
//! - **[`ZoneResolver`]**: Reverb zones, portals and per-listener zone blending
//! - **[`AcousticEvent`]**: Notifications drained through [`AcousticEngine::poll_events`]
//! - **[`EngineHandle`]**: Queues registrations and listener updates from other threads
//!
//! ## Detail levels
//!
//! Sources are ranked by loudness, distance and importance every tick.
//! Admission to the expensive tiers is greedy in rank order:
//!
//! - `Off`: out of range, nothing is traced
//! - `Basic`: one occlusion ray, zone reverb send
//! - `Advanced`: occlusion plus a hemisphere of reflection rays
//! - `Hero`: occlusion plus a denser hemisphere
//!
//! Caps on Hero and Advanced sources, together with the per-frame ray
//! budget, keep the cost bounded no matter how many sources are registered.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod listener;
pub mod math;
pub mod scene;
pub mod scheduler;
pub mod source;
pub mod zone;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use command::{EngineCommand, EngineHandle};
pub use config::{AcousticEngineDesc, DetailLevel, Importance, SourceFlags, SourceSettings};
pub use engine::{AcousticEngine, FrameStats};
pub use error::{AcousticError, Result};
pub use events::AcousticEvent;
pub use listener::ListenerState;
pub use math::{Pose, Quat, Vec3};
pub use scene::{
    AcousticMaterial, MaterialId, MaterialKind, MaterialTable, RayHit, RayQuery, RayTracer,
    TraceChannel,
};
pub use scheduler::RayBudget;
pub use source::{AcousticSource, ReflectionTap, ReflectionTaps, SourceHandle, SourceParams};
pub use zone::{
    Portal, PortalDesc, PortalId, ReverbPreset, Zone, ZoneDesc, ZoneId, ZoneResolver, ZoneShape,
    ZoneType,
};
