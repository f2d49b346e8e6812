//! Scene queries for acoustic simulation.
//!
//! The engine never owns geometry. Hosts implement [`RayTracer`] on top of
//! whatever collision structure they already have and describe their surfaces
//! through a [`MaterialTable`].
//!
//! # Workflow
//!
//! 1. Build a `MaterialTable` (or start from [`MaterialTable::with_presets`])
//! 2. Implement `RayTracer`, returning the [`MaterialId`] of each hit surface
//! 3. Hand both to [`AcousticEngine::new`](crate::AcousticEngine::new)
//!
//! ```rust,ignore
//! use acoustrace::scene::{AcousticMaterial, MaterialId, MaterialTable, RayHit, RayQuery, RayTracer};
//!
//! let mut materials = MaterialTable::with_presets();
//! materials.register(MaterialId(100), AcousticMaterial::FABRIC)?;
//!
//! struct MyTracer { /* your scene */ }
//!
//! impl RayTracer for MyTracer {
//!     fn cast_ray(&self, query: &RayQuery) -> Option<RayHit> {
//!         None
//!     }
//! }
//! ```

pub mod material;
pub mod ray_tracer;

pub use material::{AcousticMaterial, MaterialId, MaterialKind, MaterialTable};
pub use ray_tracer::{RayHit, RayQuery, RayTracer, TraceChannel};
