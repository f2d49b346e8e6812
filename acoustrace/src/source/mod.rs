//! Sound sources, their registry entries and the parameters computed for them.

pub mod params;
pub mod registry;

pub use params::{MAX_REFLECTION_TAPS, ReflectionTap, ReflectionTaps, SourceParams};
pub use registry::{AcousticSource, SourceEntry, SourceHandle, SourceRegistry};
