mod engine_desc;
mod source_config;

pub use engine_desc::AcousticEngineDesc;
pub use source_config::{DetailLevel, Importance, SourceFlags, SourceSettings};
