//! Error types for AcousTrace

use crate::source::SourceHandle;
use crate::zone::{PortalId, ZoneId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcousticError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Material error: {0}")]
    Material(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Unknown source: {0}")]
    UnknownSource(SourceHandle),

    #[error("Unknown zone: {0}")]
    UnknownZone(ZoneId),

    #[error("Unknown portal: {0}")]
    UnknownPortal(PortalId),
}

pub type Result<T> = std::result::Result<T, AcousticError>;
