//! Event types for AcousTrace

use crate::source::{SourceHandle, SourceParams};
use crate::zone::{PortalId, ZoneId};

#[derive(Debug, Clone, PartialEq)]
pub enum AcousticEvent {
    ParamsUpdated {
        handle: SourceHandle,
        params: SourceParams,
    },
    ZoneChanged {
        listener_index: usize,
        old_zone: Option<ZoneId>,
        new_zone: Option<ZoneId>,
    },
    SourceRegistered {
        handle: SourceHandle,
    },
    SourceUnregistered {
        handle: SourceHandle,
    },
    /// The host dropped the source without unregistering it
    SourcePruned {
        handle: SourceHandle,
    },
    PortalSettled {
        portal: PortalId,
        openness: f32,
    },
}

impl AcousticEvent {
    pub fn source_handle(&self) -> Option<SourceHandle> {
        match self {
            Self::ParamsUpdated { handle, .. }
            | Self::SourceRegistered { handle }
            | Self::SourceUnregistered { handle }
            | Self::SourcePruned { handle } => Some(*handle),
            _ => None,
        }
    }

    pub fn is_source_event(&self) -> bool {
        matches!(
            self,
            Self::ParamsUpdated { .. }
                | Self::SourceRegistered { .. }
                | Self::SourceUnregistered { .. }
                | Self::SourcePruned { .. }
        )
    }

    pub fn is_zone_event(&self) -> bool {
        matches!(self, Self::ZoneChanged { .. } | Self::PortalSettled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_handle_extraction() {
        let event = AcousticEvent::SourcePruned {
            handle: SourceHandle(4),
        };
        assert_eq!(event.source_handle(), Some(SourceHandle(4)));
        assert!(event.is_source_event());

        let zone = AcousticEvent::ZoneChanged {
            listener_index: 0,
            old_zone: None,
            new_zone: Some(ZoneId(1)),
        };
        assert_eq!(zone.source_handle(), None);
        assert!(zone.is_zone_event());
    }
}
