//! Commands queued from any thread and applied at the start of the next tick.

use crate::error::{AcousticError, Result};
use crate::math::Pose;
use crate::source::{AcousticSource, SourceHandle};
use crate::zone::PortalId;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Commands queued from other threads and applied at the start of a tick.
pub enum EngineCommand {
    /// Register a source under a handle already handed out by an [`EngineHandle`]
    Register(SourceHandle, Arc<dyn AcousticSource>),
    Unregister(SourceHandle),
    /// Drop cached trace results so the source is retraced on the next cadence
    ForceRefresh(SourceHandle),
    /// Move a listener to a new pose
    UpdateListener(usize, Pose),
    SetPortalOpen(PortalId, bool),
    SetPortalOpenness(PortalId, f32),
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(handle, _) => write!(f, "Register({})", handle),
            Self::Unregister(handle) => write!(f, "Unregister({})", handle),
            Self::ForceRefresh(handle) => write!(f, "ForceRefresh({})", handle),
            Self::UpdateListener(index, pose) => write!(f, "UpdateListener({}, {:?})", index, pose),
            Self::SetPortalOpen(id, open) => write!(f, "SetPortalOpen({}, {})", id, open),
            Self::SetPortalOpenness(id, openness) => {
                write!(f, "SetPortalOpenness({}, {})", id, openness)
            }
        }
    }
}

/// Cloneable, thread-safe front end to an [`AcousticEngine`](crate::AcousticEngine).
///
/// Every call only queues a command. The engine applies queued commands in
/// order at the start of its next `tick`, so registration never races with
/// a frame in progress.
#[derive(Clone)]
pub struct EngineHandle {
    sender: Sender<EngineCommand>,
    next_handle: Arc<AtomicU64>,
}

impl EngineHandle {
    pub(crate) fn new(sender: Sender<EngineCommand>, next_handle: Arc<AtomicU64>) -> Self {
        Self {
            sender,
            next_handle,
        }
    }

    /// Queues a registration and returns the source's handle immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has been dropped.
    pub fn register(&self, source: Arc<dyn AcousticSource>) -> Result<SourceHandle> {
        let handle = SourceHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.send(EngineCommand::Register(handle, source), "register")?;
        Ok(handle)
    }

    pub fn unregister(&self, handle: SourceHandle) -> Result<()> {
        self.send(EngineCommand::Unregister(handle), "unregister")
    }

    pub fn force_refresh(&self, handle: SourceHandle) -> Result<()> {
        self.send(EngineCommand::ForceRefresh(handle), "force refresh")
    }

    pub fn update_listener(&self, index: usize, pose: Pose) -> Result<()> {
        self.send(EngineCommand::UpdateListener(index, pose), "update listener")
    }

    pub fn set_portal_open(&self, portal: PortalId, open: bool) -> Result<()> {
        self.send(EngineCommand::SetPortalOpen(portal, open), "set portal open")
    }

    pub fn set_portal_openness(&self, portal: PortalId, openness: f32) -> Result<()> {
        self.send(
            EngineCommand::SetPortalOpenness(portal, openness),
            "set portal openness",
        )
    }

    fn send(&self, command: EngineCommand, name: &str) -> Result<()> {
        self.sender.send(command).map_err(|e| {
            AcousticError::Engine(format!("Failed to send {} command: {}", name, e))
        })
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("pending", &self.sender.len())
            .finish()
    }
}
