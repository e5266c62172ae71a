//! Repository trait definitions
//!
//! These traits define the abstract interfaces for data access operations.
//! Different implementations can provide different storage backends.

use crate::error::{PackingError, PackingResult};
use crate::state_machine::PackingCheckpoint;
use uuid::Uuid;

/// Repository for packing checkpoints
///
/// Holds at most one checkpoint per session; saving replaces the previous one.
pub trait CheckpointRepository: Send + Sync {
    /// Save the latest checkpoint of a session
    fn save(&self, checkpoint: &PackingCheckpoint) -> PackingResult<()>;

    /// Load the checkpoint of a session
    fn load(&self, session_id: Uuid) -> PackingResult<Option<PackingCheckpoint>>;

    /// Delete the checkpoint of a session
    fn delete(&self, session_id: Uuid) -> PackingResult<()>;

    /// Session IDs with a stored checkpoint
    fn list(&self) -> PackingResult<Vec<Uuid>>;

    /// Load a checkpoint that must exist
    fn require(&self, session_id: Uuid) -> PackingResult<PackingCheckpoint> {
        self.load(session_id)?
            .ok_or(PackingError::CheckpointNotFound(session_id))
    }

    /// Check if a checkpoint exists
    fn has_checkpoint(&self, session_id: Uuid) -> PackingResult<bool> {
        Ok(self.load(session_id)?.is_some())
    }
}
