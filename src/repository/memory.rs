use super::traits::CheckpointRepository;
use crate::error::PackingResult;
use crate::state_machine::PackingCheckpoint;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Checkpoint repository held in process memory
#[derive(Debug, Default)]
pub struct InMemoryCheckpointRepository {
    checkpoints: RwLock<HashMap<Uuid, PackingCheckpoint>>,
}

impl InMemoryCheckpointRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointRepository for InMemoryCheckpointRepository {
    fn save(&self, checkpoint: &PackingCheckpoint) -> PackingResult<()> {
        self.checkpoints
            .write()
            .insert(checkpoint.session_id(), checkpoint.clone());
        Ok(())
    }

    fn load(&self, session_id: Uuid) -> PackingResult<Option<PackingCheckpoint>> {
        Ok(self.checkpoints.read().get(&session_id).cloned())
    }

    fn delete(&self, session_id: Uuid) -> PackingResult<()> {
        self.checkpoints.write().remove(&session_id);
        Ok(())
    }

    fn list(&self) -> PackingResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.checkpoints.read().keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
