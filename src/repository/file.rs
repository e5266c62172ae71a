//! File-based repository implementations
//!
//! One pretty-printed JSON file per session, named `<session_id>.json`.

use super::traits::CheckpointRepository;
use crate::error::{PackingError, PackingResult};
use crate::state_machine::PackingCheckpoint;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CHECKPOINT_EXTENSION: &str = "json";

/// File-based checkpoint repository
pub struct FileCheckpointRepository {
    dir: PathBuf,
}

impl FileCheckpointRepository {
    /// Open a repository rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> PackingResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            PackingError::CheckpointSaveFailed(format!(
                "Failed to create checkpoint directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir
            .join(format!("{}.{}", session_id, CHECKPOINT_EXTENSION))
    }
}

impl CheckpointRepository for FileCheckpointRepository {
    fn save(&self, checkpoint: &PackingCheckpoint) -> PackingResult<()> {
        let json = checkpoint.to_json()?;
        let path = self.path_for(checkpoint.session_id());

        // Replace atomically through a sibling temp file
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| PackingError::CheckpointSaveFailed(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            session_id = %checkpoint.session_id(),
            stage = checkpoint.stage_name(),
            "checkpoint saved"
        );
        Ok(())
    }

    fn load(&self, session_id: Uuid) -> PackingResult<Option<PackingCheckpoint>> {
        let path = self.path_for(session_id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PackingError::CheckpointLoadFailed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let checkpoint = PackingCheckpoint::from_json(&json)?;
        if checkpoint.session_id() != session_id {
            return Err(PackingError::InvalidCheckpoint(format!(
                "{} holds session {}",
                path.display(),
                checkpoint.session_id()
            )));
        }
        Ok(Some(checkpoint))
    }

    fn delete(&self, session_id: Uuid) -> PackingResult<()> {
        match fs::remove_file(self.path_for(session_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> PackingResult<Vec<Uuid>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CHECKPOINT_EXTENSION) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
