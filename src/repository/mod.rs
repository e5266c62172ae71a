//! Repository Pattern Implementation
//!
//! Checkpoints are the only thing the packing core persists. The trait keeps
//! the storage backend swappable.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         CheckpointRepository            │
//! │  (Abstract interface for checkpoints)   │
//! └──────────────┬──────────────────────────┘
//!                │
//!        ┌───────┴────────────────┐
//!        │                        │
//! ┌──────▼──────────┐   ┌─────────▼─────────┐
//! │FileCheckpointRepo│   │InMemoryCheckpoint │
//! │                 │   │Repo               │
//! │- JSON per       │   │- Tests            │
//! │  session        │   │- Single process   │
//! └─────────────────┘   └───────────────────┘
//! ```

pub mod file;
pub mod memory;
pub mod traits;

// Re-export main types
pub use file::FileCheckpointRepository;
pub use memory::InMemoryCheckpointRepository;
pub use traits::CheckpointRepository;
