//! Typed packing pipeline for warehouse pack stations
//!
//! A packing session moves through cart scan, container scan, inspection,
//! packaging selection and invoice issuance. Each level is its own type, so a
//! session can only reach a stage by passing every stage before it.

pub mod config;
pub mod error;
pub mod events;
pub mod logger;
pub mod pipeline;
pub mod repository;
pub mod services;
pub mod state_machine;

pub use error::{PackingError, PackingResult};
pub use pipeline::{PackingInputs, PackingPipeline, PipelineOutcome, StageError};
pub use state_machine::{PackingCheckpoint, PackingSession};
