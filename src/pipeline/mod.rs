//! The packing pipeline
//!
//! Five stages run in fixed order, each consuming the snapshot produced by the
//! one before it and failing with its own closed error enum. The executor
//! chains them, keeps the last good snapshot when a stage fails, and records a
//! report per stage.
//!
//! # Example
//! ```ignore
//! use packstation_lib::pipeline::{PackingInputs, PackingPipeline, ScannedLine};
//! use packstation_lib::state_machine::PackingSession;
//!
//! let pipeline = PackingPipeline::builder()
//!     .inventory(inventory)
//!     .manifests(manifests)
//!     .packaging_rules(rules)
//!     .carrier(carrier)
//!     .build()?;
//!
//! let session = PackingSession::open("ORD-1", "ST-1")?;
//! let inputs = PackingInputs {
//!     cart_barcode: "CART-1".into(),
//!     container_barcode: "CONT-1".into(),
//!     scanned_items: vec![ScannedLine::new("X", 2)],
//!     packaging_code: "BOX-01".into(),
//! };
//!
//! match pipeline.execute(&session, &inputs).await.result {
//!     Ok(issued) => println!("tracking {}", issued.state().tracking_number()),
//!     Err(failure) if failure.is_retryable() => { /* resume from failure.last_good */ }
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! ```

pub mod core;
pub mod errors;
pub mod executor;
pub mod stages;

// Re-export main types
pub use self::core::{PackingStage, StageReport};
pub use errors::{
    InspectionError, InvoiceError, PackagingError, ScanCartError, ScanContainerError, StageError,
};
pub use executor::{
    PackingInputs, PackingPipeline, PackingPipelineBuilder, PipelineFailure, PipelineOutcome,
    ReleasedCheckout,
};
pub use stages::ScannedLine;
