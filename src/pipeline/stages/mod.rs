//! The five packing stages
//!
//! 1. ScanCartStage - Lock the cart parked at the pack station
//! 2. ScanContainerStage - Claim a container manifested on that cart
//! 3. InspectItemsStage - Compare scanned lines against the order manifest
//! 4. SelectPackagingStage - Check the packaging code against rules and stock
//! 5. IssueInvoiceStage - Obtain invoice and tracking numbers from the carrier
//!
//! Each stage takes the previous snapshot by reference and returns the next
//! one, so a failed stage leaves its input intact.

pub mod inspect;
pub mod invoice;
pub mod packaging;
pub mod scan_cart;
pub mod scan_container;

pub use inspect::{InspectItemsStage, ScannedLine};
pub use invoice::{IssueInvoiceStage, DEFAULT_CARRIER_TIMEOUT};
pub use packaging::SelectPackagingStage;
pub use scan_cart::ScanCartStage;
pub use scan_container::ScanContainerStage;
