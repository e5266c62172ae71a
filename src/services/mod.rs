//! External collaborators of the packing pipeline
//!
//! The pipeline never owns inventory, manifests, packaging policy or carrier
//! integrations. It reaches them through these traits. Inventory and carrier
//! calls may suspend; manifest and packaging lookups resolve locally and do not.

pub mod memory;
pub mod mock;
pub mod types;

pub use memory::{InMemoryInventory, StaticManifests, StaticPackagingRules};
pub use mock::MockCarrier;
pub use types::{
    CarrierError, CartLock, CartRecord, ContainerClaim, ContainerRecord, ContainerStatus,
    PackagingRule, Shipment, ShipmentRequest,
};

use crate::state_machine::LineItem;
use async_trait::async_trait;
use uuid::Uuid;

/// Inventory lookup and checkout service
///
/// `lock_cart`, `claim_container` and `mark_container_packed` must be atomic
/// check-and-set operations on the implementation side. The pipeline never
/// performs a read-then-write against inventory.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Look up a cart by barcode
    async fn find_cart(&self, cart_barcode: &str) -> Option<CartRecord>;

    /// Lock a cart for a packing session
    ///
    /// Re-locking a cart the same session already holds succeeds.
    async fn lock_cart(&self, cart_barcode: &str, session_id: Uuid) -> CartLock;

    /// Release a cart lock held by the session; returns whether a lock was released
    ///
    /// Containers on the cart still claimed by the session are reopened with it.
    async fn release_cart(&self, cart_barcode: &str, session_id: Uuid) -> bool;

    /// Look up a container by barcode
    async fn find_container(&self, container_barcode: &str) -> Option<ContainerRecord>;

    /// Claim an open container for a packing session
    ///
    /// Claiming a container the same session already holds succeeds.
    async fn claim_container(&self, container_barcode: &str, session_id: Uuid) -> ContainerClaim;

    /// Return a claimed container to open; returns whether a claim was released
    async fn release_container(&self, container_barcode: &str, session_id: Uuid) -> bool;

    /// Move a container claimed by the session to the terminal packed status
    async fn mark_container_packed(&self, container_barcode: &str, session_id: Uuid) -> bool;
}

/// Order manifest service
pub trait ManifestService: Send + Sync {
    /// Expected `{sku, quantity}` lines for an order, or `None` when the order is unknown
    fn expected_items(&self, order_id: &str) -> Option<Vec<LineItem>>;
}

/// Packaging rules and packaging stock
pub trait PackagingRules: Send + Sync {
    /// Packaging rule for an order, if one exists
    fn packaging_rule(&self, order_id: &str) -> Option<PackagingRule>;

    /// Whether the packaging material is in stock
    fn in_stock(&self, packaging_code: &str) -> bool;
}

/// Shipping-carrier integration
#[async_trait]
pub trait CarrierClient: Send + Sync {
    /// Issue a shipment and return the carrier's invoice and tracking identifiers
    async fn issue_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, CarrierError>;

    /// Carrier name for logging
    fn name(&self) -> &str {
        "carrier"
    }
}
