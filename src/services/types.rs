use crate::state_machine::LineItem;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A cart as known to the inventory system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    pub cart_barcode: String,

    /// Current physical location (a pack station id when parked at one)
    pub location: String,
}

/// Outcome of an atomic cart lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartLock {
    /// Lock granted to (or already held by) the requesting session
    Acquired,

    /// Another live session holds the cart
    HeldBy(Uuid),

    /// The cart no longer exists
    Unknown,
}

/// Packing status of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "sessionId", rename_all = "camelCase")]
pub enum ContainerStatus {
    /// Not yet picked up by any packing session
    Open,

    /// Claimed by a packing session that has not finished
    Claimed(Uuid),

    /// Shipment issued; terminal
    Packed,
}

/// A container as known to the inventory system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub container_barcode: String,

    /// Cart the container is currently manifested on
    pub cart_barcode: String,

    pub status: ContainerStatus,
}

/// Outcome of an atomic container claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerClaim {
    Claimed,

    /// Another session already claimed it
    AlreadyClaimed(Uuid),

    AlreadyPacked,

    /// The container no longer exists
    Unknown,
}

/// Packaging rule resolved for an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingRule {
    pub order_id: String,

    /// Packaging codes that satisfy the order's dimensional/weight constraints
    pub allowed_codes: Vec<String>,
}

impl PackagingRule {
    pub fn new(order_id: impl Into<String>, allowed_codes: Vec<String>) -> Self {
        Self {
            order_id: order_id.into(),
            allowed_codes,
        }
    }

    pub fn permits(&self, packaging_code: &str) -> bool {
        self.allowed_codes.iter().any(|c| c == packaging_code)
    }
}

/// Request sent to the carrier to finalize a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    pub session_id: Uuid,
    pub order_id: String,
    pub pack_station_id: String,
    pub container_barcode: String,
    pub packaging_code: String,
    pub items: Vec<LineItem>,
}

/// Carrier-issued identifiers for a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub invoice_no: String,
    pub tracking_number: String,
}

/// Errors reported by a carrier integration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarrierError {
    /// Network or service error; the same request may be retried
    #[error("Transient carrier error: {0}")]
    Transient(String),

    #[error("Address rejected by carrier: {0}")]
    AddressInvalid(String),

    #[error("No rate available: {0}")]
    RateNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packaging_rule_permits() {
        let rule = PackagingRule::new("ORD-1", vec!["BOX-01".to_string(), "BAG-02".to_string()]);
        assert!(rule.permits("BOX-01"));
        assert!(rule.permits("BAG-02"));
        assert!(!rule.permits("BOX-99"));
    }

    #[test]
    fn test_container_status_serialization() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(ContainerStatus::Claimed(id)).unwrap();
        assert_eq!(json["status"], "claimed");
        assert_eq!(json["sessionId"], id.to_string());

        let json = serde_json::to_value(ContainerStatus::Packed).unwrap();
        assert_eq!(json["status"], "packed");
    }
}
