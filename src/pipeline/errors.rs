//! Closed, per-stage error taxonomy
//!
//! Each stage has its own enum listing every way it can refuse to advance.
//! Variants carry the identifiers involved. `kind()` is a stable code for
//! callers that log or persist failures.

use super::core::PackingStage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Scan Cart failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ScanCartError {
    #[error("Cart not found: {cart_barcode}")]
    CartNotFound { cart_barcode: String },

    #[error("Cart {cart_barcode} is at {actual_location}, expected pack station {pack_station_id}")]
    CartNotAtStation {
        cart_barcode: String,
        pack_station_id: String,
        actual_location: String,
    },

    #[error("Cart {cart_barcode} is locked by packing session {held_by}")]
    CartLocked { cart_barcode: String, held_by: Uuid },
}

impl ScanCartError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CartNotFound { .. } => "CART_NOT_FOUND",
            Self::CartNotAtStation { .. } => "CART_NOT_AT_STATION",
            Self::CartLocked { .. } => "CART_LOCKED",
        }
    }
}

/// Scan Container failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ScanContainerError {
    #[error("Container not found: {container_barcode}")]
    ContainerNotFound { container_barcode: String },

    #[error("Container {container_barcode} is not on cart {cart_barcode}")]
    ContainerNotOnCart {
        container_barcode: String,
        cart_barcode: String,
    },

    /// Packed already, or claimed by another live session
    #[error("Container {container_barcode} is already packed")]
    ContainerAlreadyPacked { container_barcode: String },
}

impl ScanContainerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContainerNotFound { .. } => "CONTAINER_NOT_FOUND",
            Self::ContainerNotOnCart { .. } => "CONTAINER_NOT_ON_CART",
            Self::ContainerAlreadyPacked { .. } => "CONTAINER_ALREADY_PACKED",
        }
    }
}

/// Inspect Items failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum InspectionError {
    #[error("Scanned SKU {sku} is not in the manifest of order {order_id}")]
    SkuMismatch { order_id: String, sku: String },

    #[error("SKU {sku}: expected quantity {expected}, scanned {scanned}")]
    QuantityMismatch {
        sku: String,
        expected: u32,
        scanned: u32,
    },

    #[error("SKU {sku} was scanned as damaged")]
    DamagedItem { sku: String },
}

impl InspectionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SkuMismatch { .. } => "SKU_MISMATCH",
            Self::QuantityMismatch { .. } => "QUANTITY_MISMATCH",
            Self::DamagedItem { .. } => "DAMAGED_ITEM",
        }
    }
}

/// Select Packaging failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PackagingError {
    #[error("No packaging rule for order {order_id} permits {packaging_code}")]
    NoPackagingRule {
        order_id: String,
        packaging_code: String,
    },

    #[error("Packaging material {packaging_code} is out of stock")]
    OutOfStock { packaging_code: String },
}

impl PackagingError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoPackagingRule { .. } => "NO_PACKAGING_RULE",
            Self::OutOfStock { .. } => "OUT_OF_STOCK",
        }
    }
}

/// Issue Invoice failures
///
/// `CarrierApiFailure` is transient and safe to retry with the same input.
/// The other two need operator or business intervention first.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum InvoiceError {
    #[error("Carrier API failure: {message}")]
    CarrierApiFailure { message: String },

    #[error("Shipping address for order {order_id} is invalid: {message}")]
    AddressInvalid { order_id: String, message: String },

    #[error("No carrier rate for order {order_id} with packaging {packaging_code}: {message}")]
    RateNotFound {
        order_id: String,
        packaging_code: String,
        message: String,
    },
}

impl InvoiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CarrierApiFailure { .. } => "CARRIER_API_FAILURE",
            Self::AddressInvalid { .. } => "ADDRESS_INVALID",
            Self::RateNotFound { .. } => "RATE_NOT_FOUND",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CarrierApiFailure { .. })
    }
}

/// Failure of any stage, as seen by the orchestrator
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "error", rename_all = "camelCase")]
pub enum StageError {
    #[error(transparent)]
    ScanCart(#[from] ScanCartError),

    #[error(transparent)]
    ScanContainer(#[from] ScanContainerError),

    #[error(transparent)]
    Inspection(#[from] InspectionError),

    #[error(transparent)]
    Packaging(#[from] PackagingError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

impl StageError {
    /// The stage that failed
    pub fn stage(&self) -> PackingStage {
        match self {
            Self::ScanCart(_) => PackingStage::ScanCart,
            Self::ScanContainer(_) => PackingStage::ScanContainer,
            Self::Inspection(_) => PackingStage::InspectItems,
            Self::Packaging(_) => PackingStage::SelectPackaging,
            Self::Invoice(_) => PackingStage::IssueInvoice,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScanCart(e) => e.kind(),
            Self::ScanContainer(e) => e.kind(),
            Self::Inspection(e) => e.kind(),
            Self::Packaging(e) => e.kind(),
            Self::Invoice(e) => e.kind(),
        }
    }

    /// Only transient carrier failures may be retried without new operator input
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Invoice(e) => e.is_retryable(),
            _ => false,
        }
    }
}
