/// State type definitions for the packing state machine
///
/// Each state is a distinct type that embeds the state before it, so every level
/// structurally carries all earlier facts. Constructors are crate-private: the
/// only way to obtain a later state is through its transition.
use serde::{Deserialize, Serialize};

/// One `{sku, quantity}` pair of a manifest or an accepted scan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// Unstarted state - packing session identified, nothing physical done yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unstarted {}

/// CartScanned state - the operator presented a cart at the station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartScanned {
    cart_barcode: String,
}

/// ContainerScanned state - a container on the scanned cart is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerScanned {
    #[serde(flatten)]
    cart: CartScanned,

    container_barcode: String,
}

/// Inspected state - container contents matched the order manifest
///
/// `inspection_passed` is always `true`; a failed inspection never produces this
/// type. Deserialization rejects a record claiming otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "InspectedRecord")]
pub struct Inspected {
    #[serde(flatten)]
    container: ContainerScanned,

    inspection_passed: bool,

    scanned_items: Vec<LineItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectedRecord {
    #[serde(flatten)]
    container: ContainerScanned,
    inspection_passed: bool,
    scanned_items: Vec<LineItem>,
}

impl TryFrom<InspectedRecord> for Inspected {
    type Error = String;

    fn try_from(record: InspectedRecord) -> Result<Self, Self::Error> {
        if !record.inspection_passed {
            return Err("an inspected record must have inspectionPassed = true".to_string());
        }
        Ok(Self::from_container(&record.container, record.scanned_items))
    }
}

/// PackagingSelected state - a packaging material was chosen and is in stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingSelected {
    #[serde(flatten)]
    inspected: Inspected,

    packaging_code: String,
}

/// InvoiceIssued state - shipment finalized by the carrier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIssued {
    #[serde(flatten)]
    packaging: PackagingSelected,

    invoice_no: String,

    tracking_number: String,
}

impl Unstarted {
    pub(crate) fn new() -> Self {
        Self {}
    }
}

impl CartScanned {
    pub(crate) fn new(cart_barcode: String) -> Self {
        Self { cart_barcode }
    }

    pub fn cart_barcode(&self) -> &str {
        &self.cart_barcode
    }
}

impl ContainerScanned {
    pub(crate) fn from_cart(cart: &CartScanned, container_barcode: String) -> Self {
        Self {
            cart: cart.clone(),
            container_barcode,
        }
    }

    pub fn cart(&self) -> &CartScanned {
        &self.cart
    }

    pub fn cart_barcode(&self) -> &str {
        self.cart.cart_barcode()
    }

    pub fn container_barcode(&self) -> &str {
        &self.container_barcode
    }
}

impl Inspected {
    pub(crate) fn from_container(container: &ContainerScanned, scanned_items: Vec<LineItem>) -> Self {
        Self {
            container: container.clone(),
            inspection_passed: true,
            scanned_items,
        }
    }

    pub fn container(&self) -> &ContainerScanned {
        &self.container
    }

    pub fn cart_barcode(&self) -> &str {
        self.container.cart_barcode()
    }

    pub fn container_barcode(&self) -> &str {
        self.container.container_barcode()
    }

    pub fn inspection_passed(&self) -> bool {
        self.inspection_passed
    }

    pub fn scanned_items(&self) -> &[LineItem] {
        &self.scanned_items
    }
}

impl PackagingSelected {
    pub(crate) fn from_inspected(inspected: &Inspected, packaging_code: String) -> Self {
        Self {
            inspected: inspected.clone(),
            packaging_code,
        }
    }

    pub fn inspected(&self) -> &Inspected {
        &self.inspected
    }

    pub fn cart_barcode(&self) -> &str {
        self.inspected.cart_barcode()
    }

    pub fn container_barcode(&self) -> &str {
        self.inspected.container_barcode()
    }

    pub fn scanned_items(&self) -> &[LineItem] {
        self.inspected.scanned_items()
    }

    pub fn packaging_code(&self) -> &str {
        &self.packaging_code
    }
}

impl InvoiceIssued {
    pub(crate) fn from_packaging(
        packaging: &PackagingSelected,
        invoice_no: String,
        tracking_number: String,
    ) -> Self {
        Self {
            packaging: packaging.clone(),
            invoice_no,
            tracking_number,
        }
    }

    pub fn packaging(&self) -> &PackagingSelected {
        &self.packaging
    }

    pub fn cart_barcode(&self) -> &str {
        self.packaging.cart_barcode()
    }

    pub fn container_barcode(&self) -> &str {
        self.packaging.container_barcode()
    }

    pub fn packaging_code(&self) -> &str {
        self.packaging.packaging_code()
    }

    pub fn invoice_no(&self) -> &str {
        &self.invoice_no
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }
}
