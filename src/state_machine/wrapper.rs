/// Type-erased wrapper for PackingSession<S>
///
/// This enum holds a session at any stage in a single type, so the last good
/// snapshot of a run can be returned, persisted and resumed without losing the
/// typed guarantees of the state it wraps.
use super::states::*;
use super::PackingSession;
use crate::error::{PackingError, PackingResult};
use crate::pipeline::PackingStage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wrapper enum that can hold a PackingSession in any state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum PackingCheckpoint {
    Unstarted(PackingSession<Unstarted>),
    CartScanned(PackingSession<CartScanned>),
    ContainerScanned(PackingSession<ContainerScanned>),
    Inspected(PackingSession<Inspected>),
    PackagingSelected(PackingSession<PackagingSelected>),
    InvoiceIssued(PackingSession<InvoiceIssued>),
}

macro_rules! on_session {
    ($checkpoint:expr, $s:ident => $body:expr) => {
        match $checkpoint {
            PackingCheckpoint::Unstarted($s) => $body,
            PackingCheckpoint::CartScanned($s) => $body,
            PackingCheckpoint::ContainerScanned($s) => $body,
            PackingCheckpoint::Inspected($s) => $body,
            PackingCheckpoint::PackagingSelected($s) => $body,
            PackingCheckpoint::InvoiceIssued($s) => $body,
        }
    };
}

impl PackingCheckpoint {
    /// Get the session ID
    pub fn session_id(&self) -> Uuid {
        on_session!(self, s => s.session_id())
    }

    /// Get the order ID
    pub fn order_id(&self) -> &str {
        on_session!(self, s => s.order_id())
    }

    pub fn pack_station_id(&self) -> &str {
        on_session!(self, s => s.pack_station_id())
    }

    /// Get the current state as a string
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::Unstarted(_) => "Unstarted",
            Self::CartScanned(_) => "CartScanned",
            Self::ContainerScanned(_) => "ContainerScanned",
            Self::Inspected(_) => "Inspected",
            Self::PackagingSelected(_) => "PackagingSelected",
            Self::InvoiceIssued(_) => "InvoiceIssued",
        }
    }

    /// The stage that would run next, or `None` once the invoice is issued
    pub fn next_stage(&self) -> Option<PackingStage> {
        match self {
            Self::Unstarted(_) => Some(PackingStage::ScanCart),
            Self::CartScanned(_) => Some(PackingStage::ScanContainer),
            Self::ContainerScanned(_) => Some(PackingStage::InspectItems),
            Self::Inspected(_) => Some(PackingStage::SelectPackaging),
            Self::PackagingSelected(_) => Some(PackingStage::IssueInvoice),
            Self::InvoiceIssued(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::InvoiceIssued(_))
    }

    /// Cart barcode, once the cart has been scanned
    pub fn cart_barcode(&self) -> Option<&str> {
        match self {
            Self::Unstarted(_) => None,
            Self::CartScanned(s) => Some(s.state().cart_barcode()),
            Self::ContainerScanned(s) => Some(s.state().cart_barcode()),
            Self::Inspected(s) => Some(s.state().cart_barcode()),
            Self::PackagingSelected(s) => Some(s.state().cart_barcode()),
            Self::InvoiceIssued(s) => Some(s.state().cart_barcode()),
        }
    }

    /// Container barcode, once the container has been scanned
    pub fn container_barcode(&self) -> Option<&str> {
        match self {
            Self::Unstarted(_) | Self::CartScanned(_) => None,
            Self::ContainerScanned(s) => Some(s.state().container_barcode()),
            Self::Inspected(s) => Some(s.state().container_barcode()),
            Self::PackagingSelected(s) => Some(s.state().container_barcode()),
            Self::InvoiceIssued(s) => Some(s.state().container_barcode()),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> PackingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate a checkpoint
    ///
    /// Beyond what serde enforces, every identifier the stage promises must be
    /// non-empty.
    pub fn from_json(json: &str) -> PackingResult<Self> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| PackingError::InvalidCheckpoint(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    fn validate(&self) -> PackingResult<()> {
        let mut fields = vec![
            ("orderId", self.order_id()),
            ("packStationId", self.pack_station_id()),
        ];
        if let Some(cart) = self.cart_barcode() {
            fields.push(("cartBarcode", cart));
        }
        if let Some(container) = self.container_barcode() {
            fields.push(("containerBarcode", container));
        }
        match self {
            Self::PackagingSelected(s) => fields.push(("packagingCode", s.state().packaging_code())),
            Self::InvoiceIssued(s) => {
                fields.push(("packagingCode", s.state().packaging_code()));
                fields.push(("invoiceNo", s.state().invoice_no()));
                fields.push(("trackingNumber", s.state().tracking_number()));
            }
            _ => {}
        }

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(PackingError::InvalidCheckpoint(format!(
                "{} must not be empty in a {} checkpoint",
                name,
                self.stage_name()
            ))),
            None => Ok(()),
        }
    }
}

macro_rules! impl_from_session {
    ($($state:ident),+ $(,)?) => {
        $(
            impl From<PackingSession<$state>> for PackingCheckpoint {
                fn from(session: PackingSession<$state>) -> Self {
                    Self::$state(session)
                }
            }
        )+
    };
}

impl_from_session!(
    Unstarted,
    CartScanned,
    ContainerScanned,
    Inspected,
    PackagingSelected,
    InvoiceIssued,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> PackingSession<Unstarted> {
        PackingSession::open("ORD-1", "ST-1").unwrap()
    }

    fn issued() -> PackingSession<InvoiceIssued> {
        open()
            .cart_scanned("CART-1".to_string())
            .container_scanned("CONT-1".to_string())
            .inspected(vec![LineItem::new("X", 2)])
            .packaging_selected("BOX-01".to_string())
            .invoice_issued("INV-1".to_string(), "TRK1".to_string())
    }

    #[test]
    fn test_checkpoint_accessors() {
        let session = open();
        let checkpoint = PackingCheckpoint::from(session.cart_scanned("CART-1".to_string()));

        assert_eq!(checkpoint.session_id(), session.session_id());
        assert_eq!(checkpoint.order_id(), "ORD-1");
        assert_eq!(checkpoint.stage_name(), "CartScanned");
        assert_eq!(checkpoint.next_stage(), Some(PackingStage::ScanContainer));
        assert_eq!(checkpoint.cart_barcode(), Some("CART-1"));
        assert_eq!(checkpoint.container_barcode(), None);
        assert!(!checkpoint.is_complete());
    }

    #[test]
    fn test_completed_checkpoint() {
        let checkpoint = PackingCheckpoint::from(issued());
        assert!(checkpoint.is_complete());
        assert_eq!(checkpoint.next_stage(), None);
    }

    #[test]
    fn test_json_tagged_by_stage() {
        let json = PackingCheckpoint::from(issued()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["stage"], "invoiceIssued");
        assert_eq!(value["orderId"], "ORD-1");
        assert_eq!(value["inspectionPassed"], true);
        assert_eq!(value["scannedItems"][0]["sku"], "X");
        assert_eq!(value["trackingNumber"], "TRK1");
    }

    #[test]
    fn test_json_restores_same_snapshot() {
        let checkpoint = PackingCheckpoint::from(issued());
        let restored = PackingCheckpoint::from_json(&checkpoint.to_json().unwrap()).unwrap();
        assert_eq!(restored, checkpoint);
    }

    #[test]
    fn test_from_json_rejects_failed_inspection() {
        let checkpoint = PackingCheckpoint::from(
            open()
                .cart_scanned("CART-1".to_string())
                .container_scanned("CONT-1".to_string())
                .inspected(vec![LineItem::new("X", 2)]),
        );
        let json = checkpoint
            .to_json()
            .unwrap()
            .replace("\"inspectionPassed\": true", "\"inspectionPassed\": false");

        let result = PackingCheckpoint::from_json(&json);
        assert!(matches!(result, Err(PackingError::InvalidCheckpoint(_))));
    }

    #[test]
    fn test_from_json_rejects_empty_identifier() {
        let checkpoint = PackingCheckpoint::from(open().cart_scanned("CART-1".to_string()));
        let json = checkpoint
            .to_json()
            .unwrap()
            .replace("\"cartBarcode\": \"CART-1\"", "\"cartBarcode\": \"\"");

        match PackingCheckpoint::from_json(&json) {
            Err(PackingError::InvalidCheckpoint(message)) => {
                assert!(message.contains("cartBarcode"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_json_rejects_unknown_stage() {
        let result = PackingCheckpoint::from_json(r#"{"stage":"shipped"}"#);
        assert!(matches!(result, Err(PackingError::InvalidCheckpoint(_))));
    }
}
