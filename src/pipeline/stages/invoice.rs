use crate::pipeline::errors::InvoiceError;
use crate::services::{CarrierClient, CarrierError, InventoryService, ShipmentRequest};
use crate::state_machine::{InvoiceIssued, PackagingSelected, PackingSession};
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound on a single carrier call
pub const DEFAULT_CARRIER_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue Invoice stage
///
/// Calls the carrier once, bounded by a timeout. On success the container is
/// marked packed and the cart lock released. Any failure leaves the checkout
/// untouched so the stage can be retried from the `PackagingSelected` snapshot.
pub struct IssueInvoiceStage {
    inventory: Arc<dyn InventoryService>,
    carrier: Arc<dyn CarrierClient>,
    timeout: Duration,
}

impl IssueInvoiceStage {
    pub fn new(inventory: Arc<dyn InventoryService>, carrier: Arc<dyn CarrierClient>) -> Self {
        Self {
            inventory,
            carrier,
            timeout: DEFAULT_CARRIER_TIMEOUT,
        }
    }

    /// Override the carrier call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn execute(
        &self,
        session: &PackingSession<PackagingSelected>,
    ) -> Result<PackingSession<InvoiceIssued>, InvoiceError> {
        let state = session.state();
        let request = ShipmentRequest {
            session_id: session.session_id(),
            order_id: session.order_id().to_string(),
            pack_station_id: session.pack_station_id().to_string(),
            container_barcode: state.container_barcode().to_string(),
            packaging_code: state.packaging_code().to_string(),
            items: state.scanned_items().to_vec(),
        };

        tracing::debug!(
            session_id = %session.session_id(),
            carrier = self.carrier.name(),
            order_id = session.order_id(),
            "requesting shipment from carrier"
        );

        let shipment = match tokio::time::timeout(self.timeout, self.carrier.issue_shipment(&request))
            .await
        {
            Ok(Ok(shipment)) => shipment,
            Ok(Err(e)) => return Err(map_carrier_error(e, &request)),
            Err(_) => {
                return Err(InvoiceError::CarrierApiFailure {
                    message: format!(
                        "{} did not respond within {}ms",
                        self.carrier.name(),
                        self.timeout.as_millis()
                    ),
                })
            }
        };

        if shipment.invoice_no.trim().is_empty() || shipment.tracking_number.trim().is_empty() {
            return Err(InvoiceError::CarrierApiFailure {
                message: format!(
                    "{} returned an empty invoice or tracking number",
                    self.carrier.name()
                ),
            });
        }

        let session_id = session.session_id();
        if !self
            .inventory
            .mark_container_packed(state.container_barcode(), session_id)
            .await
        {
            tracing::warn!(
                session_id = %session_id,
                container = state.container_barcode(),
                "container was not claimed by this session when marking it packed"
            );
        }
        if !self
            .inventory
            .release_cart(state.cart_barcode(), session_id)
            .await
        {
            tracing::warn!(
                session_id = %session_id,
                cart = state.cart_barcode(),
                "cart lock was no longer held at invoice time"
            );
        }

        Ok(session.invoice_issued(shipment.invoice_no, shipment.tracking_number))
    }
}

fn map_carrier_error(error: CarrierError, request: &ShipmentRequest) -> InvoiceError {
    match error {
        CarrierError::Transient(message) => InvoiceError::CarrierApiFailure { message },
        CarrierError::AddressInvalid(message) => InvoiceError::AddressInvalid {
            order_id: request.order_id.clone(),
            message,
        },
        CarrierError::RateNotFound(message) => InvoiceError::RateNotFound {
            order_id: request.order_id.clone(),
            packaging_code: request.packaging_code.clone(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ContainerStatus, InMemoryInventory, MockCarrier, Shipment};
    use crate::state_machine::{LineItem, Unstarted};

    fn inventory() -> Arc<InMemoryInventory> {
        Arc::new(
            InMemoryInventory::new()
                .with_cart("CART-1", "ST-1")
                .with_container("CONT-1", "CART-1"),
        )
    }

    /// Walks a session up to PackagingSelected, holding the cart lock and container claim
    async fn packaging_selected(inventory: &InMemoryInventory) -> PackingSession<PackagingSelected> {
        let session: PackingSession<Unstarted> = PackingSession::open("ORD-1", "ST-1").unwrap();
        inventory.lock_cart("CART-1", session.session_id()).await;
        inventory
            .claim_container("CONT-1", session.session_id())
            .await;
        session
            .cart_scanned("CART-1".to_string())
            .container_scanned("CONT-1".to_string())
            .inspected(vec![LineItem::new("X", 2)])
            .packaging_selected("BOX-01".to_string())
    }

    #[tokio::test]
    async fn test_issue_invoice_success() {
        let inventory = inventory();
        let carrier = Arc::new(MockCarrier::instant());
        let stage = IssueInvoiceStage::new(inventory.clone(), carrier.clone());
        let session = packaging_selected(&inventory).await;

        let issued = stage.execute(&session).await.unwrap();

        assert!(!issued.state().invoice_no().is_empty());
        assert!(!issued.state().tracking_number().is_empty());
        assert_eq!(issued.state().packaging_code(), "BOX-01");
        assert_eq!(carrier.calls(), 1);
        assert_eq!(
            inventory.container_status("CONT-1"),
            Some(ContainerStatus::Packed)
        );
        assert_eq!(inventory.cart_lock_holder("CART-1"), None);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_checkout() {
        let inventory = inventory();
        let carrier = Arc::new(MockCarrier::instant());
        carrier.push_response(Err(CarrierError::Transient("503".to_string())));
        let stage = IssueInvoiceStage::new(inventory.clone(), carrier.clone());
        let session = packaging_selected(&inventory).await;

        let err = stage.execute(&session).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(
            inventory.container_status("CONT-1"),
            Some(ContainerStatus::Claimed(session.session_id()))
        );

        // Same input, second attempt succeeds
        assert!(stage.execute(&session).await.is_ok());
        assert_eq!(carrier.calls(), 2);
    }

    #[tokio::test]
    async fn test_address_invalid_carries_order() {
        let inventory = inventory();
        let carrier = Arc::new(MockCarrier::instant());
        carrier.push_response(Err(CarrierError::AddressInvalid("no such street".to_string())));
        let stage = IssueInvoiceStage::new(inventory.clone(), carrier);
        let session = packaging_selected(&inventory).await;

        let err = stage.execute(&session).await.unwrap_err();

        assert_eq!(
            err,
            InvoiceError::AddressInvalid {
                order_id: "ORD-1".to_string(),
                message: "no such street".to_string(),
            }
        );
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_rate_not_found_carries_packaging() {
        let inventory = inventory();
        let carrier = Arc::new(MockCarrier::instant());
        carrier.push_response(Err(CarrierError::RateNotFound("oversize".to_string())));
        let stage = IssueInvoiceStage::new(inventory.clone(), carrier);
        let session = packaging_selected(&inventory).await;

        match stage.execute(&session).await.unwrap_err() {
            InvoiceError::RateNotFound {
                packaging_code, ..
            } => assert_eq!(packaging_code, "BOX-01"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_carrier_timeout() {
        let inventory = inventory();
        let carrier = Arc::new(MockCarrier::with_delay(200));
        let stage = IssueInvoiceStage::new(inventory.clone(), carrier)
            .with_timeout(Duration::from_millis(20));
        let session = packaging_selected(&inventory).await;

        let err = stage.execute(&session).await.unwrap_err();
        assert_eq!(err.kind(), "CARRIER_API_FAILURE");
    }

    #[tokio::test]
    async fn test_empty_tracking_number_rejected() {
        let inventory = inventory();
        let carrier = Arc::new(MockCarrier::instant());
        carrier.push_response(Ok(Shipment {
            invoice_no: "INV-1".to_string(),
            tracking_number: "  ".to_string(),
        }));
        let stage = IssueInvoiceStage::new(inventory.clone(), carrier);
        let session = packaging_selected(&inventory).await;

        let err = stage.execute(&session).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(inventory.cart_lock_holder("CART-1"), Some(session.session_id()));
    }
}
