use super::types::{CarrierError, Shipment, ShipmentRequest};
use super::CarrierClient;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{sleep, Duration};
use uuid::Uuid;

/// Mock carrier for development and testing
///
/// Issues shipments without any network calls. Responses can be scripted
/// to exercise transient and permanent carrier failures; once the script is
/// exhausted every call succeeds with generated identifiers.
pub struct MockCarrier {
    /// Simulated network delay in milliseconds
    delay_ms: u64,

    /// Responses returned before falling back to generated shipments
    scripted: Mutex<VecDeque<Result<Shipment, CarrierError>>>,

    /// Number of issue_shipment calls received
    calls: AtomicU64,
}

impl MockCarrier {
    /// Create a new mock carrier with default settings
    pub fn new() -> Self {
        Self::with_delay(50)
    }

    /// Create a mock carrier with a custom simulated delay
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            scripted: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Create a mock carrier with instant responses (no delay)
    pub fn instant() -> Self {
        Self::with_delay(0)
    }

    /// Queue a response for the next unscripted call
    pub fn push_response(&self, response: Result<Shipment, CarrierError>) {
        self.scripted.lock().push_back(response);
    }

    /// Number of shipments requested so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for MockCarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CarrierClient for MockCarrier {
    async fn issue_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, CarrierError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;

        // Simulate network delay
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }

        if let Some(response) = self.scripted.lock().pop_front() {
            return response;
        }

        let tracking = Uuid::new_v4().simple().to_string().to_uppercase();
        Ok(Shipment {
            invoice_no: format!("INV-{}-{:06}", request.order_id, call),
            tracking_number: format!("TRK{}", &tracking[..12]),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::LineItem;

    fn request() -> ShipmentRequest {
        ShipmentRequest {
            session_id: Uuid::new_v4(),
            order_id: "ORD-1".to_string(),
            pack_station_id: "ST-1".to_string(),
            container_barcode: "CONT-1".to_string(),
            packaging_code: "BOX-01".to_string(),
            items: vec![LineItem::new("X", 2)],
        }
    }

    #[tokio::test]
    async fn test_mock_issues_identifiers() {
        let carrier = MockCarrier::instant();
        let shipment = carrier.issue_shipment(&request()).await.unwrap();

        assert!(shipment.invoice_no.starts_with("INV-ORD-1-"));
        assert!(shipment.tracking_number.starts_with("TRK"));
        assert_eq!(shipment.tracking_number.len(), 15);
        assert_eq!(carrier.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_responses_come_first() {
        let carrier = MockCarrier::instant();
        carrier.push_response(Err(CarrierError::Transient("503".to_string())));

        let first = carrier.issue_shipment(&request()).await;
        let second = carrier.issue_shipment(&request()).await;

        assert_eq!(first, Err(CarrierError::Transient("503".to_string())));
        assert!(second.is_ok());
        assert_eq!(carrier.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let carrier = MockCarrier::with_delay(50);

        let start = std::time::Instant::now();
        let _shipment = carrier.issue_shipment(&request()).await.unwrap();
        let elapsed = start.elapsed();

        // Should take at least 50ms
        assert!(elapsed.as_millis() >= 50);
    }
}
