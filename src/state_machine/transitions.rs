/// State transition implementations
///
/// Each transition borrows the current snapshot and returns a new, larger one.
/// Transitions past `Unstarted` are crate-private: the pipeline stages call them
/// only after every check for that stage has passed.
use super::states::*;
use super::PackingSession;
use crate::error::{PackingError, PackingResult};
use uuid::Uuid;

// ============================================================================
// Unstarted State Transitions
// ============================================================================

impl PackingSession<Unstarted> {
    /// Open a new packing session for an order at a pack station
    ///
    /// # Errors
    /// Returns `PackingError::InvalidSession` if either identifier is blank
    pub fn open(
        order_id: impl Into<String>,
        pack_station_id: impl Into<String>,
    ) -> PackingResult<Self> {
        let order_id = order_id.into();
        let pack_station_id = pack_station_id.into();

        if order_id.trim().is_empty() {
            return Err(PackingError::InvalidSession("order id is empty".to_string()));
        }
        if pack_station_id.trim().is_empty() {
            return Err(PackingError::InvalidSession(
                "pack station id is empty".to_string(),
            ));
        }

        Ok(Self {
            session_id: Uuid::new_v4(),
            order_id,
            pack_station_id,
            opened_at: chrono::Utc::now(),
            state: Unstarted::new(),
        })
    }

    /// Transition to CartScanned
    pub(crate) fn cart_scanned(&self, cart_barcode: String) -> PackingSession<CartScanned> {
        self.advance(CartScanned::new(cart_barcode))
    }
}

// ============================================================================
// CartScanned State Transitions
// ============================================================================

impl PackingSession<CartScanned> {
    /// Transition to ContainerScanned
    pub(crate) fn container_scanned(
        &self,
        container_barcode: String,
    ) -> PackingSession<ContainerScanned> {
        self.advance(ContainerScanned::from_cart(&self.state, container_barcode))
    }
}

// ============================================================================
// ContainerScanned State Transitions
// ============================================================================

impl PackingSession<ContainerScanned> {
    /// Transition to Inspected
    pub(crate) fn inspected(&self, scanned_items: Vec<LineItem>) -> PackingSession<Inspected> {
        self.advance(Inspected::from_container(&self.state, scanned_items))
    }
}

// ============================================================================
// Inspected State Transitions
// ============================================================================

impl PackingSession<Inspected> {
    /// Transition to PackagingSelected
    pub(crate) fn packaging_selected(
        &self,
        packaging_code: String,
    ) -> PackingSession<PackagingSelected> {
        self.advance(PackagingSelected::from_inspected(&self.state, packaging_code))
    }
}

// ============================================================================
// PackagingSelected State Transitions
// ============================================================================

impl PackingSession<PackagingSelected> {
    /// Transition to InvoiceIssued
    pub(crate) fn invoice_issued(
        &self,
        invoice_no: String,
        tracking_number: String,
    ) -> PackingSession<InvoiceIssued> {
        self.advance(InvoiceIssued::from_packaging(
            &self.state,
            invoice_no,
            tracking_number,
        ))
    }
}
