/// State Machine Pattern for Packing Sessions
///
/// This module implements a type-safe state machine that enforces the packing
/// order at compile time. A session can only reach a later level by passing the
/// stage that produces it.
///
/// # States
///
/// - `Unstarted` - Order and pack station identified
/// - `CartScanned` - Cart presented and locked for this session
/// - `ContainerScanned` - Container on the cart claimed for this session
/// - `Inspected` - Contents matched the order manifest
/// - `PackagingSelected` - In-stock packaging permitted by the order rule chosen
/// - `InvoiceIssued` - Carrier issued invoice and tracking number
///
/// # Example
///
/// ```ignore
/// // Later states are produced by the pipeline stages, not constructed directly
/// use packstation_lib::state_machine::PackingSession;
///
/// let session = PackingSession::open("ORD-1", "ST-1")?;
/// let session = pipeline.scan_cart(&session, "CART-1").await?;
/// let session = pipeline.scan_container(&session, "CONT-1").await?;
/// ```
pub mod states;
pub mod transitions;
pub mod wrapper;

pub use states::*;
pub use wrapper::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Packing session with type-safe state
///
/// The generic parameter `S` is the level the session has reached. Session-wide
/// facts live here; stage facts live in `S`. Serialized flat, so a session at
/// any level is one record with every field it has accumulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingSession<S> {
    session_id: Uuid,

    order_id: String,

    pack_station_id: String,

    opened_at: DateTime<Utc>,

    #[serde(flatten)]
    state: S,
}

impl<S> PackingSession<S> {
    /// Get the session ID
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Get the order being packed
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Get the pack station the session runs at
    pub fn pack_station_id(&self) -> &str {
        &self.pack_station_id
    }

    /// When the session was opened
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Get the stage state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Build the next snapshot: same session-wide facts, new stage state
    fn advance<T>(&self, state: T) -> PackingSession<T> {
        PackingSession {
            session_id: self.session_id,
            order_id: self.order_id.clone(),
            pack_station_id: self.pack_station_id.clone(),
            opened_at: self.opened_at,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_accessors() {
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();

        assert_eq!(session.order_id(), "ORD-1");
        assert_eq!(session.pack_station_id(), "ST-1");
        assert!(session.opened_at() <= Utc::now());
    }

    #[test]
    fn test_advance_keeps_session_facts() {
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();
        let next = session.advance(CartScanned::new("CART-1".to_string()));

        assert_eq!(next.session_id(), session.session_id());
        assert_eq!(next.order_id(), "ORD-1");
        assert_eq!(next.opened_at(), session.opened_at());
        assert_eq!(next.state().cart_barcode(), "CART-1");
    }

    #[test]
    fn test_session_serializes_flat() {
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();
        let next = session.advance(CartScanned::new("CART-1".to_string()));

        let json = serde_json::to_value(&next).unwrap();
        assert_eq!(json["orderId"], "ORD-1");
        assert_eq!(json["packStationId"], "ST-1");
        assert_eq!(json["cartBarcode"], "CART-1");
        assert_eq!(json["sessionId"], session.session_id().to_string());

        let back: PackingSession<CartScanned> = serde_json::from_value(json).unwrap();
        assert_eq!(back, next);
    }
}
