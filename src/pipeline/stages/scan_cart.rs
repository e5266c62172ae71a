use crate::pipeline::errors::ScanCartError;
use crate::services::{CartLock, InventoryService};
use crate::state_machine::{CartScanned, PackingSession, Unstarted};
use std::sync::Arc;

/// Scan Cart stage
///
/// Checks, in order, that the cart exists, that it is parked at the session's
/// pack station, and that this session can lock it. The lock is an atomic
/// check-and-set on the inventory side.
pub struct ScanCartStage {
    inventory: Arc<dyn InventoryService>,
}

impl ScanCartStage {
    pub fn new(inventory: Arc<dyn InventoryService>) -> Self {
        Self { inventory }
    }

    pub async fn execute(
        &self,
        session: &PackingSession<Unstarted>,
        cart_barcode: &str,
    ) -> Result<PackingSession<CartScanned>, ScanCartError> {
        let not_found = || ScanCartError::CartNotFound {
            cart_barcode: cart_barcode.to_string(),
        };

        let cart = self
            .inventory
            .find_cart(cart_barcode)
            .await
            .ok_or_else(not_found)?;

        if cart.location != session.pack_station_id() {
            return Err(ScanCartError::CartNotAtStation {
                cart_barcode: cart_barcode.to_string(),
                pack_station_id: session.pack_station_id().to_string(),
                actual_location: cart.location,
            });
        }

        match self
            .inventory
            .lock_cart(cart_barcode, session.session_id())
            .await
        {
            CartLock::Acquired => {}
            CartLock::HeldBy(held_by) => {
                return Err(ScanCartError::CartLocked {
                    cart_barcode: cart_barcode.to_string(),
                    held_by,
                })
            }
            CartLock::Unknown => return Err(not_found()),
        }

        tracing::debug!(
            session_id = %session.session_id(),
            cart = cart_barcode,
            "cart locked for packing session"
        );

        Ok(session.cart_scanned(cart_barcode.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryInventory;
    use proptest::prelude::*;

    fn setup() -> (Arc<InMemoryInventory>, ScanCartStage) {
        let inventory = Arc::new(
            InMemoryInventory::new()
                .with_cart("CART-1", "ST-1")
                .with_cart("CART-2", "DOCK-4"),
        );
        let stage = ScanCartStage::new(inventory.clone());
        (inventory, stage)
    }

    #[tokio::test]
    async fn test_scan_cart_success() {
        let (inventory, stage) = setup();
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();

        let scanned = stage.execute(&session, "CART-1").await.unwrap();

        assert_eq!(scanned.session_id(), session.session_id());
        assert_eq!(scanned.order_id(), "ORD-1");
        assert_eq!(scanned.pack_station_id(), "ST-1");
        assert_eq!(scanned.state().cart_barcode(), "CART-1");
        assert_eq!(
            inventory.cart_lock_holder("CART-1"),
            Some(session.session_id())
        );
    }

    #[tokio::test]
    async fn test_scan_cart_not_found() {
        let (_, stage) = setup();
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();

        let err = stage.execute(&session, "CART-404").await.unwrap_err();

        assert_eq!(
            err,
            ScanCartError::CartNotFound {
                cart_barcode: "CART-404".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_scan_cart_wrong_station() {
        let (inventory, stage) = setup();
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();

        let err = stage.execute(&session, "CART-2").await.unwrap_err();

        assert_eq!(err.kind(), "CART_NOT_AT_STATION");
        assert!(matches!(
            err,
            ScanCartError::CartNotAtStation { ref actual_location, .. } if actual_location == "DOCK-4"
        ));
        // A refused cart is not locked
        assert_eq!(inventory.cart_lock_holder("CART-2"), None);
    }

    #[tokio::test]
    async fn test_scan_cart_locked_by_other_session() {
        let (_, stage) = setup();
        let first = PackingSession::open("ORD-1", "ST-1").unwrap();
        let second = PackingSession::open("ORD-2", "ST-1").unwrap();

        stage.execute(&first, "CART-1").await.unwrap();
        let err = stage.execute(&second, "CART-1").await.unwrap_err();

        assert_eq!(
            err,
            ScanCartError::CartLocked {
                cart_barcode: "CART-1".to_string(),
                held_by: first.session_id(),
            }
        );
    }

    #[tokio::test]
    async fn test_scan_cart_rescan_by_same_session() {
        let (_, stage) = setup();
        let session = PackingSession::open("ORD-1", "ST-1").unwrap();

        stage.execute(&session, "CART-1").await.unwrap();
        assert!(stage.execute(&session, "CART-1").await.is_ok());
    }

    proptest! {
        #[test]
        fn test_scan_unregistered_cart_is_never_found(
            barcode in "[A-Z0-9-]{1,12}".prop_filter("registered cart", |b| b != "CART-1" && b != "CART-2")
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let (inventory, stage) = setup();
            let session = PackingSession::open("ORD-1", "ST-1").unwrap();

            let err = runtime
                .block_on(stage.execute(&session, &barcode))
                .unwrap_err();

            prop_assert_eq!(err.kind(), "CART_NOT_FOUND");
            prop_assert_eq!(inventory.cart_lock_holder(&barcode), None);
        }
    }
}
