use crate::pipeline::errors::ScanContainerError;
use crate::services::{ContainerClaim, ContainerStatus, InventoryService};
use crate::state_machine::{CartScanned, ContainerScanned, PackingSession};
use std::sync::Arc;

/// Scan Container stage
///
/// The container must be manifested on the scanned cart, must not be packed and
/// must not be claimed by another session. The claim itself is an atomic
/// check-and-set. A session rescanning its own claimed container succeeds, so a
/// run resumed from a checkpoint saved before the claim can continue.
pub struct ScanContainerStage {
    inventory: Arc<dyn InventoryService>,
}

impl ScanContainerStage {
    pub fn new(inventory: Arc<dyn InventoryService>) -> Self {
        Self { inventory }
    }

    pub async fn execute(
        &self,
        session: &PackingSession<CartScanned>,
        container_barcode: &str,
    ) -> Result<PackingSession<ContainerScanned>, ScanContainerError> {
        let not_found = || ScanContainerError::ContainerNotFound {
            container_barcode: container_barcode.to_string(),
        };
        let already_packed = || ScanContainerError::ContainerAlreadyPacked {
            container_barcode: container_barcode.to_string(),
        };
        let cart_barcode = session.state().cart_barcode();

        let container = self
            .inventory
            .find_container(container_barcode)
            .await
            .ok_or_else(not_found)?;

        if container.cart_barcode != cart_barcode {
            return Err(ScanContainerError::ContainerNotOnCart {
                container_barcode: container_barcode.to_string(),
                cart_barcode: cart_barcode.to_string(),
            });
        }

        if container.status == ContainerStatus::Packed {
            return Err(already_packed());
        }

        match self
            .inventory
            .claim_container(container_barcode, session.session_id())
            .await
        {
            ContainerClaim::Claimed => {}
            // Held by another live session
            ContainerClaim::AlreadyClaimed(holder) => {
                tracing::debug!(
                    container = container_barcode,
                    holder = %holder,
                    "container already claimed"
                );
                return Err(already_packed());
            }
            ContainerClaim::AlreadyPacked => return Err(already_packed()),
            ContainerClaim::Unknown => return Err(not_found()),
        }

        Ok(session.container_scanned(container_barcode.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryInventory;
    use crate::state_machine::Unstarted;

    fn cart_scanned() -> PackingSession<CartScanned> {
        let session: PackingSession<Unstarted> = PackingSession::open("ORD-1", "ST-1").unwrap();
        session.cart_scanned("CART-1".to_string())
    }

    fn setup() -> (Arc<InMemoryInventory>, ScanContainerStage) {
        let inventory = Arc::new(
            InMemoryInventory::new()
                .with_cart("CART-1", "ST-1")
                .with_cart("CART-2", "ST-1")
                .with_container("CONT-1", "CART-1")
                .with_container("CONT-2", "CART-2"),
        );
        let stage = ScanContainerStage::new(inventory.clone());
        (inventory, stage)
    }

    #[tokio::test]
    async fn test_scan_container_success() {
        let (inventory, stage) = setup();
        let session = cart_scanned();

        let scanned = stage.execute(&session, "CONT-1").await.unwrap();

        assert_eq!(scanned.state().cart_barcode(), "CART-1");
        assert_eq!(scanned.state().container_barcode(), "CONT-1");
        assert_eq!(
            inventory.container_status("CONT-1"),
            Some(ContainerStatus::Claimed(session.session_id()))
        );
    }

    #[tokio::test]
    async fn test_scan_container_not_found() {
        let (_, stage) = setup();
        let err = stage.execute(&cart_scanned(), "CONT-404").await.unwrap_err();
        assert_eq!(err.kind(), "CONTAINER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_scan_container_on_other_cart() {
        let (inventory, stage) = setup();
        let err = stage.execute(&cart_scanned(), "CONT-2").await.unwrap_err();

        assert_eq!(
            err,
            ScanContainerError::ContainerNotOnCart {
                container_barcode: "CONT-2".to_string(),
                cart_barcode: "CART-1".to_string(),
            }
        );
        assert_eq!(
            inventory.container_status("CONT-2"),
            Some(ContainerStatus::Open)
        );
    }

    #[tokio::test]
    async fn test_scan_container_claimed_by_other_session() {
        let (_, stage) = setup();
        let session = cart_scanned();

        assert!(stage.execute(&session, "CONT-1").await.is_ok());
        // Rescanning by the holder succeeds
        assert!(stage.execute(&session, "CONT-1").await.is_ok());
        let err = stage.execute(&cart_scanned(), "CONT-1").await.unwrap_err();

        assert_eq!(
            err,
            ScanContainerError::ContainerAlreadyPacked {
                container_barcode: "CONT-1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_scan_packed_container() {
        let (inventory, stage) = setup();
        let first = cart_scanned();
        stage.execute(&first, "CONT-1").await.unwrap();
        inventory
            .mark_container_packed("CONT-1", first.session_id())
            .await;

        let err = stage.execute(&cart_scanned(), "CONT-1").await.unwrap_err();
        assert_eq!(err.kind(), "CONTAINER_ALREADY_PACKED");
    }
}
