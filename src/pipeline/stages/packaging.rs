use crate::pipeline::errors::PackagingError;
use crate::services::PackagingRules;
use crate::state_machine::{Inspected, PackagingSelected, PackingSession};
use std::sync::Arc;

/// Select Packaging stage
///
/// The chosen code must be permitted by the order's packaging rule and the
/// material must be in stock. A code the catalog does not know is reported
/// as having no rule.
pub struct SelectPackagingStage {
    rules: Arc<dyn PackagingRules>,
}

impl SelectPackagingStage {
    pub fn new(rules: Arc<dyn PackagingRules>) -> Self {
        Self { rules }
    }

    pub fn execute(
        &self,
        session: &PackingSession<Inspected>,
        packaging_code: &str,
    ) -> Result<PackingSession<PackagingSelected>, PackagingError> {
        let permitted = self
            .rules
            .packaging_rule(session.order_id())
            .is_some_and(|rule| rule.permits(packaging_code));

        if !permitted {
            return Err(PackagingError::NoPackagingRule {
                order_id: session.order_id().to_string(),
                packaging_code: packaging_code.to_string(),
            });
        }

        if !self.rules.in_stock(packaging_code) {
            return Err(PackagingError::OutOfStock {
                packaging_code: packaging_code.to_string(),
            });
        }

        Ok(session.packaging_selected(packaging_code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticPackagingRules;
    use crate::state_machine::{LineItem, Unstarted};

    fn inspected() -> PackingSession<Inspected> {
        let session: PackingSession<Unstarted> = PackingSession::open("ORD-1", "ST-1").unwrap();
        session
            .cart_scanned("CART-1".to_string())
            .container_scanned("CONT-1".to_string())
            .inspected(vec![LineItem::new("X", 2)])
    }

    fn rules() -> Arc<StaticPackagingRules> {
        Arc::new(
            StaticPackagingRules::new()
                .with_rule("ORD-1", &["BOX-01", "BAG-02"])
                .with_stock("BOX-01", 10)
                .with_stock("BAG-02", 0),
        )
    }

    #[test]
    fn test_select_permitted_code_in_stock() {
        let stage = SelectPackagingStage::new(rules());
        let selected = stage.execute(&inspected(), "BOX-01").unwrap();

        assert_eq!(selected.state().packaging_code(), "BOX-01");
        assert_eq!(selected.state().scanned_items(), &[LineItem::new("X", 2)]);
    }

    #[test]
    fn test_select_code_outside_rule() {
        let stage = SelectPackagingStage::new(rules());
        let err = stage.execute(&inspected(), "CRATE-9").unwrap_err();

        assert_eq!(
            err,
            PackagingError::NoPackagingRule {
                order_id: "ORD-1".to_string(),
                packaging_code: "CRATE-9".to_string(),
            }
        );
    }

    #[test]
    fn test_select_without_order_rule() {
        let stage = SelectPackagingStage::new(Arc::new(
            StaticPackagingRules::new().with_stock("BOX-01", 10),
        ));
        let err = stage.execute(&inspected(), "BOX-01").unwrap_err();
        assert_eq!(err.kind(), "NO_PACKAGING_RULE");
    }

    #[test]
    fn test_select_out_of_stock() {
        let stage = SelectPackagingStage::new(rules());
        let err = stage.execute(&inspected(), "BAG-02").unwrap_err();

        assert_eq!(
            err,
            PackagingError::OutOfStock {
                packaging_code: "BAG-02".to_string()
            }
        );
    }

    #[test]
    fn test_restocked_material_becomes_selectable() {
        let rules = rules();
        let stage = SelectPackagingStage::new(rules.clone());
        assert!(stage.execute(&inspected(), "BAG-02").is_err());

        rules.set_stock("BAG-02", 3);
        assert!(stage.execute(&inspected(), "BAG-02").is_ok());
    }
}
