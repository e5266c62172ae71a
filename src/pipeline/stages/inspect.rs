use crate::pipeline::errors::InspectionError;
use crate::services::ManifestService;
use crate::state_machine::{ContainerScanned, Inspected, LineItem, PackingSession};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One line as scanned by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedLine {
    pub sku: String,
    pub quantity: u32,
    #[serde(default)]
    pub damaged: bool,
}

impl ScannedLine {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
            damaged: false,
        }
    }

    /// Flag the line as damaged
    pub fn damaged(mut self) -> Self {
        self.damaged = true;
        self
    }
}

/// Inspect Items stage
///
/// Runs synchronously against the locally resolved manifest. Any failing line
/// fails the whole inspection.
pub struct InspectItemsStage {
    manifests: Arc<dyn ManifestService>,
}

impl InspectItemsStage {
    pub fn new(manifests: Arc<dyn ManifestService>) -> Self {
        Self { manifests }
    }

    pub fn execute(
        &self,
        session: &PackingSession<ContainerScanned>,
        lines: &[ScannedLine],
    ) -> Result<PackingSession<Inspected>, InspectionError> {
        let expected = self
            .manifests
            .expected_items(session.order_id())
            .unwrap_or_else(|| {
                tracing::warn!(
                    session_id = %session.session_id(),
                    order_id = session.order_id(),
                    "no manifest for order; inspecting against an empty manifest"
                );
                Vec::new()
            });
        let accepted = inspect(session.order_id(), &expected, lines)?;
        Ok(session.inspected(accepted))
    }
}

/// Compare scanned lines against an order manifest
///
/// Every scanned line must pair off with its own manifest line of equal sku and
/// quantity; a manifest that lists a sku twice needs two matching scans. Lines
/// are first checked in scan order for a damage flag, then for a sku outside
/// the manifest. Only then are quantities paired: a line left without a partner
/// fails with the quantity of the first unmatched manifest line for its sku
/// (zero when none is left), and a manifest line left unscanned fails with
/// `scanned: 0`.
pub fn inspect(
    order_id: &str,
    expected: &[LineItem],
    lines: &[ScannedLine],
) -> Result<Vec<LineItem>, InspectionError> {
    for line in lines {
        if line.damaged {
            return Err(InspectionError::DamagedItem {
                sku: line.sku.clone(),
            });
        }
        if !expected.iter().any(|item| item.sku == line.sku) {
            return Err(InspectionError::SkuMismatch {
                order_id: order_id.to_string(),
                sku: line.sku.clone(),
            });
        }
    }

    let mut unmatched: HashMap<(&str, u32), usize> = HashMap::new();
    for item in expected {
        *unmatched.entry((item.sku.as_str(), item.quantity)).or_insert(0) += 1;
    }

    for line in lines {
        let paired = match unmatched.get_mut(&(line.sku.as_str(), line.quantity)) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if !paired {
            let expected_quantity = expected
                .iter()
                .find(|item| {
                    item.sku == line.sku
                        && unmatched
                            .get(&(item.sku.as_str(), item.quantity))
                            .is_some_and(|remaining| *remaining > 0)
                })
                .map(|item| item.quantity)
                .unwrap_or(0);
            return Err(InspectionError::QuantityMismatch {
                sku: line.sku.clone(),
                expected: expected_quantity,
                scanned: line.quantity,
            });
        }
    }

    if let Some(item) = expected.iter().find(|item| {
        unmatched
            .get(&(item.sku.as_str(), item.quantity))
            .is_some_and(|remaining| *remaining > 0)
    }) {
        return Err(InspectionError::QuantityMismatch {
            sku: item.sku.clone(),
            expected: item.quantity,
            scanned: 0,
        });
    }

    Ok(lines
        .iter()
        .map(|line| LineItem::new(line.sku.clone(), line.quantity))
        .collect())
}
