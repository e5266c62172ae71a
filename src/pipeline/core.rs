use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The five packing stages, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PackingStage {
    ScanCart,
    ScanContainer,
    InspectItems,
    SelectPackaging,
    IssueInvoice,
}

impl PackingStage {
    /// All stages in execution order
    pub const ALL: [PackingStage; 5] = [
        PackingStage::ScanCart,
        PackingStage::ScanContainer,
        PackingStage::InspectItems,
        PackingStage::SelectPackaging,
        PackingStage::IssueInvoice,
    ];

    /// Get stage name for logging and reports
    pub fn name(&self) -> &'static str {
        match self {
            PackingStage::ScanCart => "Scan Cart",
            PackingStage::ScanContainer => "Scan Container",
            PackingStage::InspectItems => "Inspect Items",
            PackingStage::SelectPackaging => "Select Packaging",
            PackingStage::IssueInvoice => "Issue Invoice",
        }
    }

    /// Whether the stage consults an external system and may suspend
    pub fn is_effectful(&self) -> bool {
        matches!(
            self,
            PackingStage::ScanCart | PackingStage::ScanContainer | PackingStage::IssueInvoice
        )
    }

    /// 1-based position in the pipeline
    pub fn position(&self) -> usize {
        match self {
            PackingStage::ScanCart => 1,
            PackingStage::ScanContainer => 2,
            PackingStage::InspectItems => 3,
            PackingStage::SelectPackaging => 4,
            PackingStage::IssueInvoice => 5,
        }
    }
}

impl fmt::Display for PackingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single stage execution within a pipeline run
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Stage that ran
    pub stage: PackingStage,

    /// Whether the stage succeeded
    pub success: bool,

    /// Error code if failed
    pub error_kind: Option<&'static str>,

    /// Error message if failed
    pub error: Option<String>,

    /// Duration of execution
    pub duration: Duration,
}

impl StageReport {
    /// Create a successful stage report
    pub fn success(stage: PackingStage, duration: Duration) -> Self {
        Self {
            stage,
            success: true,
            error_kind: None,
            error: None,
            duration,
        }
    }

    /// Create a failed stage report
    pub fn failure(
        stage: PackingStage,
        error_kind: &'static str,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            stage,
            success: false,
            error_kind: Some(error_kind),
            error: Some(error.into()),
            duration,
        }
    }
}
