use super::core::{PackingStage, StageReport};
use super::errors::{
    InspectionError, InvoiceError, PackagingError, ScanCartError, ScanContainerError, StageError,
};
use super::stages::{
    InspectItemsStage, IssueInvoiceStage, ScanCartStage, ScanContainerStage, ScannedLine,
    SelectPackagingStage, DEFAULT_CARRIER_TIMEOUT,
};
use crate::config::PackingConfig;
use crate::error::{PackingError, PackingResult};
use crate::events::{timestamp, EventSink, NoopSink, PipelineEvent};
use crate::repository::{CheckpointRepository, FileCheckpointRepository};
use crate::services::{CarrierClient, InventoryService, ManifestService, PackagingRules};
use crate::state_machine::{
    CartScanned, ContainerScanned, Inspected, InvoiceIssued, PackagingSelected, PackingCheckpoint,
    PackingSession, Unstarted,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Operator input for a full run
///
/// When resuming, inputs of stages the checkpoint already passed are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingInputs {
    pub cart_barcode: String,
    pub container_barcode: String,
    pub scanned_items: Vec<ScannedLine>,
    pub packaging_code: String,
}

/// A run that stopped at a failing stage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} failed: {}", .error.stage(), .error)]
pub struct PipelineFailure {
    pub error: StageError,

    /// The last state the session successfully reached
    pub last_good: PackingCheckpoint,
}

impl PipelineFailure {
    pub fn stage(&self) -> PackingStage {
        self.error.stage()
    }

    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

/// Result of a pipeline run
#[derive(Debug)]
pub struct PipelineOutcome {
    pub result: Result<PackingSession<InvoiceIssued>, PipelineFailure>,

    /// One report per stage that ran, in order
    pub stage_reports: Vec<StageReport>,

    pub total_duration: Duration,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The furthest state reached: the completed session or the last good one
    pub fn checkpoint(&self) -> PackingCheckpoint {
        match &self.result {
            Ok(session) => session.clone().into(),
            Err(failure) => failure.last_good.clone(),
        }
    }

    pub fn stages_completed(&self) -> usize {
        self.stage_reports.iter().filter(|r| r.success).count()
    }
}

/// What `abandon` gave back to inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleasedCheckout {
    pub cart: bool,
    pub container: bool,
}

/// Per-run bookkeeping
struct Run {
    session_id: Uuid,
    reports: Vec<StageReport>,
}

/// The packing pipeline
///
/// Exposes the five stage transitions individually and chains them in fixed
/// order through `execute` and `resume`. Holds no per-session state; any number
/// of sessions may run through one pipeline concurrently.
///
/// # Example
/// ```ignore
/// let pipeline = PackingPipeline::builder()
///     .inventory(inventory)
///     .manifests(manifests)
///     .packaging_rules(rules)
///     .carrier(carrier)
///     .build()?;
///
/// let session = PackingSession::open("ORD-1", "ST-1")?;
/// let outcome = pipeline.execute(&session, &inputs).await;
/// ```
pub struct PackingPipeline {
    scan_cart: ScanCartStage,
    scan_container: ScanContainerStage,
    inspect_items: InspectItemsStage,
    select_packaging: SelectPackagingStage,
    issue_invoice: IssueInvoiceStage,
    inventory: Arc<dyn InventoryService>,
    events: Arc<dyn EventSink>,
    checkpoints: Option<Arc<dyn CheckpointRepository>>,
}

impl PackingPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PackingPipelineBuilder {
        PackingPipelineBuilder::new()
    }

    // ========================================================================
    // Stage transitions
    // ========================================================================

    pub async fn scan_cart(
        &self,
        session: &PackingSession<Unstarted>,
        cart_barcode: &str,
    ) -> Result<PackingSession<CartScanned>, ScanCartError> {
        self.scan_cart.execute(session, cart_barcode).await
    }

    pub async fn scan_container(
        &self,
        session: &PackingSession<CartScanned>,
        container_barcode: &str,
    ) -> Result<PackingSession<ContainerScanned>, ScanContainerError> {
        self.scan_container.execute(session, container_barcode).await
    }

    pub fn inspect_items(
        &self,
        session: &PackingSession<ContainerScanned>,
        scanned_items: &[ScannedLine],
    ) -> Result<PackingSession<Inspected>, InspectionError> {
        self.inspect_items.execute(session, scanned_items)
    }

    pub fn select_packaging(
        &self,
        session: &PackingSession<Inspected>,
        packaging_code: &str,
    ) -> Result<PackingSession<PackagingSelected>, PackagingError> {
        self.select_packaging.execute(session, packaging_code)
    }

    pub async fn issue_invoice(
        &self,
        session: &PackingSession<PackagingSelected>,
    ) -> Result<PackingSession<InvoiceIssued>, InvoiceError> {
        self.issue_invoice.execute(session).await
    }

    // ========================================================================
    // Orchestration
    // ========================================================================

    /// Run all five stages, stopping at the first failure
    pub async fn execute(
        &self,
        session: &PackingSession<Unstarted>,
        inputs: &PackingInputs,
    ) -> PipelineOutcome {
        self.resume(&PackingCheckpoint::from(session.clone()), inputs)
            .await
    }

    /// Continue a session from any checkpoint
    ///
    /// A completed checkpoint is returned as is without running any stage.
    pub async fn resume(
        &self,
        checkpoint: &PackingCheckpoint,
        inputs: &PackingInputs,
    ) -> PipelineOutcome {
        let pipeline_start = Instant::now();
        let mut run = Run {
            session_id: checkpoint.session_id(),
            reports: Vec::new(),
        };

        let from_stage = checkpoint.next_stage();
        if let Some(stage) = from_stage {
            let remaining = PackingStage::ALL.len() + 1 - stage.position();
            tracing::info!(
                session_id = %run.session_id,
                order_id = checkpoint.order_id(),
                from_stage = stage.name(),
                remaining,
                "starting packing pipeline"
            );
            self.events.emit(PipelineEvent::Started {
                session_id: run.session_id,
                order_id: checkpoint.order_id().to_string(),
                from_stage: stage.name().to_string(),
                remaining_stages: remaining,
                timestamp: timestamp(),
            });
        }

        let result = match checkpoint {
            PackingCheckpoint::Unstarted(s) => self.from_unstarted(&mut run, s, inputs).await,
            PackingCheckpoint::CartScanned(s) => self.from_cart_scanned(&mut run, s, inputs).await,
            PackingCheckpoint::ContainerScanned(s) => {
                self.from_container_scanned(&mut run, s, inputs).await
            }
            PackingCheckpoint::Inspected(s) => self.from_inspected(&mut run, s, inputs).await,
            PackingCheckpoint::PackagingSelected(s) => {
                self.from_packaging_selected(&mut run, s).await
            }
            PackingCheckpoint::InvoiceIssued(s) => Ok(s.clone()),
        };

        let total_duration = pipeline_start.elapsed();
        match &result {
            Ok(session) if from_stage.is_some() => {
                tracing::info!(
                    session_id = %run.session_id,
                    invoice_no = session.state().invoice_no(),
                    tracking_number = session.state().tracking_number(),
                    duration_ms = total_duration.as_millis() as u64,
                    "packing pipeline completed"
                );
                self.events.emit(PipelineEvent::Completed {
                    session_id: run.session_id,
                    invoice_no: session.state().invoice_no().to_string(),
                    tracking_number: session.state().tracking_number().to_string(),
                    total_duration_ms: total_duration.as_millis() as u64,
                    timestamp: timestamp(),
                });
            }
            Ok(_) => {}
            Err(failure) => {
                tracing::info!(
                    session_id = %run.session_id,
                    last_good = failure.last_good.stage_name(),
                    "packing pipeline stopped"
                );
            }
        }

        PipelineOutcome {
            result,
            stage_reports: run.reports,
            total_duration,
        }
    }

    /// Give back whatever checkout a checkpoint holds
    ///
    /// Releases the container claim and the cart lock of an unfinished session
    /// and forgets its stored checkpoint. A completed session holds nothing.
    pub async fn abandon(&self, checkpoint: &PackingCheckpoint) -> ReleasedCheckout {
        let session_id = checkpoint.session_id();
        let mut released = ReleasedCheckout::default();

        if !checkpoint.is_complete() {
            if let Some(container) = checkpoint.container_barcode() {
                released.container = self
                    .inventory
                    .release_container(container, session_id)
                    .await;
            }
            if let Some(cart) = checkpoint.cart_barcode() {
                released.cart = self.inventory.release_cart(cart, session_id).await;
            }
        }

        if let Some(repo) = &self.checkpoints {
            if let Err(e) = repo.delete(session_id) {
                tracing::warn!(session_id = %session_id, error = %e, "failed to delete checkpoint");
            }
        }

        tracing::info!(
            session_id = %session_id,
            stage = checkpoint.stage_name(),
            released_cart = released.cart,
            released_container = released.container,
            "packing session abandoned"
        );
        self.events.emit(PipelineEvent::Abandoned {
            session_id,
            stage_name: checkpoint.stage_name().to_string(),
            released_cart: released.cart,
            released_container: released.container,
            timestamp: timestamp(),
        });

        released
    }

    async fn from_unstarted(
        &self,
        run: &mut Run,
        session: &PackingSession<Unstarted>,
        inputs: &PackingInputs,
    ) -> Result<PackingSession<InvoiceIssued>, PipelineFailure> {
        let stage = PackingStage::ScanCart;
        let started = self.begin(run, stage);
        let result = self.scan_cart(session, &inputs.cart_barcode).await;
        let next = self.finish(run, stage, started, session, result)?;
        self.from_cart_scanned(run, &next, inputs).await
    }

    async fn from_cart_scanned(
        &self,
        run: &mut Run,
        session: &PackingSession<CartScanned>,
        inputs: &PackingInputs,
    ) -> Result<PackingSession<InvoiceIssued>, PipelineFailure> {
        let stage = PackingStage::ScanContainer;
        let started = self.begin(run, stage);
        let result = self.scan_container(session, &inputs.container_barcode).await;
        let next = self.finish(run, stage, started, session, result)?;
        self.from_container_scanned(run, &next, inputs).await
    }

    async fn from_container_scanned(
        &self,
        run: &mut Run,
        session: &PackingSession<ContainerScanned>,
        inputs: &PackingInputs,
    ) -> Result<PackingSession<InvoiceIssued>, PipelineFailure> {
        let stage = PackingStage::InspectItems;
        let started = self.begin(run, stage);
        let result = self.inspect_items(session, &inputs.scanned_items);
        let next = self.finish(run, stage, started, session, result)?;
        self.from_inspected(run, &next, inputs).await
    }

    async fn from_inspected(
        &self,
        run: &mut Run,
        session: &PackingSession<Inspected>,
        inputs: &PackingInputs,
    ) -> Result<PackingSession<InvoiceIssued>, PipelineFailure> {
        let stage = PackingStage::SelectPackaging;
        let started = self.begin(run, stage);
        let result = self.select_packaging(session, &inputs.packaging_code);
        let next = self.finish(run, stage, started, session, result)?;
        self.from_packaging_selected(run, &next).await
    }

    async fn from_packaging_selected(
        &self,
        run: &mut Run,
        session: &PackingSession<PackagingSelected>,
    ) -> Result<PackingSession<InvoiceIssued>, PipelineFailure> {
        let stage = PackingStage::IssueInvoice;
        let started = self.begin(run, stage);
        let result = self.issue_invoice(session).await;
        self.finish(run, stage, started, session, result)
    }

    fn begin(&self, run: &Run, stage: PackingStage) -> Instant {
        tracing::debug!(
            session_id = %run.session_id,
            "executing stage {}/{}: {}",
            stage.position(),
            PackingStage::ALL.len(),
            stage.name()
        );
        Instant::now()
    }

    /// Record a stage outcome: log, report, emit, and checkpoint on success
    fn finish<P, T, E>(
        &self,
        run: &mut Run,
        stage: PackingStage,
        started: Instant,
        input: &PackingSession<P>,
        result: Result<PackingSession<T>, E>,
    ) -> Result<PackingSession<T>, PipelineFailure>
    where
        PackingSession<P>: Clone + Into<PackingCheckpoint>,
        PackingSession<T>: Clone + Into<PackingCheckpoint>,
        E: Into<StageError>,
    {
        let duration = started.elapsed();
        let duration_ms = duration.as_millis() as u64;

        match result {
            Ok(next) => {
                tracing::info!(
                    session_id = %run.session_id,
                    stage = stage.name(),
                    duration_ms,
                    "stage completed"
                );
                self.events.emit(PipelineEvent::StageCompleted {
                    session_id: run.session_id,
                    stage_name: stage.name().to_string(),
                    stage_index: stage.position() - 1,
                    duration_ms,
                    timestamp: timestamp(),
                });
                run.reports.push(StageReport::success(stage, duration));

                if let Some(repo) = &self.checkpoints {
                    if let Err(e) = repo.save(&next.clone().into()) {
                        tracing::warn!(
                            session_id = %run.session_id,
                            stage = stage.name(),
                            error = %e,
                            "failed to save checkpoint"
                        );
                    }
                }
                Ok(next)
            }
            Err(e) => {
                let error: StageError = e.into();
                tracing::warn!(
                    session_id = %run.session_id,
                    stage = stage.name(),
                    kind = error.kind(),
                    retryable = error.is_retryable(),
                    duration_ms,
                    "stage failed: {}",
                    error
                );
                self.events.emit(PipelineEvent::StageFailed {
                    session_id: run.session_id,
                    stage_name: stage.name().to_string(),
                    stage_index: stage.position() - 1,
                    error_kind: error.kind().to_string(),
                    error: error.to_string(),
                    retryable: error.is_retryable(),
                    timestamp: timestamp(),
                });
                run.reports.push(StageReport::failure(
                    stage,
                    error.kind(),
                    error.to_string(),
                    duration,
                ));

                Err(PipelineFailure {
                    error,
                    last_good: input.clone().into(),
                })
            }
        }
    }
}

/// Builder for constructing packing pipelines
#[derive(Default)]
pub struct PackingPipelineBuilder {
    inventory: Option<Arc<dyn InventoryService>>,
    manifests: Option<Arc<dyn ManifestService>>,
    packaging_rules: Option<Arc<dyn PackagingRules>>,
    carrier: Option<Arc<dyn CarrierClient>>,
    carrier_timeout: Option<Duration>,
    event_sink: Option<Arc<dyn EventSink>>,
    checkpoints: Option<Arc<dyn CheckpointRepository>>,
    checkpoint_dir: Option<PathBuf>,
}

impl PackingPipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory(mut self, inventory: Arc<dyn InventoryService>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn manifests(mut self, manifests: Arc<dyn ManifestService>) -> Self {
        self.manifests = Some(manifests);
        self
    }

    pub fn packaging_rules(mut self, rules: Arc<dyn PackagingRules>) -> Self {
        self.packaging_rules = Some(rules);
        self
    }

    pub fn carrier(mut self, carrier: Arc<dyn CarrierClient>) -> Self {
        self.carrier = Some(carrier);
        self
    }

    pub fn carrier_timeout(mut self, timeout: Duration) -> Self {
        self.carrier_timeout = Some(timeout);
        self
    }

    /// Apply the pipeline-relevant parts of a station config
    ///
    /// Takes the carrier timeout and, when `checkpoint_dir` is set, saves
    /// checkpoints there unless `checkpoints` supplies a repository.
    pub fn config(mut self, config: &PackingConfig) -> Self {
        self.checkpoint_dir = config.checkpoint_dir.clone();
        self.carrier_timeout(config.carrier_timeout())
    }

    /// Send pipeline events to `sink` (dropped by default)
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Save a checkpoint after every successful stage
    pub fn checkpoints(mut self, repo: Arc<dyn CheckpointRepository>) -> Self {
        self.checkpoints = Some(repo);
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    /// Returns `PackingError::BuilderError` if a collaborator is missing, or
    /// `PackingError::CheckpointSaveFailed` if the configured checkpoint
    /// directory cannot be created
    pub fn build(self) -> PackingResult<PackingPipeline> {
        let inventory = self.inventory.ok_or_else(|| missing("inventory"))?;
        let manifests = self.manifests.ok_or_else(|| missing("manifests"))?;
        let packaging_rules = self
            .packaging_rules
            .ok_or_else(|| missing("packaging_rules"))?;
        let carrier = self.carrier.ok_or_else(|| missing("carrier"))?;

        let carrier_timeout = self.carrier_timeout.unwrap_or(DEFAULT_CARRIER_TIMEOUT);
        if carrier_timeout.is_zero() {
            return Err(PackingError::BuilderError(
                "carrier timeout must be positive".to_string(),
            ));
        }

        let checkpoints = match (self.checkpoints, self.checkpoint_dir) {
            (Some(repo), _) => Some(repo),
            (None, Some(dir)) => {
                let repo: Arc<dyn CheckpointRepository> =
                    Arc::new(FileCheckpointRepository::new(dir)?);
                Some(repo)
            }
            (None, None) => None,
        };

        Ok(PackingPipeline {
            scan_cart: ScanCartStage::new(inventory.clone()),
            scan_container: ScanContainerStage::new(inventory.clone()),
            inspect_items: InspectItemsStage::new(manifests),
            select_packaging: SelectPackagingStage::new(packaging_rules),
            issue_invoice: IssueInvoiceStage::new(inventory.clone(), carrier)
                .with_timeout(carrier_timeout),
            inventory,
            events: self.event_sink.unwrap_or_else(|| Arc::new(NoopSink)),
            checkpoints,
        })
    }
}

fn missing(collaborator: &str) -> PackingError {
    PackingError::BuilderError(format!("{} is required", collaborator))
}
