use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event names - centralized for consistency
pub mod event_names {
    pub const PIPELINE_STARTED: &str = "pipeline:started";
    pub const PIPELINE_STAGE_COMPLETED: &str = "pipeline:stage-completed";
    pub const PIPELINE_STAGE_FAILED: &str = "pipeline:stage-failed";
    pub const PIPELINE_COMPLETED: &str = "pipeline:completed";
    pub const SESSION_ABANDONED: &str = "session:abandoned";
}

/// Audit events emitted while a packing session moves through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PipelineEvent {
    /// A run started (fresh or resumed) at `from_stage`
    Started {
        session_id: Uuid,
        order_id: String,
        from_stage: String,
        remaining_stages: usize,
        timestamp: String,
    },

    StageCompleted {
        session_id: Uuid,
        stage_name: String,
        stage_index: usize,
        duration_ms: u64,
        timestamp: String,
    },

    StageFailed {
        session_id: Uuid,
        stage_name: String,
        stage_index: usize,
        error_kind: String,
        error: String,
        retryable: bool,
        timestamp: String,
    },

    Completed {
        session_id: Uuid,
        invoice_no: String,
        tracking_number: String,
        total_duration_ms: u64,
        timestamp: String,
    },

    /// A held checkout was given back without finishing the session
    Abandoned {
        session_id: Uuid,
        stage_name: String,
        released_cart: bool,
        released_container: bool,
        timestamp: String,
    },
}

impl PipelineEvent {
    /// Centralized name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => event_names::PIPELINE_STARTED,
            Self::StageCompleted { .. } => event_names::PIPELINE_STAGE_COMPLETED,
            Self::StageFailed { .. } => event_names::PIPELINE_STAGE_FAILED,
            Self::Completed { .. } => event_names::PIPELINE_COMPLETED,
            Self::Abandoned { .. } => event_names::SESSION_ABANDONED,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Started { session_id, .. }
            | Self::StageCompleted { session_id, .. }
            | Self::StageFailed { session_id, .. }
            | Self::Completed { session_id, .. }
            | Self::Abandoned { session_id, .. } => *session_id,
        }
    }
}

/// Current time as an RFC 3339 timestamp
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Receiver of pipeline events
///
/// Emission is fire-and-forget; a sink must not block the pipeline.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Names of the events received so far, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(PipelineEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(session_id: Uuid) -> PipelineEvent {
        PipelineEvent::StageFailed {
            session_id,
            stage_name: "Issue Invoice".to_string(),
            stage_index: 4,
            error_kind: "CARRIER_API_FAILURE".to_string(),
            error: "timeout".to_string(),
            retryable: true,
            timestamp: timestamp(),
        }
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(failed(Uuid::new_v4())).unwrap();

        assert_eq!(json["event"], "stageFailed");
        assert_eq!(json["errorKind"], "CARRIER_API_FAILURE");
        assert_eq!(json["retryable"], true);
        assert!(json.get("stageIndex").is_some());
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        let session_id = Uuid::new_v4();

        sink.emit(PipelineEvent::Started {
            session_id,
            order_id: "ORD-1".to_string(),
            from_stage: "Scan Cart".to_string(),
            remaining_stages: 5,
            timestamp: timestamp(),
        });
        sink.emit(failed(session_id));

        assert_eq!(
            sink.names(),
            vec![
                event_names::PIPELINE_STARTED,
                event_names::PIPELINE_STAGE_FAILED
            ]
        );
        assert!(sink.events().iter().all(|e| e.session_id() == session_id));

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_noop_sink_accepts_events() {
        NoopSink.emit(failed(Uuid::new_v4()));
    }
}
