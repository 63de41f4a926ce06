//! Single-flight capture workflow.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{AttendanceRecordsQuery, RecognitionClient};
use crate::device::DeviceSession;

use super::state::{
    FailureCause, RecognitionOutcome, StatusEvent, WorkflowError, WorkflowStatus,
};

struct CycleState {
    status: WorkflowStatus,
    last_result: Option<RecognitionOutcome>,
}

/// Sequences one capture cycle: snapshot -> submit -> interpret -> status.
///
/// At most one cycle is in flight at a time; `begin()` is rejected whenever
/// the status is not `Idle`, so repeated or re-entrant triggers can never
/// produce a second submission. All collaborators are injected at
/// construction and the status field is the single source of truth for
/// transitions.
pub struct CaptureWorkflow<C, Q> {
    session: Mutex<DeviceSession>,
    recognizer: C,
    records: Q,
    state: Mutex<CycleState>,
    sink: Option<UnboundedSender<StatusEvent>>,
}

impl<C, Q> CaptureWorkflow<C, Q>
where
    C: RecognitionClient,
    Q: AttendanceRecordsQuery,
{
    /// Create an idle workflow around an (already configured) device session.
    pub fn new(session: DeviceSession, recognizer: C, records: Q) -> Self {
        Self {
            session: Mutex::new(session),
            recognizer,
            records,
            state: Mutex::new(CycleState {
                status: WorkflowStatus::Idle,
                last_result: None,
            }),
            sink: None,
        }
    }

    /// Attach a channel that receives status and result events.
    pub fn with_status_sink(mut self, sink: UnboundedSender<StatusEvent>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Current workflow status.
    pub fn status(&self) -> WorkflowStatus {
        self.cycle().status
    }

    /// Result of the last completed cycle, if any.
    pub fn last_result(&self) -> Option<RecognitionOutcome> {
        self.cycle().last_result.clone()
    }

    /// Whether the underlying device session holds a live feed.
    pub fn device_active(&self) -> bool {
        self.lock_session().is_active()
    }

    /// Release the underlying capture device.
    pub fn deactivate_device(&self) {
        self.lock_session().deactivate();
    }

    /// Run one capture-and-submit cycle.
    ///
    /// Rejected with [`WorkflowError::AlreadyInProgress`] (and no side
    /// effect) unless the workflow is `Idle`. A capture failure moves the
    /// cycle straight to `Failed` without contacting the recognition service.
    /// Otherwise exactly one submission is issued; its interpretation decides
    /// `Succeeded` or `Failed` and is returned as the cycle's outcome. After
    /// a successful match the recent attendance list is refreshed; a refresh
    /// failure is logged and does not change the status.
    pub async fn begin(&self) -> Result<RecognitionOutcome, WorkflowError> {
        {
            let mut cycle = self.cycle();
            if cycle.status != WorkflowStatus::Idle {
                return Err(WorkflowError::AlreadyInProgress);
            }
            cycle.status = WorkflowStatus::Capturing;
        }
        self.emit(StatusEvent::StatusChanged(WorkflowStatus::Capturing));

        let snapshot = match self.lock_session().capture_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("snapshot failed: {}", e);
                return Ok(self.finish(
                    WorkflowStatus::Failed,
                    RecognitionOutcome::Failed {
                        cause: FailureCause::Capture(e),
                    },
                ));
            }
        };

        self.cycle().status = WorkflowStatus::Submitting;
        self.emit(StatusEvent::StatusChanged(WorkflowStatus::Submitting));
        log::debug!(
            "submitting {} byte snapshot ({}x{})",
            snapshot.data.len(),
            snapshot.width,
            snapshot.height
        );

        let outcome = match self.recognizer.recognize(&snapshot).await {
            Ok(reply) if reply.success => match reply.student_name {
                Some(subject_name) => RecognitionOutcome::Identified {
                    subject_name,
                    confidence: reply.confidence.unwrap_or(0.0),
                    // Capture time is assigned client-side at interpretation
                    timestamp: Local::now(),
                },
                None => RecognitionOutcome::Rejected {
                    reason: "service reported success without a subject name".to_string(),
                },
            },
            Ok(reply) => RecognitionOutcome::Rejected {
                reason: reply
                    .message
                    .unwrap_or_else(|| "recognition failed".to_string()),
            },
            Err(e) => RecognitionOutcome::Failed {
                cause: FailureCause::Transport(e.to_string()),
            },
        };

        let status = if matches!(outcome, RecognitionOutcome::Identified { .. }) {
            WorkflowStatus::Succeeded
        } else {
            WorkflowStatus::Failed
        };
        let outcome = self.finish(status, outcome);

        if status == WorkflowStatus::Succeeded {
            match self.records.recent_records().await {
                Ok(records) => self.emit(StatusEvent::RecordsRefreshed(records)),
                Err(e) => log::warn!("failed to refresh attendance records: {}", e),
            }
        }

        Ok(outcome)
    }

    /// Acknowledge a finished cycle and return to `Idle`.
    ///
    /// Only valid from `Succeeded` or `Failed`; resetting a cycle that is
    /// still in flight is rejected with [`WorkflowError::CycleInFlight`].
    pub fn reset(&self) -> Result<(), WorkflowError> {
        let mut cycle = self.cycle();
        if !cycle.status.is_terminal() {
            return Err(WorkflowError::CycleInFlight);
        }
        cycle.status = WorkflowStatus::Idle;
        cycle.last_result = None;
        drop(cycle);
        self.emit(StatusEvent::StatusChanged(WorkflowStatus::Idle));
        Ok(())
    }

    fn finish(&self, status: WorkflowStatus, outcome: RecognitionOutcome) -> RecognitionOutcome {
        {
            let mut cycle = self.cycle();
            cycle.status = status;
            cycle.last_result = Some(outcome.clone());
        }
        self.emit(StatusEvent::StatusChanged(status));
        self.emit(StatusEvent::CycleFinished(outcome.clone()));
        outcome
    }

    fn emit(&self, event: StatusEvent) {
        if let Some(sink) = &self.sink {
            // A dropped receiver only means nobody is rendering status
            let _ = sink.send(event);
        }
    }

    fn cycle(&self) -> MutexGuard<'_, CycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_session(&self) -> MutexGuard<'_, DeviceSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
