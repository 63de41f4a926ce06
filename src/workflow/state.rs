//! Capture workflow states, outcomes and events.

use std::fmt;

use chrono::{DateTime, Local};

use crate::api::AttendanceRecord;
use crate::device::CaptureError;

/// Where the capture workflow currently is in its cycle.
///
/// A cycle runs Idle -> Capturing -> Submitting -> Succeeded/Failed, and only
/// an explicit [`reset`](super::CaptureWorkflow::reset) brings a finished
/// cycle back to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Idle,
    Capturing,
    Submitting,
    Succeeded,
    Failed,
}

impl WorkflowStatus {
    /// Whether a cycle has finished and can be reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatus::Succeeded | WorkflowStatus::Failed)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Capturing => "capturing",
            WorkflowStatus::Submitting => "submitting",
            WorkflowStatus::Succeeded => "succeeded",
            WorkflowStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Why a cycle failed before or while reaching the recognition service.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureCause {
    /// The snapshot could not be produced; the service was never contacted.
    Capture(CaptureError),
    /// The submission could not reach the service or the service misbehaved.
    Transport(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Capture(e) => write!(f, "{}", e),
            FailureCause::Transport(msg) => {
                write!(f, "Could not reach the recognition service: {}", msg)
            }
        }
    }
}

/// Result of one completed capture cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    /// The service matched a subject.
    Identified {
        subject_name: String,
        /// Confidence on a 0-100 scale.
        confidence: f32,
        /// Assigned client-side when the response is interpreted.
        timestamp: DateTime<Local>,
    },
    /// The service answered but recognized nobody.
    Rejected { reason: String },
    /// The cycle failed before a well-formed answer arrived.
    Failed { cause: FailureCause },
}

impl fmt::Display for RecognitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionOutcome::Identified {
                subject_name,
                confidence,
                timestamp,
            } => write!(
                f,
                "Checked in: {} (confidence {:.0}%) at {}",
                subject_name,
                confidence,
                timestamp.format("%Y-%m-%d %H:%M:%S")
            ),
            RecognitionOutcome::Rejected { reason } => write!(f, "Not recognized: {}", reason),
            RecognitionOutcome::Failed { cause } => write!(f, "Check-in failed: {}", cause),
        }
    }
}

/// Events emitted to the status sink for a presentation layer to render.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    StatusChanged(WorkflowStatus),
    CycleFinished(RecognitionOutcome),
    RecordsRefreshed(Vec<AttendanceRecord>),
}

/// Rejected workflow transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("a capture cycle is already in progress")]
    AlreadyInProgress,

    #[error("cannot reset while a capture cycle is in flight")]
    CycleInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(WorkflowStatus::Idle.to_string(), "idle");
        assert_eq!(WorkflowStatus::Submitting.to_string(), "submitting");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(WorkflowStatus::Succeeded.is_terminal());
        assert!(WorkflowStatus::Failed.is_terminal());
        assert!(!WorkflowStatus::Idle.is_terminal());
        assert!(!WorkflowStatus::Capturing.is_terminal());
        assert!(!WorkflowStatus::Submitting.is_terminal());
    }

    #[test]
    fn test_outcome_display_identified() {
        let outcome = RecognitionOutcome::Identified {
            subject_name: "Alice".to_string(),
            confidence: 97.0,
            timestamp: Local::now(),
        };
        let msg = outcome.to_string();
        assert!(msg.contains("Alice"));
        assert!(msg.contains("97%"));
    }

    #[test]
    fn test_outcome_display_distinguishes_rejection_from_transport() {
        let rejected = RecognitionOutcome::Rejected {
            reason: "no match".to_string(),
        }
        .to_string();
        let failed = RecognitionOutcome::Failed {
            cause: FailureCause::Transport("connection refused".to_string()),
        }
        .to_string();
        assert!(rejected.contains("Not recognized"));
        assert!(failed.contains("recognition service"));
        assert_ne!(rejected, failed);
    }

    #[test]
    fn test_outcome_display_capture_cause() {
        let outcome = RecognitionOutcome::Failed {
            cause: FailureCause::Capture(CaptureError::DeviceNotActive),
        };
        assert!(outcome.to_string().contains("not active"));
    }

    #[test]
    fn test_workflow_error_display() {
        assert_eq!(
            WorkflowError::AlreadyInProgress.to_string(),
            "a capture cycle is already in progress"
        );
        assert_eq!(
            WorkflowError::CycleInFlight.to_string(),
            "cannot reset while a capture cycle is in flight"
        );
    }
}
