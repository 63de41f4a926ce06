//! Attendance capture workflow module.
//!
//! A single-flight state machine over the device session and the recognition
//! client: request snapshot, submit, interpret the reply, surface status.

mod engine;
mod state;

pub use engine::CaptureWorkflow;
pub use state::{FailureCause, RecognitionOutcome, StatusEvent, WorkflowError, WorkflowStatus};
