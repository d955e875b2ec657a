use crate::error::SubmissionError;
use crate::transport::{ScanReply, ScanRequest, ScanTransport};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

/// Check-in workflow states; exactly one is active at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Capturing,
    Submitting,
    AwaitingDetails,
    Success(String),
    Error(String),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Capturing => "capturing",
            WorkflowState::Submitting => "submitting",
            WorkflowState::AwaitingDetails => "awaiting_details",
            WorkflowState::Success(_) => "success",
            WorkflowState::Error(_) => "error",
        }
    }

    /// Message surfaced to the visitor, for terminal states
    pub fn message(&self) -> Option<&str> {
        match self {
            WorkflowState::Success(message) | WorkflowState::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{} ({})", self.name(), message),
            None => f.write_str(self.name()),
        }
    }
}

/// A scan the controller has committed to; its result must come back
/// through [`WorkflowController::on_submission_result`](super::WorkflowController::on_submission_result)
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub(super) ticket: Uuid,
    pub(super) request: ScanRequest,
}

impl PendingSubmission {
    pub fn ticket(&self) -> Uuid {
        self.ticket
    }

    pub fn request(&self) -> &ScanRequest {
        &self.request
    }

    /// Hand the request to the transport
    pub async fn send(self, transport: &dyn ScanTransport) -> SubmissionOutcome {
        let result = transport.submit_scan(self.request).await;
        SubmissionOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// Transport completion tagged with the ticket it answers
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub ticket: Uuid,
    pub result: Result<ScanReply, SubmissionError>,
}

/// Work the driver must schedule after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Resolve the visitor's location for the form session
    LocateVisitor { form_id: Uuid },
    /// Return to idle once the success message has been shown long enough
    ExpireSuccessAt(Instant),
}
