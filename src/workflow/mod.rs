mod controller;
mod state;
#[cfg(test)]
mod tests;

pub use controller::WorkflowController;
pub use state::{FollowUp, PendingSubmission, SubmissionOutcome, WorkflowState};
