//! Scan submission collaborator.
//!
//! The workflow hands a [`ScanRequest`] to a [`ScanTransport`] and interprets
//! the [`ScanReply`]. The HTTP implementation talks to the recognition
//! backend; the mock replays scripted replies.

mod http;
mod mock;

pub use http::HttpScanTransport;
pub use mock::MockScanTransport;

use crate::camera::CapturedImage;
use crate::error::SubmissionError;
use crate::validation::VisitorRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the backend wants the kiosk to do next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanAction {
    /// Visitor not recognised; registration details are required
    NeedDetails,
    /// Any terminal outcome ("entry", "exit", ...)
    Complete(String),
}

impl From<String> for ScanAction {
    fn from(action: String) -> Self {
        if action == "need_details" {
            ScanAction::NeedDetails
        } else {
            ScanAction::Complete(action)
        }
    }
}

impl From<ScanAction> for String {
    fn from(action: ScanAction) -> Self {
        match action {
            ScanAction::NeedDetails => "need_details".to_string(),
            ScanAction::Complete(action) => action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReply {
    pub action: ScanAction,
    #[serde(default)]
    pub message: String,
}

impl ScanReply {
    pub fn need_details(message: impl Into<String>) -> Self {
        Self {
            action: ScanAction::NeedDetails,
            message: message.into(),
        }
    }

    pub fn complete(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: ScanAction::Complete(action.into()),
            message: message.into(),
        }
    }
}

/// Image plus optional registration details
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub image: CapturedImage,
    pub visitor: Option<VisitorRecord>,
}

#[async_trait]
pub trait ScanTransport: Send + Sync {
    async fn submit_scan(&self, request: ScanRequest) -> Result<ScanReply, SubmissionError>;
}
