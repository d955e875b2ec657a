use super::{ScanReply, ScanRequest, ScanTransport};
use crate::error::SubmissionError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct MockTransportState {
    replies: VecDeque<Result<ScanReply, SubmissionError>>,
    requests: Vec<ScanRequest>,
    delay: Option<Duration>,
}

/// Scripted transport that answers submissions from a reply queue.
///
/// With no scripted reply left it behaves like the real backend for a
/// first-time visitor: details are requested until they are attached.
#[derive(Clone, Default)]
pub struct MockScanTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockScanTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: Result<ScanReply, SubmissionError>) {
        self.state.lock().replies.push_back(reply);
    }

    /// Hold every reply back for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<ScanRequest> {
        self.state.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

#[async_trait]
impl ScanTransport for MockScanTransport {
    async fn submit_scan(&self, request: ScanRequest) -> Result<ScanReply, SubmissionError> {
        let (reply, delay) = {
            let mut state = self.state.lock();
            let has_details = request.visitor.is_some();
            state.requests.push(request);

            let reply = state.replies.pop_front().unwrap_or_else(|| {
                if has_details {
                    Ok(ScanReply::complete("entry", "Check-in successful"))
                } else {
                    Ok(ScanReply::need_details(
                        "New visitor detected. Please fill details.",
                    ))
                }
            });
            (reply, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        debug!("Mock transport reply: {:?}", reply);
        reply
    }
}
