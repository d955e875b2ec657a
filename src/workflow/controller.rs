use super::state::{FollowUp, PendingSubmission, SubmissionOutcome, WorkflowState};
use crate::camera::{CaptureSession, CapturedImage, CountdownStep};
use crate::config::KioskConfig;
use crate::error::{KioskError, Result, UserMessage};
use crate::events::{EventBus, KioskEvent};
use crate::transport::{ScanAction, ScanRequest, ScanTransport};
use crate::validation::{FieldId, VisitorForm};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Owns the check-in state machine.
///
/// Every method takes `&mut self`, so transitions never interleave. Slow
/// work (transport calls, geolocation, timers) happens outside and comes
/// back as discrete events.
pub struct WorkflowController {
    session: CaptureSession,
    event_bus: Arc<EventBus>,
    countdown_seconds: u32,
    success_window: Duration,
    state: WorkflowState,
    retained_image: Option<CapturedImage>,
    form: Option<VisitorForm>,
    form_id: Option<Uuid>,
    in_flight: Option<Uuid>,
    success_deadline: Option<Instant>,
}

impl WorkflowController {
    pub fn new(session: CaptureSession, config: &KioskConfig, event_bus: Arc<EventBus>) -> Self {
        Self {
            session,
            event_bus,
            countdown_seconds: config.camera.countdown_seconds,
            success_window: config.workflow.success_window(),
            state: WorkflowState::Idle,
            retained_image: None,
            form: None,
            form_id: None,
            in_flight: None,
            success_deadline: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Registration form, present while details are being collected
    pub fn form(&self) -> Option<&VisitorForm> {
        self.form.as_ref()
    }

    pub fn retained_image(&self) -> Option<&CapturedImage> {
        self.retained_image.as_ref()
    }

    pub fn success_deadline(&self) -> Option<Instant> {
        self.success_deadline
    }

    pub fn is_counting_down(&self) -> bool {
        self.state == WorkflowState::Capturing && self.session.countdown().is_some()
    }

    /// Bring the camera up
    pub async fn start_camera(&mut self) {
        self.session.start().await;
    }

    pub async fn switch_device(&mut self) {
        self.session.switch_device().await;

        // A failed regrant drops any countdown in progress
        if self.state == WorkflowState::Capturing && self.session.countdown().is_none() {
            self.transition(WorkflowState::Idle).await;
        }
    }

    /// Capture immediately and, on success, start the first submission
    pub async fn capture_now(&mut self) -> Option<PendingSubmission> {
        if self.state != WorkflowState::Idle {
            debug!("Ignoring capture request while {}", self.state.name());
            return None;
        }

        if !self.session.is_ready() {
            // Surfaces the "not ready" notice without touching workflow state
            let _ = self.session.capture_now().await;
            return None;
        }

        self.transition(WorkflowState::Capturing).await;

        match self.session.capture_now().await {
            Ok(image) => Some(self.begin_scan(image).await),
            Err(e) => {
                debug!("Capture produced no image: {}", e);
                self.transition(WorkflowState::Idle).await;
                None
            }
        }
    }

    /// Start a timed capture; returns whether a countdown was started
    pub async fn capture_with_countdown(&mut self) -> bool {
        if self.state != WorkflowState::Idle {
            debug!("Ignoring timed capture request while {}", self.state.name());
            return false;
        }

        if !self.session.capture_with_countdown(self.countdown_seconds).await {
            return false;
        }

        self.transition(WorkflowState::Capturing).await;
        true
    }

    /// Advance the countdown by one tick
    pub async fn tick(&mut self) -> Option<PendingSubmission> {
        if self.state != WorkflowState::Capturing {
            return None;
        }

        match self.session.tick().await {
            CountdownStep::Counting(_) => None,
            CountdownStep::Idle => {
                self.transition(WorkflowState::Idle).await;
                None
            }
            CountdownStep::Fired(Ok(image)) => Some(self.begin_scan(image).await),
            CountdownStep::Fired(Err(e)) => {
                debug!("Timed capture produced no image: {}", e);
                self.transition(WorkflowState::Idle).await;
                None
            }
        }
    }

    /// Interpret a transport completion.
    ///
    /// Results for anything but the current in-flight submission are dropped.
    pub async fn on_submission_result(&mut self, outcome: SubmissionOutcome) -> Option<FollowUp> {
        if self.state != WorkflowState::Submitting || self.in_flight != Some(outcome.ticket) {
            warn!(
                "Dropping stale submission result {} (state: {})",
                outcome.ticket,
                self.state.name()
            );
            return None;
        }
        self.in_flight = None;

        match outcome.result {
            Ok(reply) => match reply.action {
                ScanAction::NeedDetails => {
                    info!("Backend needs visitor details: {}", reply.message);
                    let follow_up = match self.form.as_mut() {
                        Some(form) => {
                            form.reopen();
                            None
                        }
                        None => {
                            let form_id = Uuid::new_v4();
                            self.form = Some(VisitorForm::new());
                            self.form_id = Some(form_id);
                            Some(FollowUp::LocateVisitor { form_id })
                        }
                    };
                    self.transition(WorkflowState::AwaitingDetails).await;
                    follow_up
                }
                ScanAction::Complete(action) => {
                    info!("Scan completed with action '{}'", action);
                    self.discard_partial_state();
                    let deadline = Instant::now() + self.success_window;
                    self.success_deadline = Some(deadline);
                    self.transition(WorkflowState::Success(reply.message)).await;
                    Some(FollowUp::ExpireSuccessAt(deadline))
                }
            },
            Err(e) => {
                error!("Scan submission failed: {}", e);
                self.discard_partial_state();
                self.transition(WorkflowState::Error(e.user_message())).await;
                None
            }
        }
    }

    /// Submit a pending request and feed the reply back in one step
    pub async fn run_submission(
        &mut self,
        pending: PendingSubmission,
        transport: &dyn ScanTransport,
    ) -> Option<FollowUp> {
        let outcome = pending.send(transport).await;
        self.on_submission_result(outcome).await
    }

    pub fn change_field(&mut self, field: FieldId, value: impl Into<String>) {
        match self.form.as_mut() {
            Some(form) => form.change(field, value),
            None => debug!("No form open, ignoring change to {}", field),
        }
    }

    pub fn blur_field(&mut self, field: FieldId) {
        match self.form.as_mut() {
            Some(form) => form.blur(field),
            None => debug!("No form open, ignoring blur of {}", field),
        }
    }

    /// Merge a resolved location into the form it was requested for
    pub async fn on_location(&mut self, form_id: Uuid, location: String) {
        if self.form_id != Some(form_id) {
            debug!("Dropping location for closed form {}", form_id);
            return;
        }

        if let Some(form) = self.form.as_mut() {
            form.set_location(location.clone());
            let _ = self
                .event_bus
                .publish(KioskEvent::LocationResolved {
                    location,
                    timestamp: Utc::now(),
                })
                .await;
        }
    }

    /// Validate the form and resubmit it with the retained image
    pub async fn submit_details(&mut self) -> Result<PendingSubmission> {
        if self.state != WorkflowState::AwaitingDetails {
            return Err(KioskError::invalid_transition(
                self.state.name(),
                "submit details",
            ));
        }

        let image = self
            .retained_image
            .clone()
            .ok_or_else(|| KioskError::system("No retained image for detail submission"))?;
        let form = self
            .form
            .as_mut()
            .ok_or_else(|| KioskError::system("No registration form open"))?;

        let record = form.submit()?;

        let ticket = Uuid::new_v4();
        self.in_flight = Some(ticket);
        self.transition(WorkflowState::Submitting).await;

        Ok(PendingSubmission {
            ticket,
            request: ScanRequest {
                image,
                visitor: Some(record),
            },
        })
    }

    /// Abandon the registration form
    pub async fn cancel_details(&mut self) -> bool {
        if self.state != WorkflowState::AwaitingDetails {
            debug!("Nothing to cancel while {}", self.state.name());
            return false;
        }

        self.discard_partial_state();
        self.transition(WorkflowState::Idle).await;
        true
    }

    /// "Scan another": leave the success screen early
    pub async fn scan_another(&mut self) -> bool {
        if !matches!(self.state, WorkflowState::Success(_)) {
            return false;
        }

        self.success_deadline = None;
        self.transition(WorkflowState::Idle).await;
        true
    }

    /// "Try again": the only way out of the error screen
    pub async fn try_again(&mut self) -> bool {
        if !matches!(self.state, WorkflowState::Error(_)) {
            return false;
        }

        self.discard_partial_state();
        self.transition(WorkflowState::Idle).await;
        true
    }

    /// Clear the success screen once its window has passed
    pub async fn expire_success(&mut self, now: Instant) -> bool {
        let expired = matches!(self.state, WorkflowState::Success(_))
            && self.success_deadline.is_some_and(|deadline| now >= deadline);

        if expired {
            self.success_deadline = None;
            self.transition(WorkflowState::Idle).await;
        }
        expired
    }

    /// Unconditional return to a pristine idle state.
    ///
    /// Any in-flight submission is orphaned and its result will be dropped.
    pub async fn reset(&mut self) {
        info!("Resetting workflow from {}", self.state.name());
        self.discard_partial_state();
        self.in_flight = None;
        self.success_deadline = None;
        self.session.clear_countdown();

        if self.state != WorkflowState::Idle {
            self.transition(WorkflowState::Idle).await;
        }
    }

    /// Release the camera stream; `start_camera` brings it back
    pub fn stop_camera(&mut self) {
        self.session.stop();
    }

    async fn begin_scan(&mut self, image: CapturedImage) -> PendingSubmission {
        let ticket = Uuid::new_v4();
        self.retained_image = Some(image.clone());
        self.in_flight = Some(ticket);
        self.transition(WorkflowState::Submitting).await;

        PendingSubmission {
            ticket,
            request: ScanRequest {
                image,
                visitor: None,
            },
        }
    }

    fn discard_partial_state(&mut self) {
        self.retained_image = None;
        self.form = None;
        self.form_id = None;
    }

    async fn transition(&mut self, next: WorkflowState) {
        let previous = std::mem::replace(&mut self.state, next);
        debug!("Workflow transition {} -> {}", previous, self.state);

        let _ = self
            .event_bus
            .publish(KioskEvent::StateChanged {
                from: previous.name().to_string(),
                to: self.state.name().to_string(),
                timestamp: Utc::now(),
            })
            .await;
    }
}
