use super::types::{KioskCommand, ShutdownReason};
use super::KioskOrchestrator;
use crate::error::{KioskError, Result};
use crate::events::KioskEvent;
use crate::geolocation::resolve_location;
use crate::validation::SCHEMA;
use crate::workflow::{FollowUp, PendingSubmission, WorkflowState};
use chrono::Utc;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

impl KioskOrchestrator {
    /// Run the main application loop with signal handling
    pub async fn run(&mut self) -> Result<i32> {
        info!("Visitor kiosk is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| KioskError::system("Shutdown sender already taken"))?;
        let mut shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| KioskError::system("Shutdown receiver already taken"))?;
        let mut commands = self
            .command_receiver
            .take()
            .ok_or_else(|| KioskError::system("Command receiver already taken"))?;
        let mut submissions = self
            .submission_receiver
            .take()
            .ok_or_else(|| KioskError::system("Submission receiver already taken"))?;
        let mut locations = self
            .location_receiver
            .take()
            .ok_or_else(|| KioskError::system("Location receiver already taken"))?;

        self.setup_signal_handlers(shutdown_sender).await;

        let cancellation_token = self.cancellation_token.clone();
        let mut last_state = None;

        let shutdown_reason = loop {
            self.render_if_changed(&mut last_state);

            let next_tick = self.next_tick;
            let success_deadline = self.success_deadline;

            tokio::select! {
                reason = &mut shutdown_receiver => {
                    break reason.unwrap_or_else(|_| {
                        ShutdownReason::Error("Shutdown channel closed unexpectedly".to_string())
                    });
                }
                _ = cancellation_token.cancelled() => {
                    break ShutdownReason::UserRequest;
                }
                Some(command) = commands.recv() => {
                    if let Some(reason) = self.handle_command(command).await {
                        break reason;
                    }
                }
                Some(outcome) = submissions.recv() => {
                    let follow_up = self.controller.on_submission_result(outcome).await;
                    self.handle_follow_up(follow_up);
                }
                Some((form_id, location)) = locations.recv() => {
                    self.controller.on_location(form_id, location).await;
                }
                _ = sleep_until(next_tick.unwrap_or_else(Instant::now)), if next_tick.is_some() => {
                    self.handle_tick().await;
                }
                _ = sleep_until(success_deadline.unwrap_or_else(Instant::now)), if success_deadline.is_some() => {
                    self.success_deadline = None;
                    self.controller.expire_success(Instant::now()).await;
                }
            }
        };

        info!("Shutdown initiated: {}", shutdown_reason);
        let _ = self
            .event_bus
            .publish(KioskEvent::ShutdownRequested {
                reason: shutdown_reason.to_string(),
                timestamp: Utc::now(),
            })
            .await;

        let exit_code = self.shutdown().await?;

        info!("Visitor kiosk shutdown complete");
        Ok(exit_code)
    }

    /// Apply one visitor or operator command; returns a reason when the
    /// command ends the session
    pub(super) async fn handle_command(&mut self, command: KioskCommand) -> Option<ShutdownReason> {
        debug!("Handling command {:?}", command);

        match command {
            KioskCommand::Capture => {
                if let Some(pending) = self.controller.capture_now().await {
                    self.spawn_submission(pending);
                }
            }
            KioskCommand::TimedCapture => {
                if self.controller.capture_with_countdown().await {
                    self.next_tick = Some(Instant::now() + self.config.camera.tick_interval());
                }
            }
            KioskCommand::SwitchCamera => {
                self.controller.switch_device().await;
                if !self.controller.is_counting_down() {
                    self.next_tick = None;
                }
            }
            KioskCommand::SetField(field, value) => self.controller.change_field(field, value),
            KioskCommand::BlurField(field) => {
                self.controller.blur_field(field);
                if let Some(error) = self.controller.form().and_then(|f| f.visible_error(field)) {
                    println!("! {}", error);
                }
            }
            KioskCommand::SubmitDetails => match self.controller.submit_details().await {
                Ok(pending) => self.spawn_submission(pending),
                Err(KioskError::Validation(failure)) => {
                    debug!("Details rejected: {}", failure);
                    for (field, message) in &failure.errors {
                        println!("! {}: {}", field, message);
                    }
                }
                Err(e) => warn!("Cannot submit details: {}", e),
            },
            KioskCommand::CancelDetails => {
                self.controller.cancel_details().await;
            }
            KioskCommand::Again => {
                if self.controller.scan_another().await {
                    self.success_deadline = None;
                } else if !self.controller.try_again().await {
                    debug!("Nothing to dismiss while {}", self.controller.state().name());
                }
            }
            KioskCommand::Reset => {
                self.controller.reset().await;
                self.next_tick = None;
                self.success_deadline = None;
            }
            KioskCommand::Status => self.print_status(),
            KioskCommand::Quit => return Some(ShutdownReason::UserRequest),
        }

        None
    }

    async fn handle_tick(&mut self) {
        if let Some(pending) = self.controller.tick().await {
            self.spawn_submission(pending);
        }

        self.next_tick = match self.next_tick {
            Some(previous) if self.controller.is_counting_down() => {
                Some(previous + self.config.camera.tick_interval())
            }
            _ => None,
        };
    }

    pub(super) fn handle_follow_up(&mut self, follow_up: Option<FollowUp>) {
        match follow_up {
            Some(FollowUp::LocateVisitor { form_id }) => {
                let provider = self.geolocation.clone();
                let timeout = self.config.geolocation.timeout();
                let sender = self.location_sender.clone();

                tokio::spawn(async move {
                    let location = resolve_location(provider, timeout).await;
                    if sender.send((form_id, location)).await.is_err() {
                        debug!("Runtime stopped before location was delivered");
                    }
                });
            }
            Some(FollowUp::ExpireSuccessAt(deadline)) => {
                self.success_deadline = Some(deadline);
            }
            None => {}
        }
    }

    /// Run the transport call off the loop; the outcome comes back tagged
    /// with its ticket
    fn spawn_submission(&self, pending: PendingSubmission) {
        let transport = Arc::clone(&self.transport);
        let sender = self.submission_sender.clone();
        info!("Submitting scan {}", pending.ticket());

        tokio::spawn(async move {
            let outcome = pending.send(transport.as_ref()).await;
            if sender.send(outcome).await.is_err() {
                debug!("Runtime stopped before submission result was delivered");
            }
        });
    }

    fn render_if_changed(&self, last_state: &mut Option<WorkflowState>) {
        let state = self.controller.state();
        if last_state.as_ref() == Some(state) {
            return;
        }

        match state {
            WorkflowState::Idle => println!("Ready. Type 'capture' or 'timed' to scan."),
            WorkflowState::Capturing => println!("Hold still..."),
            WorkflowState::Submitting => println!("Processing..."),
            WorkflowState::AwaitingDetails => {
                println!("New visitor. Please fill in your details, then 'submit':");
                for spec in SCHEMA.iter() {
                    let marker = if spec.rule.required { "*" } else { " " };
                    println!(
                        "  {}{:<16} {}",
                        marker,
                        spec.id.as_str(),
                        spec.rule.label
                    );
                }
            }
            WorkflowState::Success(message) => println!("OK: {}", message),
            WorkflowState::Error(message) => println!("Error: {} (type 'again')", message),
        }

        *last_state = Some(state.clone());
    }

    fn print_status(&self) {
        let session = self.controller.session();
        println!("State: {}", self.controller.state());
        println!("Camera: {:?}", session.readiness());
        if let Some(device) = session.selected_device() {
            println!("Device: {} ({})", device.label, device.id);
        }
        if let Some(message) = session.error_message() {
            println!("Camera error: {}", message);
        }

        if let Some(form) = self.controller.form() {
            for spec in SCHEMA.iter() {
                let value = form.record().value(spec.id);
                match form.visible_error(spec.id) {
                    Some(error) => println!("  {:<16} {:?}  ! {}", spec.id.as_str(), value, error),
                    None => println!("  {:<16} {:?}", spec.id.as_str(), value),
                }
            }
            println!("  {:<16} {:?}", "location", form.location());
        }
    }

    /// Set up signal handlers for graceful shutdown
    async fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::spawn(async move {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                                let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                            }
                        }
                    });
                }
                Err(e) => error!("Failed to register SIGTERM handler: {}", e),
            }
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
