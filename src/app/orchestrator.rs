use super::console::ConsoleInputHandler;
use super::types::{ComponentState, KioskCommand, ShutdownReason};
use crate::camera::{CaptureSession, MediaDevices};
use crate::config::KioskConfig;
use crate::events::EventBus;
use crate::geolocation::Geolocation;
use crate::transport::ScanTransport;
use crate::workflow::{SubmissionOutcome, WorkflowController};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 32;

/// Main application coordinator; owns the workflow controller and feeds it
/// commands, timer ticks, and collaborator completions one at a time
pub struct KioskOrchestrator {
    pub(super) config: KioskConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) controller: WorkflowController,
    pub(super) transport: Arc<dyn ScanTransport>,
    pub(super) geolocation: Option<Arc<dyn Geolocation>>,

    pub(super) console: Option<ConsoleInputHandler>,
    pub(super) console_enabled: bool,

    // Discrete event channels into the runtime loop
    pub(super) command_sender: mpsc::Sender<KioskCommand>,
    pub(super) command_receiver: Option<mpsc::Receiver<KioskCommand>>,
    pub(super) submission_sender: mpsc::Sender<SubmissionOutcome>,
    pub(super) submission_receiver: Option<mpsc::Receiver<SubmissionOutcome>>,
    pub(super) location_sender: mpsc::Sender<(Uuid, String)>,
    pub(super) location_receiver: Option<mpsc::Receiver<(Uuid, String)>>,

    // Timers
    pub(super) next_tick: Option<Instant>,
    pub(super) success_deadline: Option<Instant>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl KioskOrchestrator {
    /// Create a new orchestrator over the given collaborators
    pub fn new(
        config: KioskConfig,
        media: Arc<dyn MediaDevices>,
        transport: Arc<dyn ScanTransport>,
        geolocation: Option<Arc<dyn Geolocation>>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let session = CaptureSession::new(media, config.camera.clone(), Arc::clone(&event_bus));
        let controller = WorkflowController::new(session, &config, Arc::clone(&event_bus));

        let (command_sender, command_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (submission_sender, submission_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (location_sender, location_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let console = Some(ConsoleInputHandler::new(command_sender.clone()));

        Self {
            config,
            event_bus,
            controller,
            transport,
            geolocation,
            console,
            console_enabled: false, // Enable via set_console_enabled()
            command_sender,
            command_receiver: Some(command_receiver),
            submission_sender,
            submission_receiver: Some(submission_receiver),
            location_sender,
            location_receiver: Some(location_receiver),
            next_tick: None,
            success_deadline: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Enable or disable the stdin console
    pub fn set_console_enabled(&mut self, enabled: bool) {
        self.console_enabled = enabled;
    }

    /// Sender for injecting commands into the runtime loop
    pub fn command_sender(&self) -> mpsc::Sender<KioskCommand> {
        self.command_sender.clone()
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn controller(&self) -> &WorkflowController {
        &self.controller
    }

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    /// Token that stops the runtime loop when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}
