use super::{ComponentState, KioskOrchestrator};
use crate::camera::Readiness;
use crate::error::{EventBusError, Result};
use crate::events::{EventFilter, EventReceiver, KioskEvent};
use tracing::{debug, error, info, warn};

impl KioskOrchestrator {
    /// Register components before they are started
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing kiosk components");

        let mut states = self.component_states.lock().await;
        states.insert("camera".to_string(), ComponentState::Stopped);
        states.insert("display".to_string(), ComponentState::Stopped);

        if self.console_enabled {
            states.insert("console".to_string(), ComponentState::Stopped);
        }

        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start the camera, the screen renderer and the console
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting visitor kiosk");

        // Subscribe before the camera comes up so its events are rendered
        self.set_component_state("display", ComponentState::Starting)
            .await;
        self.spawn_display();
        self.set_component_state("display", ComponentState::Running)
            .await;

        self.set_component_state("camera", ComponentState::Starting)
            .await;
        self.controller.start_camera().await;

        match self.controller.session().readiness() {
            Readiness::Ready => {
                self.set_component_state("camera", ComponentState::Running)
                    .await;
                info!("Camera session started successfully");
            }
            readiness => {
                // The kiosk keeps running; capture requests surface a notice
                self.set_component_state("camera", ComponentState::Failed)
                    .await;
                warn!("Camera session not ready after start: {:?}", readiness);
            }
        }

        if self.console_enabled {
            if let Some(console) = &self.console {
                self.set_component_state("console", ComponentState::Starting)
                    .await;

                console.start().await.map_err(|e| {
                    error!("Failed to start console input: {}", e);
                    e
                })?;

                self.set_component_state("console", ComponentState::Running)
                    .await;
            }
        }

        info!("Visitor kiosk started");
        Ok(())
    }

    /// Render visitor-facing events on stdout
    fn spawn_display(&self) {
        let mut receiver = EventReceiver::new(
            self.event_bus.subscribe(),
            EventFilter::event_types(&DISPLAY_EVENTS),
            "display",
        );
        let cancellation_token = self.cancellation_token.clone();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancellation_token.cancelled() => break,
                    event = receiver.recv() => event,
                };

                match event {
                    Ok(event) => render_event(&event),
                    Err(EventBusError::ChannelClosed) => break,
                    // Skipped events are already logged by the receiver
                    Err(_) => {}
                }
            }

            debug!("Display task exited");
        });
    }
}

const DISPLAY_EVENTS: [&str; 7] = [
    "countdown_tick",
    "capture_flash",
    "capture_notice",
    "camera_denied",
    "camera_ready",
    "device_selected",
    "location_resolved",
];

fn render_event(event: &KioskEvent) {
    match event {
        KioskEvent::CountdownTick { remaining, .. } => println!("  {} ...", remaining),
        KioskEvent::CaptureFlash { .. } => println!("  * flash *"),
        KioskEvent::CaptureNotice { message, .. } => println!("! {}", message),
        KioskEvent::CameraDenied { message, .. } => println!("! {}", message),
        KioskEvent::CameraReady { .. } => println!("Camera ready"),
        KioskEvent::DeviceSelected { label, .. } => println!("Using camera: {}", label),
        KioskEvent::LocationResolved { location, .. } => println!("Location: {}", location),
        other => debug!("Display ignoring {}", other.event_type()),
    }
}
