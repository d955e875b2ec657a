use crate::error::EventBusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Observable events emitted by the kiosk components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KioskEvent {
    /// Camera enumeration finished
    DevicesListed {
        count: usize,
        timestamp: DateTime<Utc>,
    },
    /// A camera device became the active one
    DeviceSelected {
        device_id: String,
        label: String,
        timestamp: DateTime<Utc>,
    },
    /// The media grant succeeded and frames can be captured
    CameraReady { timestamp: DateTime<Utc> },
    /// The media grant failed; the session stays unusable until reload
    CameraDenied {
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Countdown indicator value; emitted once per tick
    CountdownTick {
        remaining: u32,
        timestamp: DateTime<Utc>,
    },
    /// Visual acknowledgement pulse that accompanies a captured image
    CaptureFlash { timestamp: DateTime<Utc> },
    /// Transient notice for the visitor ("camera not ready", "capture failed")
    CaptureNotice {
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Workflow state machine moved between states
    StateChanged {
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },
    /// Geolocation result merged into the registration form
    LocationResolved {
        location: String,
        timestamp: DateTime<Utc>,
    },
    /// Kiosk shutdown requested
    ShutdownRequested {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl KioskEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            KioskEvent::DevicesListed { timestamp, .. } => *timestamp,
            KioskEvent::DeviceSelected { timestamp, .. } => *timestamp,
            KioskEvent::CameraReady { timestamp } => *timestamp,
            KioskEvent::CameraDenied { timestamp, .. } => *timestamp,
            KioskEvent::CountdownTick { timestamp, .. } => *timestamp,
            KioskEvent::CaptureFlash { timestamp } => *timestamp,
            KioskEvent::CaptureNotice { timestamp, .. } => *timestamp,
            KioskEvent::StateChanged { timestamp, .. } => *timestamp,
            KioskEvent::LocationResolved { timestamp, .. } => *timestamp,
            KioskEvent::ShutdownRequested { timestamp, .. } => *timestamp,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            KioskEvent::DevicesListed { count, .. } => format!("{} camera(s) available", count),
            KioskEvent::DeviceSelected { label, device_id, .. } => {
                format!("Camera selected: {} ({})", label, device_id)
            }
            KioskEvent::CameraReady { .. } => "Camera ready".to_string(),
            KioskEvent::CameraDenied { message, .. } => format!("Camera denied: {}", message),
            KioskEvent::CountdownTick { remaining, .. } => format!("Capturing in {}", remaining),
            KioskEvent::CaptureFlash { .. } => "Image captured".to_string(),
            KioskEvent::CaptureNotice { message, .. } => message.clone(),
            KioskEvent::StateChanged { from, to, .. } => format!("{} -> {}", from, to),
            KioskEvent::LocationResolved { location, .. } => format!("Location: {}", location),
            KioskEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            KioskEvent::DevicesListed { .. } => "devices_listed",
            KioskEvent::DeviceSelected { .. } => "device_selected",
            KioskEvent::CameraReady { .. } => "camera_ready",
            KioskEvent::CameraDenied { .. } => "camera_denied",
            KioskEvent::CountdownTick { .. } => "countdown_tick",
            KioskEvent::CaptureFlash { .. } => "capture_flash",
            KioskEvent::CaptureNotice { .. } => "capture_notice",
            KioskEvent::StateChanged { .. } => "state_changed",
            KioskEvent::LocationResolved { .. } => "location_resolved",
            KioskEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<KioskEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: KioskEvent) -> Result<usize, EventBusError> {
        match &event {
            KioskEvent::CameraDenied { message, .. } => {
                warn!("Camera access denied: {}", message);
            }
            KioskEvent::StateChanged { from, to, .. } => {
                info!("Workflow state {} -> {}", from, to);
            }
            KioskEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => debug!("Publishing event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

/// Accepts events whose [`KioskEvent::event_type`] is in the list
#[derive(Debug, Clone)]
pub struct EventFilter {
    types: Vec<&'static str>,
}

impl EventFilter {
    pub fn event_types(types: &[&'static str]) -> Self {
        Self {
            types: types.to_vec(),
        }
    }

    /// Check if an event passes this filter
    pub fn matches(&self, event: &KioskEvent) -> bool {
        self.types.contains(&event.event_type())
    }
}

/// Event receiver with filtering capabilities
pub struct EventReceiver {
    receiver: broadcast::Receiver<KioskEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(receiver: broadcast::Receiver<KioskEvent>, filter: EventFilter, name: &str) -> Self {
        Self {
            receiver,
            filter,
            name: name.to_string(),
        }
    }

    /// Receive the next event that passes the filter. A lagging receiver
    /// reports how many events it skipped and stays usable.
    pub async fn recv(&mut self) -> Result<KioskEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => {
                    debug!("Receiver '{}' received event: {}", self.name, event.description());
                    return Ok(event);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, skipped);
                    return Err(EventBusError::Lagged { skipped });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
