use super::device::{CameraDevice, CaptureConstraints, CapturedImage, MediaDevices, MediaStream};
use crate::config::CameraConfig;
use crate::error::{CameraError, UserMessage};
use crate::events::{EventBus, KioskEvent};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Camera readiness as seen by the kiosk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Ready,
    /// Terminal until the kiosk is restarted
    Denied,
}

/// Result of advancing a running countdown by one tick
#[derive(Debug)]
pub enum CountdownStep {
    /// No countdown is running
    Idle,
    /// Still counting; value to display
    Counting(u32),
    /// The countdown reached zero and an acquisition was attempted
    Fired(Result<CapturedImage, CameraError>),
}

/// Owns camera access: device list, active stream and still capture
pub struct CaptureSession {
    media: Arc<dyn MediaDevices>,
    config: CameraConfig,
    event_bus: Arc<EventBus>,
    devices: Vec<CameraDevice>,
    selected: Option<String>,
    stream: Option<Box<dyn MediaStream>>,
    readiness: Readiness,
    error: Option<String>,
    countdown: Option<u32>,
}

impl CaptureSession {
    pub fn new(media: Arc<dyn MediaDevices>, config: CameraConfig, event_bus: Arc<EventBus>) -> Self {
        Self {
            media,
            config,
            event_bus,
            devices: Vec::new(),
            selected: None,
            stream: None,
            readiness: Readiness::Uninitialized,
            error: None,
            countdown: None,
        }
    }

    /// Enumerate devices and request the media grant
    pub async fn start(&mut self) {
        self.list_devices().await;
        self.grant().await;
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn selected_device(&self) -> Option<&CameraDevice> {
        let selected = self.selected.as_deref()?;
        self.devices.iter().find(|device| device.id == selected)
    }

    /// User-facing message recorded by the last grant failure
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Countdown value currently displayed, if a timed capture is running
    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            device_id: self.selected.clone(),
            facing_mode: self.config.facing_mode.clone(),
            target_width: self.config.resolution.0,
            target_height: self.config.resolution.1,
        }
    }

    /// Refresh the device list.
    ///
    /// Enumeration failures are logged and leave the previous list in place.
    /// The first device is selected when nothing usable is selected yet.
    /// That fallback selection does not trigger another listing.
    pub async fn list_devices(&mut self) -> &[CameraDevice] {
        match self.media.enumerate_video_devices().await {
            Ok(devices) => {
                debug!("Enumerated {} video device(s)", devices.len());
                self.devices = devices;

                let _ = self
                    .event_bus
                    .publish(KioskEvent::DevicesListed {
                        count: self.devices.len(),
                        timestamp: Utc::now(),
                    })
                    .await;

                let selection_missing = match &self.selected {
                    Some(id) => !self.devices.iter().any(|device| &device.id == id),
                    None => true,
                };
                if selection_missing {
                    self.selected = None;
                    if let Some(first) = self.devices.first().cloned() {
                        self.activate(first).await;
                    }
                }
            }
            Err(e) => {
                warn!("Error enumerating camera devices: {}", e);
            }
        }

        &self.devices
    }

    /// Request a stream for the current constraints
    pub async fn grant(&mut self) {
        let constraints = self.constraints();
        self.stream = None;

        match self.media.open_stream(&constraints).await {
            Ok(stream) => self.on_granted(stream).await,
            Err(e) => self.on_denied(&e).await,
        }
    }

    pub async fn on_granted(&mut self, stream: Box<dyn MediaStream>) {
        info!("Camera stream granted ({:?})", self.selected);
        self.stream = Some(stream);
        self.readiness = Readiness::Ready;
        self.error = None;

        let _ = self
            .event_bus
            .publish(KioskEvent::CameraReady {
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn on_denied(&mut self, reason: &CameraError) {
        warn!("Camera grant failed: {}", reason);
        let message = reason.user_message();

        self.stream = None;
        self.readiness = Readiness::Denied;
        self.countdown = None;
        self.error = Some(message.clone());

        let _ = self
            .event_bus
            .publish(KioskEvent::CameraDenied {
                message,
                timestamp: Utc::now(),
            })
            .await;
    }

    /// Capture a still immediately
    pub async fn capture_now(&mut self) -> Result<CapturedImage, CameraError> {
        if !self.is_ready() {
            self.notice(&CameraError::NotReady).await;
            return Err(CameraError::NotReady);
        }

        self.acquire().await
    }

    /// Start a timed capture.
    ///
    /// Returns `false` without side effects when a countdown is already running.
    pub async fn capture_with_countdown(&mut self, seconds: u32) -> bool {
        if !self.is_ready() {
            self.notice(&CameraError::NotReady).await;
            return false;
        }

        if self.countdown.is_some() {
            debug!("Countdown already running, ignoring request");
            return false;
        }

        let seconds = seconds.max(1);
        self.countdown = Some(seconds);
        self.publish_tick(seconds).await;
        true
    }

    /// Advance a running countdown by one tick
    pub async fn tick(&mut self) -> CountdownStep {
        let remaining = match self.countdown {
            Some(remaining) => remaining,
            None => return CountdownStep::Idle,
        };

        if remaining > 1 {
            let next = remaining - 1;
            self.countdown = Some(next);
            self.publish_tick(next).await;
            return CountdownStep::Counting(next);
        }

        let outcome = if self.is_ready() {
            self.acquire().await
        } else {
            Err(CameraError::NotReady)
        };
        self.countdown = None;

        CountdownStep::Fired(outcome)
    }

    /// Select the next device in enumeration order, wrapping around
    pub async fn switch_device(&mut self) {
        if self.devices.len() <= 1 {
            debug!("Only {} camera(s) known, not switching", self.devices.len());
            return;
        }

        let current = self
            .selected
            .as_ref()
            .and_then(|id| self.devices.iter().position(|device| &device.id == id));
        let next = current.map_or(0, |index| (index + 1) % self.devices.len());
        let next_id = self.devices[next].id.clone();

        self.select_device(&next_id).await;
    }

    /// Make a device active and refresh the device list.
    ///
    /// Selecting the already active device does nothing, so re-selection
    /// never re-enumerates.
    pub async fn select_device(&mut self, device_id: &str) {
        if self.selected.as_deref() == Some(device_id) {
            return;
        }

        let Some(device) = self.devices.iter().find(|device| device.id == device_id).cloned()
        else {
            warn!("Ignoring selection of unknown camera {}", device_id);
            return;
        };

        self.activate(device).await;
        self.list_devices().await;
    }

    /// Release the stream; the session needs a new grant to capture again
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            info!("Camera stream released");
        }
        self.countdown = None;
        if self.readiness == Readiness::Ready {
            self.readiness = Readiness::Uninitialized;
        }
    }

    /// Record the selection, re-applying constraints to a live stream
    async fn activate(&mut self, device: CameraDevice) {
        info!("Selecting camera {} ({})", device.label, device.id);
        self.selected = Some(device.id.clone());

        let _ = self
            .event_bus
            .publish(KioskEvent::DeviceSelected {
                device_id: device.id,
                label: device.label,
                timestamp: Utc::now(),
            })
            .await;

        if self.is_ready() {
            self.grant().await;
        }
    }

    /// Drop a running countdown; only the workflow reset may do this
    pub(crate) fn clear_countdown(&mut self) {
        if self.countdown.take().is_some() {
            debug!("Countdown discarded by reset");
        }
    }

    async fn acquire(&mut self) -> Result<CapturedImage, CameraError> {
        let frame = match self.stream.as_mut() {
            Some(stream) => stream.capture_frame().await,
            None => None,
        };

        match frame {
            Some(bytes) if !bytes.is_empty() => {
                let image = CapturedImage::from_jpeg(&bytes);
                debug!("Captured still image ({} bytes)", bytes.len());

                let _ = self
                    .event_bus
                    .publish(KioskEvent::CaptureFlash {
                        timestamp: Utc::now(),
                    })
                    .await;

                Ok(image)
            }
            _ => {
                self.notice(&CameraError::CaptureEmpty).await;
                Err(CameraError::CaptureEmpty)
            }
        }
    }

    async fn notice(&self, error: &CameraError) {
        let message = error.user_message();
        debug!("Capture notice: {}", message);

        let _ = self
            .event_bus
            .publish(KioskEvent::CaptureNotice {
                message,
                timestamp: Utc::now(),
            })
            .await;
    }

    async fn publish_tick(&self, remaining: u32) {
        let _ = self
            .event_bus
            .publish(KioskEvent::CountdownTick {
                remaining,
                timestamp: Utc::now(),
            })
            .await;
    }
}
