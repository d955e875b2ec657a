use crate::validation::FieldId;
use thiserror::Error;

/// Fallback shown when a submission fails without a usable message
pub const SUBMISSION_FALLBACK_MESSAGE: &str = "Scan failed. Please try again.";

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl KioskError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn invalid_transition<S: Into<String>, A: Into<String>>(state: S, action: A) -> Self {
        Self::InvalidTransition {
            state: state.into(),
            action: action.into(),
        }
    }
}

/// Camera device and capture failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Device enumeration failed: {0}")]
    Enumeration(String),

    #[error("Frame acquisition returned no data")]
    CaptureEmpty,

    #[error("Camera is not ready")]
    NotReady,
}

/// Transport or backend failure while submitting a scan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Position request timed out")]
    Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Receiver lagged behind by {skipped} events")]
    Lagged { skipped: u64 },

    #[error("Event channel closed")]
    ChannelClosed,
}

/// One or more form fields failed their rules; entries are in schema order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<(FieldId, String)>,
}

impl ValidationFailure {
    /// First errored field in schema order
    pub fn first_field(&self) -> Option<FieldId> {
        self.errors.first().map(|(field, _)| *field)
    }

    pub fn message_for(&self, field: FieldId) -> Option<&str> {
        self.errors
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, message)| message.as_str())
    }
}

/// Human-readable rendering for errors that reach the kiosk screen
pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for CameraError {
    fn user_message(&self) -> String {
        match self {
            CameraError::NotReady => "Camera not ready. Please wait a moment.".to_string(),
            CameraError::CaptureEmpty => "Failed to capture image. Please try again.".to_string(),
            CameraError::PermissionDenied(_) | CameraError::DeviceUnavailable(_) => {
                "Unable to access camera. Please check permissions.".to_string()
            }
            CameraError::Enumeration(details) => format!("Camera list unavailable: {}", details),
        }
    }
}

impl UserMessage for SubmissionError {
    fn user_message(&self) -> String {
        match self {
            SubmissionError::Server(message) if !message.trim().is_empty() => message.clone(),
            _ => SUBMISSION_FALLBACK_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KioskError>;
