pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod geolocation;
pub mod transport;
pub mod validation;
pub mod workflow;

pub use app::{ComponentState, KioskCommand, KioskOrchestrator, ShutdownReason};
pub use camera::{CameraDevice, CaptureSession, CapturedImage, MediaDevices, MockMediaDevices};
pub use config::KioskConfig;
pub use error::{KioskError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, KioskEvent};
pub use geolocation::{FixedGeolocation, Geolocation};
pub use transport::{HttpScanTransport, MockScanTransport, ScanTransport};
pub use validation::{FieldId, VisitorForm, VisitorRecord};
pub use workflow::{WorkflowController, WorkflowState};
