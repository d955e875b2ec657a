mod device;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod gst_backend;
mod mock;
mod session;

pub use device::{CameraDevice, CaptureConstraints, CapturedImage, MediaDevices, MediaStream};
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use gst_backend::GstMediaDevices;
pub use mock::{MockMediaDevices, MOCK_JPEG};
pub use session::{CaptureSession, CountdownStep, Readiness};
