use crate::error::CameraError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// A video input reported by the host media subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Stream constraints derived from the active device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub device_id: Option<String>,
    pub facing_mode: String,
    pub target_width: u32,
    pub target_height: u32,
}

/// Encoded still image, carried as a base64 JPEG data URL
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapturedImage {
    data_url: String,
}

impl CapturedImage {
    /// Wrap raw JPEG bytes
    pub fn from_jpeg(bytes: &[u8]) -> Self {
        Self {
            data_url: format!("{}{}", JPEG_DATA_URL_PREFIX, STANDARD.encode(bytes)),
        }
    }

    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }

    /// Decode the payload back into JPEG bytes
    pub fn jpeg_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.data_url.strip_prefix(JPEG_DATA_URL_PREFIX)?;
        STANDARD.decode(encoded).ok()
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("encoded_len", &self.data_url.len())
            .finish()
    }
}

/// Host media subsystem: device enumeration and stream grants
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn enumerate_video_devices(&self) -> Result<Vec<CameraDevice>, CameraError>;

    /// Open a stream; fails with `PermissionDenied` or `DeviceUnavailable`
    async fn open_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// An open camera stream owned by the capture session
#[async_trait]
pub trait MediaStream: Send {
    /// Grab one encoded JPEG frame; `None` when no data was available
    async fn capture_frame(&mut self) -> Option<Vec<u8>>;
}
